use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::Post;

/// Read cache for fetched posts, keyed per user. Entries are written by the
/// read path on a miss and removed only by explicit invalidation after a
/// successful write to the remote API. Nothing else mutates an entry.
#[derive(Debug, Default)]
pub struct PostsCache {
    entries: RwLock<HashMap<String, Arc<Vec<Post>>>>,
}

/// Stable cache key for a user's posts.
pub fn posts_key(user_id: &str) -> String {
    format!("user_posts:{user_id}")
}

impl PostsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Vec<Post>>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, posts: Vec<Post>) -> Arc<Vec<Post>> {
        let posts = Arc::new(posts);
        self.entries.write().await.insert(key, posts.clone());
        posts
    }

    /// Drop a cached entry so the next read goes to the network.
    pub async fn invalidate(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            tracing::debug!(key, "posts cache invalidated");
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Author;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            body: Some("hi".to_string()),
            image: None,
            user: Author {
                id: "u1".to_string(),
                name: "Alice".to_string(),
                photo: "a.jpg".to_string(),
            },
            created_at: None,
        }
    }

    #[tokio::test]
    async fn miss_then_insert_then_hit() {
        let cache = PostsCache::new();
        let key = posts_key("u1");
        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), vec![post("p1")]).await;
        let hit = cache.get(&key).await.unwrap();
        assert_eq!(hit[0].id, "p1");
    }

    #[tokio::test]
    async fn invalidate_removes_only_the_given_key() {
        let cache = PostsCache::new();
        cache.insert(posts_key("u1"), vec![post("p1")]).await;
        cache.insert(posts_key("u2"), vec![post("p2")]).await;

        cache.invalidate(&posts_key("u1")).await;

        assert!(cache.get(&posts_key("u1")).await.is_none());
        assert!(cache.get(&posts_key("u2")).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidate_on_missing_key_is_a_no_op() {
        let cache = PostsCache::new();
        cache.invalidate(&posts_key("ghost")).await;
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn keys_are_stable_and_per_user() {
        assert_eq!(posts_key("u1"), posts_key("u1"));
        assert_ne!(posts_key("u1"), posts_key("u2"));
    }
}
