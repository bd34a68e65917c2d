use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::PostsCache;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub cache: Arc<PostsCache>,
}

impl AppState {
    pub fn new(config: Config, api: ApiClient) -> Self {
        Self {
            config,
            api,
            cache: Arc::new(PostsCache::new()),
        }
    }
}
