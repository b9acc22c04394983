use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::error;

use crate::config::SiteConfig;
use crate::i18n::Messages;
use crate::models::BlogPost;
use crate::posts::{HostedStore, PostCatalog};

pub type RefreshBroadcaster = broadcast::Sender<()>;

/// Page templates read from the content directory.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    pub layout_html: String,
    pub banner_html: String,
    pub not_found_html: String, // supports {{ path }} placeholder
}

pub struct AppState {
    pub config: SiteConfig,
    pub templates: RwLock<Templates>,
    pub messages: RwLock<Messages>,
    pub posts: RwLock<Vec<BlogPost>>,
    pub hosted: Option<HostedStore>,
}

impl AppState {
    /// Posts for one render: fetched from the hosted store when configured,
    /// otherwise a copy of the static list. A failed fetch is an empty list.
    pub async fn post_snapshot(&self) -> PostCatalog {
        match &self.hosted {
            Some(store) => match store.fetch_published().await {
                Ok(posts) => PostCatalog::new(posts),
                Err(e) => {
                    error!("Failed to fetch posts from hosted store: {}", e);
                    PostCatalog::default()
                }
            },
            None => PostCatalog::new(self.posts.read().await.clone()),
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
