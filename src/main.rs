mod config;
mod content_loader;
mod doc_render;
mod docs;
mod error;
mod hot_reload;
mod i18n;
mod icons;
mod markdown;
mod models;
mod pages;
mod posts;
mod routes;
mod seo;
mod sidebar;
mod state;
mod text;

use std::{net::SocketAddr, sync::Arc};

use tokio::{
    net::TcpListener,
    sync::{broadcast, RwLock},
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SiteConfig;
use crate::content_loader::load_content;
use crate::hot_reload::start_content_watcher;
use crate::posts::HostedStore;
use crate::state::{AppState, RouterState};

#[tokio::main]
async fn main() {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match SiteConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        zone = ?config.zone,
        development = config.is_development,
        content_dir = %config.content_dir.display(),
        "configuration loaded"
    );

    let content = match load_content(&config.content_dir).await {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to load initial content: {}", e);
            std::process::exit(1);
        }
    };

    let hosted = match &config.supabase {
        Some(supabase) => match HostedStore::new(supabase) {
            Ok(store) => {
                info!("Serving posts from the hosted store");
                Some(store)
            }
            Err(e) => {
                warn!("Hosted store unavailable, using static posts: {}", e);
                None
            }
        },
        None => None,
    };

    let port = config.port;
    let is_development = config.is_development;
    let state = Arc::new(AppState {
        config,
        templates: RwLock::new(content.templates),
        messages: RwLock::new(content.messages),
        posts: RwLock::new(content.posts),
        hosted,
    });

    // Hot-reload setup
    let (tx, _rx) = broadcast::channel(1);
    if is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        start_content_watcher(tx.clone(), state.clone());
    }

    let app = routes::build_router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!(%addr, "listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
