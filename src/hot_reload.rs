use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer, DebouncedEvent,
    notify::{RecursiveMode, Watcher, Error as NotifyError},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

use crate::content_loader::reload_content;
use crate::state::{AppState, RefreshBroadcaster};

pub const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    (() => {
        const scheme = window.location.protocol === "https:" ? "wss://" : "ws://";
        const socket = new WebSocket(scheme + window.location.host + "/ws");
        socket.addEventListener("message", (event) => {
            if (event.data === "reload") window.location.reload();
        });
    })();
</script>
"#;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, tx))
}

async fn handle_socket(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        debug!("Reload socket closed before the message was sent");
                        return;
                    }
                }
                Err(RecvError::Closed) => return,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Editor scratch files (Emacs `.#*`, `*~` backups, vim `*.swp`).
fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|s| s.starts_with(".#") || s.ends_with('~') || s.ends_with(".swp"))
}

fn is_relevant(event: &DebouncedEvent) -> bool {
    let is_relevant_kind =
        event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
    is_relevant_kind && !event.event.paths.iter().any(|p| is_temp_file(p))
}

pub fn start_content_watcher(tx: RefreshBroadcaster, app_state: Arc<AppState>) {
    info!("Starting content watcher for hot-reload...");
    tokio::spawn(async move {
        let (watcher_tx, mut watcher_rx) = tokio::sync::mpsc::channel(1);

        let debouncer = new_debouncer(
            Duration::from_millis(200),
            None,
            move |res: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| match res {
                Ok(events) => {
                    let relevant: Vec<&DebouncedEvent> =
                        events.iter().filter(|e| is_relevant(e)).collect();
                    if !relevant.is_empty() {
                        debug!(
                            "Relevant file change detected: {:?}",
                            relevant
                                .iter()
                                .flat_map(|e| &e.event.paths)
                                .map(|p| p.display())
                                .collect::<Vec<_>>()
                        );
                        if let Err(e) = watcher_tx.blocking_send(()) {
                            error!("Failed to send watcher event: {}", e);
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("Watcher error: {}", e);
                    }
                }
            },
        );

        let mut debouncer = match debouncer {
            Ok(debouncer) => debouncer,
            Err(e) => {
                error!("Failed to create debouncer: {}", e);
                return;
            }
        };

        let content_dir = app_state.config.content_dir.clone();
        if let Err(e) = debouncer
            .watcher()
            .watch(&content_dir, RecursiveMode::Recursive)
        {
            error!("Failed to watch {}: {}", content_dir.display(), e);
            return;
        }

        // the debouncer lives as long as this loop
        while watcher_rx.recv().await.is_some() {
            info!("Content change detected, reloading content and sending signal...");

            reload_content(&app_state).await;

            if let Err(e) = tx.send(()) {
                debug!("No reload listeners connected: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_editor_scratch_files() {
        assert!(is_temp_file(Path::new("content/posts/.#draft.md")));
        assert!(is_temp_file(Path::new("content/posts/draft.md~")));
        assert!(is_temp_file(Path::new("content/docs/.intro.md.swp")));
        assert!(!is_temp_file(Path::new("content/docs/intro.md")));
    }
}
