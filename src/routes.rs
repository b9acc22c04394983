use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, get_service},
    Router,
};
use serde::Deserialize;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::Zone;
use crate::doc_render::render_doc;
use crate::docs::{load_all_docs, load_doc, DEFAULT_DOC_SLUG};
use crate::hot_reload::ws_handler;
use crate::i18n::Language;
use crate::pages::{self, Page};
use crate::posts::RELATED_POSTS_LIMIT;
use crate::state::{AppState, RouterState};

#[derive(Deserialize, Debug, Default)]
pub struct LangQuery {
    lang: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListingQuery {
    q: Option<String>,
    category: Option<String>,
    lang: Option<String>,
}

pub fn build_router(router_state: RouterState) -> Router {
    let config = &router_state.app_state.config;
    let static_dir = get_service(ServeDir::new(config.static_dir()));
    let favicon = get_service(ServeFile::new(config.static_dir().join("favicon.ico")));

    let routes = match config.zone {
        Zone::Blog => Router::new()
            .route("/", get(home))
            .route("/blog", get(blog_listing))
            .route("/blog/{slug}", get(blog_post))
            .route("/docs", get(docs_index))
            .route("/docs/{slug}", get(doc)),
        Zone::Master => Router::new()
            .route("/", get(master_root))
            .route("/blog", get(master_blog_redirect))
            .route("/{locale}", get(master_landing)),
    };

    routes
        .nest_service("/static", static_dir)
        .route_service("/favicon.ico", favicon)
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(router_state)
}

/// `?lang=` wins, then the `lang` cookie, then the configured default.
fn resolve_language(query: Option<&str>, headers: &HeaderMap, default: Language) -> Language {
    if let Some(code) = query.filter(|c| !c.is_empty()) {
        return Language::from_code_or_default(code);
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix("lang="))
        .and_then(Language::from_code)
        .unwrap_or(default)
}

async fn respond(state: &AppState, status: StatusCode, page: Page) -> Response {
    let templates = state.templates.read().await;
    let html = pages::render_with_layout(&templates, &page, state.config.is_development);
    (status, Html(html)).into_response()
}

async fn not_found_response(state: &AppState, language: Language, path: &str) -> Response {
    let page = {
        let messages = state.messages.read().await;
        let templates = state.templates.read().await;
        let t = messages.translator(language);
        let nav = match state.config.zone {
            Zone::Blog => pages::blog_nav(&t, path),
            Zone::Master => pages::master_nav(&t),
        };
        pages::not_found_page(&templates, &t, nav, path)
    };
    respond(state, StatusCode::NOT_FOUND, page).await
}

async fn home(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Response {
    let language = resolve_language(query.lang.as_deref(), &headers, state.config.default_language);
    let catalog = state.post_snapshot().await;
    let page = {
        let messages = state.messages.read().await;
        pages::home_page(&messages.translator(language), &state.config, &catalog)
    };
    respond(&state, StatusCode::OK, page).await
}

async fn blog_listing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response {
    let language = resolve_language(query.lang.as_deref(), &headers, state.config.default_language);
    let search = query.q.as_deref().unwrap_or_default().trim();
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let catalog = state.post_snapshot().await;
    let page = {
        let messages = state.messages.read().await;
        pages::blog_listing_page(
            &messages.translator(language),
            &state.config,
            &catalog,
            search,
            category,
        )
    };
    respond(&state, StatusCode::OK, page).await
}

async fn blog_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Response {
    let language = resolve_language(query.lang.as_deref(), &headers, state.config.default_language);
    let catalog = state.post_snapshot().await;
    let Some(post) = catalog.get_post_by_slug(&slug) else {
        return not_found_response(&state, language, &format!("/blog/{slug}")).await;
    };
    let related = catalog.related_posts(&slug, RELATED_POSTS_LIMIT);
    let page = {
        let messages = state.messages.read().await;
        pages::post_page(&messages.translator(language), &state.config, post, &related)
    };
    respond(&state, StatusCode::OK, page).await
}

async fn docs_index(Query(query): Query<LangQuery>) -> Redirect {
    match query.lang.as_deref().and_then(Language::from_code) {
        Some(language) => Redirect::temporary(&format!(
            "/docs/{DEFAULT_DOC_SLUG}?lang={}",
            language.code()
        )),
        None => Redirect::temporary(&format!("/docs/{DEFAULT_DOC_SLUG}")),
    }
}

async fn doc(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Response {
    let language = resolve_language(query.lang.as_deref(), &headers, state.config.default_language);
    let Some(doc) = load_doc(&state.config.docs_dir(), &slug).await else {
        return not_found_response(&state, language, &format!("/docs/{slug}")).await;
    };
    let rendered = render_doc(&doc.content);
    let siblings = load_all_docs(&state.config.docs_dir()).await;
    let page = {
        let messages = state.messages.read().await;
        pages::doc_page(
            &messages.translator(language),
            &state.config,
            &doc,
            &rendered,
            &siblings,
        )
    };
    respond(&state, StatusCode::OK, page).await
}

async fn master_root(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&format!("/{}", state.config.default_language.code()))
}

async fn master_landing(
    Path(locale): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(language) = Language::from_code(&locale) else {
        return not_found_response(&state, state.config.default_language, &format!("/{locale}"))
            .await;
    };
    let page = {
        let messages = state.messages.read().await;
        pages::master_landing_page(&messages.translator(language), &state.config)
    };
    respond(&state, StatusCode::OK, page).await
}

async fn master_blog_redirect(State(state): State<Arc<AppState>>) -> Redirect {
    if state.config.is_development {
        Redirect::temporary(&state.config.blog_url)
    } else {
        Redirect::permanent(&state.config.blog_url)
    }
}

async fn not_found(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let language = resolve_language(query.lang.as_deref(), &headers, state.config.default_language);
    not_found_response(&state, language, uri.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content_loader::{fixtures::write_content_dir, load_content};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::sync::{broadcast, RwLock};
    use tower::ServiceExt;

    async fn app(zone: Zone, root: &std::path::Path) -> Router {
        write_content_dir(root);
        let config = SiteConfig {
            zone,
            content_dir: root.to_path_buf(),
            blog_url: "https://blog.example.com".into(),
            ..SiteConfig::default()
        };
        let content = load_content(root).await.unwrap();
        let app_state = Arc::new(AppState {
            config,
            templates: RwLock::new(content.templates),
            messages: RwLock::new(content.messages),
            posts: RwLock::new(content.posts),
            hosted: None,
        });
        let (broadcaster, _rx) = broadcast::channel(1);
        build_router(RouterState {
            app_state,
            broadcaster,
        })
    }

    async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let res = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn blog_home_lists_latest_posts() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (status, _, body) = get(&app, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<html lang=\"en\">"));
        assert!(body.contains("First &lt;Post&gt;"));
        assert!(body.find("first-post").unwrap() < body.find("second-post").unwrap());
        assert!(!body.contains("WebSocket"));
    }

    #[tokio::test]
    async fn listing_filters_by_query_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (_, _, body) = get(&app, "/blog?q=styling", None).await;
        assert!(body.contains("/blog/second-post"));
        assert!(!body.contains("/blog/first-post"));

        let (_, _, body) = get(&app, "/blog?q=&category=CSS", None).await;
        assert!(body.contains("No posts found"));
    }

    #[tokio::test]
    async fn post_detail_renders_markdown_and_related() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (status, _, body) = get(&app, "/blog/first-post", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<strong>bold</strong>"));
        assert!(body.contains("<ul><li>a</li><li>b</li></ul>"));
        assert!(body.contains("related-posts"));
        assert!(body.contains("/blog/second-post?lang=en"));
    }

    #[tokio::test]
    async fn unknown_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (status, _, body) = get(&app, "/blog/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("/blog/nope"));
        assert!(body.contains("class=\"not-found\""));
    }

    #[tokio::test]
    async fn docs_redirect_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (status, headers, _) = get(&app, "/docs", None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/docs/intro");

        let (status, _, body) = get(&app, "/docs/intro", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("id=\"install\""));
        assert!(body.contains("href=\"#configure\""));
        assert!(body.contains("admonition-note"));
        assert!(body.contains("TechArticle"));

        let (status, _, _) = get(&app, "/docs/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn language_from_query_or_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (_, _, body) = get(&app, "/blog?lang=vi", None).await;
        assert!(body.contains("<html lang=\"vi\">"));
        assert!(body.contains("Bài viết"));

        let (_, _, body) = get(&app, "/blog", Some("theme=dark; lang=vi")).await;
        assert!(body.contains("Bài viết"));

        let (_, _, body) = get(&app, "/blog?lang=fr", Some("lang=vi")).await;
        assert!(body.contains("<html lang=\"en\">"));
    }

    #[tokio::test]
    async fn unknown_route_and_static_files() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Blog, dir.path()).await;

        let (status, _, _) = get(&app, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = get(&app, "/static/site.css", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body{}");
    }

    #[tokio::test]
    async fn master_zone_routes() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Zone::Master, dir.path()).await;

        let (status, headers, _) = get(&app, "/", None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/en");

        let (status, _, body) = get(&app, "/vi", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Xin chào"));

        let (status, _, _) = get(&app, "/fr", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, headers, _) = get(&app, "/blog", None).await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(headers[header::LOCATION], "https://blog.example.com");
    }
}
