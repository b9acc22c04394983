use std::path::Path;

use tokio::fs;
use tracing::{error, info};

use crate::error::ContentError;
use crate::i18n::Messages;
use crate::models::BlogPost;
use crate::posts::load_static_posts;
use crate::state::{AppState, Templates};

/// Everything read from the content directory at start-up and on reload.
pub struct LoadedContent {
    pub templates: Templates,
    pub messages: Messages,
    pub posts: Vec<BlogPost>,
}

async fn read_template(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ContentError::Io(path.to_path_buf(), e))
}

pub async fn load_content(content_dir: &Path) -> Result<LoadedContent, ContentError> {
    let templates = Templates {
        layout_html: read_template(&content_dir.join("layout.html")).await?,
        banner_html: read_template(&content_dir.join("banner.html")).await?,
        not_found_html: read_template(&content_dir.join("not_found.html")).await?,
    };
    let messages = Messages::load(&content_dir.join("messages")).await?;

    let posts_dir = content_dir.join("posts");
    let posts = if fs::metadata(&posts_dir).await.is_ok() {
        load_static_posts(&posts_dir).await?
    } else {
        Vec::new()
    };

    Ok(LoadedContent {
        templates,
        messages,
        posts,
    })
}

pub async fn reload_content(app_state: &AppState) {
    info!("Reloading application content...");
    match load_content(&app_state.config.content_dir).await {
        Ok(content) => {
            *app_state.templates.write().await = content.templates;
            *app_state.messages.write().await = content.messages;
            *app_state.posts.write().await = content.posts;
            info!("Content successfully reloaded.");
        }
        Err(e) => {
            error!("Failed to reload content: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    /// Writes a minimal but complete content directory.
    pub fn write_content_dir(root: &Path) {
        let write = |rel: &str, body: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        };

        write(
            "layout.html",
            "<!doctype html><html lang=\"{{ lang }}\"><head><title>{{ title }}</title>{{ head }}</head>\
             <body>{{ banner }}<nav>{{ nav }}</nav><main>{{ content }}</main></body></html>",
        );
        write("banner.html", "<header class=\"banner\">Zone</header>");
        write(
            "not_found.html",
            "<section class=\"not-found\"><h1>Not found</h1><p>{{ path }}</p></section>",
        );
        write(
            "messages/en.json",
            r#"{"nav":{"home":"Home","blog":"Blog","docs":"Docs"},
               "blog":{"title":"Blog","noResults":"No posts found","readingTime":"min read","views":"views",
                       "search":"Search posts...","filter":"Filter by category","allCategories":"All categories"},
               "post":{"backToBlog":"Back to blog","relatedPosts":"Related posts"},
               "home":{"latestPosts":"Latest posts","viewAll":"View all"},
               "master":{"hero":{"title":"Hello there"}}}"#,
        );
        write(
            "messages/vi.json",
            r#"{"nav":{"home":"Trang chủ","blog":"Blog","docs":"Tài liệu"},
               "blog":{"title":"Bài viết","readingTime":"phút đọc"},
               "master":{"hero":{"title":"Xin chào"}}}"#,
        );
        write(
            "posts/one.md",
            "---\nid: \"1\"\ntitle: First <Post>\nslug: first-post\nexcerpt: The first one\n\
             category: React\ntags: [react]\npublished_at: \"2024-12-01\"\n---\n\
             # First\n\nSome **bold** text.\n\n- a\n- b\n",
        );
        write(
            "posts/two.md",
            "---\nid: \"2\"\ntitle: Second\nslug: second-post\nexcerpt: Styling things\n\
             category: React\ntags: [css]\npublished_at: \"2024-11-01\"\n---\nBody\n",
        );
        write(
            "docs/intro.md",
            "---\ntitle: Introduction\ndescription: Start here\norder: 1\n---\n\
             ## Install\n\n:::note\nRead this.\n:::\n\n### Configure\n",
        );
        write("static/site.css", "body{}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_full_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_content_dir(dir.path());

        let content = load_content(dir.path()).await.unwrap();
        assert!(content.templates.layout_html.contains("{{ content }}"));
        assert_eq!(content.posts.len(), 2);
        assert_eq!(
            content.messages.translator(crate::i18n::Language::Vi).t("nav.docs"),
            "Tài liệu"
        );
    }

    #[tokio::test]
    async fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_content(dir.path()).await.err().unwrap();
        assert!(err.to_string().contains("layout.html"));
    }
}
