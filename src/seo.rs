//! schema.org JSON-LD documents embedded in page heads.

use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::models::{BlogPost, Doc};
use crate::text::word_count;

pub struct Crumb<'a> {
    pub name: &'a str,
    pub url: String,
}

pub fn blog_posting(config: &SiteConfig, post: &BlogPost) -> Value {
    let base = config.base_url();
    let author = if post.author.name.is_empty() {
        config.site_name.as_str()
    } else {
        post.author.name.as_str()
    };
    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.excerpt,
        "image": post
            .cover_image
            .clone()
            .unwrap_or_else(|| format!("{base}/og-image.jpg")),
        "datePublished": post.published_at,
        "dateModified": post.updated_at,
        "author": { "@type": "Person", "name": author },
        "publisher": {
            "@type": "Organization",
            "name": config.site_name,
            "logo": { "@type": "ImageObject", "url": format!("{base}/logo.png") },
        },
        "mainEntityOfPage": { "@type": "WebPage", "@id": format!("{base}/blog/{}", post.slug) },
        "keywords": post.tags.join(", "),
        "wordCount": word_count(&post.content),
        "articleBody": post.content,
    })
}

pub fn website(config: &SiteConfig) -> Value {
    let base = config.base_url();
    json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": config.site_name,
        "url": base,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{base}/blog?q={{search_term_string}}"),
            },
            "query-input": "required name=search_term_string",
        },
    })
}

pub fn organization(config: &SiteConfig) -> Value {
    let base = config.base_url();
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": config.site_name,
        "url": base,
        "logo": format!("{base}/logo.png"),
    })
}

pub fn breadcrumbs(items: &[Crumb<'_>]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": item.name,
                "item": item.url,
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

pub fn tech_article(config: &SiteConfig, doc: &Doc) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "TechArticle",
        "headline": doc.title,
        "description": doc.description,
        "url": format!("{}/docs/{}", config.base_url(), doc.slug),
    })
}

/// `<script>` tag for a JSON-LD value. `</` is escaped so article bodies
/// cannot terminate the script early.
pub fn script_tag(value: &Value) -> String {
    format!(
        "<script type=\"application/ld+json\">{}</script>",
        value.to_string().replace("</", "<\\/")
    )
}
