//! Blog post sources and the read-only queries pages run against them.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use gray_matter::{engine::YAML, Matter};
use reqwest::Client;
use serde::Deserialize;
use tokio::fs;
use tracing::error;

use crate::config::SupabaseConfig;
use crate::error::ContentError;
use crate::models::{Author, BlogPost, PostFrontMatter};
use crate::text::reading_time;

pub const RELATED_POSTS_LIMIT: usize = 3;

/// An immutable snapshot of posts, taken once per render.
#[derive(Debug, Clone, Default)]
pub struct PostCatalog {
    posts: Vec<BlogPost>,
}

impl PostCatalog {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self { posts }
    }

    pub fn get_post_by_slug(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Case-insensitive match on title, excerpt or any tag, optionally
    /// restricted to one category.
    pub fn search_posts(&self, query: &str, category: Option<&str>) -> Vec<&BlogPost> {
        let query = query.to_lowercase();
        self.posts
            .iter()
            .filter(|post| {
                let matches_query = post.title.to_lowercase().contains(&query)
                    || post.excerpt.to_lowercase().contains(&query)
                    || post.tags.iter().any(|t| t.to_lowercase().contains(&query));
                let matches_category = category.map_or(true, |c| post.category == c);
                matches_query && matches_category
            })
            .collect()
    }

    /// Other posts in the same category, in catalog order.
    pub fn related_posts(&self, slug: &str, limit: usize) -> Vec<&BlogPost> {
        let Some(post) = self.get_post_by_slug(slug) else {
            return Vec::new();
        };
        self.posts
            .iter()
            .filter(|p| p.slug != slug && p.category == post.category)
            .take(limit)
            .collect()
    }

    /// Distinct tags in first-seen order.
    pub fn all_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.posts
            .iter()
            .flat_map(|p| p.tags.iter())
            .filter(|t| seen.insert(t.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Newest first.
    pub fn latest_posts(&self, limit: usize) -> Vec<&BlogPost> {
        let mut posts: Vec<&BlogPost> = self.posts.iter().collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts.truncate(limit);
        posts
    }
}

/// Reads every `*.md` under `dir`. Files with broken front matter are
/// logged and skipped.
pub async fn load_static_posts(dir: &Path) -> Result<Vec<BlogPost>, ContentError> {
    let mut posts = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ContentError::Io(dir.to_path_buf(), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ContentError::Io(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }
        let file_content = fs::read_to_string(&path)
            .await
            .map_err(|e| ContentError::Io(path.clone(), e))?;

        let matter = Matter::<YAML>::new();
        match matter.parse::<PostFrontMatter>(&file_content) {
            Ok(parsed) => match parsed.data {
                Some(front_matter) => {
                    posts.push(BlogPost::from_front_matter(front_matter, parsed.content))
                }
                None => error!("Post {} has no front matter", path.display()),
            },
            Err(e) => error!("Failed to parse front matter in {}: {}", path.display(), e),
        }
    }

    posts.sort_by_key(|p| (p.id.parse::<u64>().unwrap_or(u64::MAX), p.id.clone()));
    Ok(posts)
}

/// Row shape of the hosted `blog_posts` table.
#[derive(Deserialize, Debug)]
struct HostedPostRow {
    id: String,
    title: String,
    slug: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    reading_time: Option<u32>,
    #[serde(default)]
    views: Option<u64>,
}

impl From<HostedPostRow> for BlogPost {
    fn from(row: HostedPostRow) -> Self {
        let content = row.content.unwrap_or_default();
        let published_at = row.published_at.unwrap_or(row.created_at);
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt.unwrap_or_default(),
            reading_time: row.reading_time.unwrap_or_else(|| reading_time(&content)),
            content,
            cover_image: row.cover_image,
            author: Author::default(),
            category: row.category.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            updated_at: row.updated_at.unwrap_or_else(|| published_at.clone()),
            published_at,
            views: row.views.unwrap_or_default(),
        }
    }
}

/// Read-only client for the hosted post table (PostgREST API).
#[derive(Clone)]
pub struct HostedStore {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl HostedStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self, ContentError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn posts_endpoint(&self) -> String {
        format!("{}/rest/v1/blog_posts", self.base_url)
    }

    /// One request, no retry.
    pub async fn fetch_published(&self) -> Result<Vec<BlogPost>, ContentError> {
        let res = self
            .http
            .get(self.posts_endpoint())
            .query(&[
                ("select", "*"),
                ("published", "eq.true"),
                ("order", "published_at.desc"),
            ])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ContentError::Status(status));
        }
        let rows: Vec<HostedPostRow> = res.json().await?;
        Ok(rows.into_iter().map(BlogPost::from).collect())
    }
}
