use serde::{Deserialize, Serialize};

use crate::text::reading_time;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
}

/// Front matter of a file under `content/posts/`.
#[derive(Deserialize, Debug, Clone)]
pub struct PostFrontMatter {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub reading_time: Option<u32>,
    #[serde(default)]
    pub views: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Markdown body.
    pub content: String,
    pub cover_image: Option<String>,
    pub author: Author,
    pub category: String,
    pub tags: Vec<String>,
    pub published_at: String,
    pub updated_at: String,
    /// Minutes.
    pub reading_time: u32,
    pub views: u64,
}

impl BlogPost {
    pub fn from_front_matter(fm: PostFrontMatter, content: String) -> Self {
        let reading_time = fm.reading_time.unwrap_or_else(|| reading_time(&content));
        let updated_at = fm.updated_at.unwrap_or_else(|| fm.published_at.clone());
        Self {
            id: fm.id,
            title: fm.title,
            slug: fm.slug,
            excerpt: fm.excerpt,
            content,
            cover_image: fm.cover_image,
            author: fm.author,
            category: fm.category,
            tags: fm.tags,
            published_at: fm.published_at,
            updated_at,
            reading_time,
            views: fm.views,
        }
    }
}

/// Front matter of a file under `content/docs/`. Every key is optional.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DocFrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i64>,
    pub category: Option<String>,
    pub sidebar_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub order: i64,
    pub content: String,
    pub category: Option<String>,
    pub sidebar_label: Option<String>,
}

pub const DEFAULT_DOC_ORDER: i64 = 99;

impl Doc {
    pub fn from_front_matter(slug: &str, fm: DocFrontMatter, content: String) -> Self {
        Self {
            slug: slug.to_string(),
            title: fm.title.filter(|t| !t.is_empty()).unwrap_or_else(|| slug.to_string()),
            description: fm.description.unwrap_or_default(),
            // a zero order counts as unset
            order: fm.order.filter(|o| *o != 0).unwrap_or(DEFAULT_DOC_ORDER),
            content,
            category: fm.category,
            sidebar_label: fm.sidebar_label,
        }
    }
}

/// Table-of-contents entry derived from a doc body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}
