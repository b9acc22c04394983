//! Locale dictionaries and dotted-key lookup.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tokio::fs;

use crate::error::ContentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Vi];

    /// Strict parse; `None` for anything that is not a supported code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "vi" => Some(Language::Vi),
            _ => None,
        }
    }

    /// Lenient parse for user input: unknown codes fall back to English.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Vi => "vi",
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Vi => "Tiếng Việt",
        }
    }
}

/// Both dictionaries, loaded once and swapped on reload.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    en: Value,
    vi: Value,
}

impl Messages {
    pub fn new(en: Value, vi: Value) -> Self {
        Self { en, vi }
    }

    /// Reads `<dir>/en.json` and `<dir>/vi.json`.
    pub async fn load(dir: &Path) -> Result<Self, ContentError> {
        Ok(Self {
            en: load_dictionary(&dir.join("en.json")).await?,
            vi: load_dictionary(&dir.join("vi.json")).await?,
        })
    }

    pub fn translator(&self, language: Language) -> Translator<'_> {
        let messages = match language {
            Language::En => &self.en,
            Language::Vi => &self.vi,
        };
        Translator { language, messages }
    }
}

async fn load_dictionary(path: &Path) -> Result<Value, ContentError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| ContentError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&raw).map_err(|e| ContentError::Messages(path.to_path_buf(), e))
}

/// Lookup handle bound to one language, passed down to page renderers.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    language: Language,
    messages: &'a Value,
}

impl<'a> Translator<'a> {
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn t(&self, key: &str) -> String {
        self.t_or(key, None)
    }

    /// Walks `key` split on `.`. A missing segment yields `default` (when
    /// non-empty) or the key; a non-string leaf yields the key.
    pub fn t_or(&self, key: &str, default: Option<&str>) -> String {
        let mut value = self.messages;
        for segment in key.split('.') {
            match value.get(segment) {
                Some(next) => value = next,
                None => {
                    return default
                        .filter(|d| !d.is_empty())
                        .unwrap_or(key)
                        .to_string();
                }
            }
        }
        match value {
            Value::String(s) => s.clone(),
            _ => key.to_string(),
        }
    }
}
