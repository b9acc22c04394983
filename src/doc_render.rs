//! CommonMark rendering for documentation pages.
//!
//! On top of plain pulldown-cmark output this adds heading ids with
//! self-links, `:::note`-style admonition blocks, and a table of contents.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use regex::Regex;

use crate::models::Heading;

const ADMONITION_KINDS: [&str; 5] = ["note", "tip", "info", "warning", "danger"];
const MARKER_BLOCK_LANG: &str = "mdx-code-block";

static DIRECTIVE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^:::([A-Za-z][\w-]*)(?:\{\s*title\s*=\s*"(.*?)"\s*\})?\s*$"#).unwrap()
});

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

pub struct RenderedDoc {
    pub html: String,
    /// h2 and h3 only, ids identical to the ones in `html`.
    pub headings: Vec<Heading>,
}

pub fn render_doc(markdown: &str) -> RenderedDoc {
    let source = expand_admonitions(markdown);
    let mut slugger = Slugger::default();
    let mut headings = Vec::new();
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut open_heading: Option<OpenHeading<'_>> = None;
    let mut in_marker_block = false;

    for event in Parser::new_ext(&source, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                if &**lang == MARKER_BLOCK_LANG =>
            {
                in_marker_block = true;
            }
            Event::End(TagEnd::CodeBlock) if in_marker_block => in_marker_block = false,
            _ if in_marker_block => {}
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                open_heading = Some(OpenHeading {
                    level,
                    id,
                    classes,
                    attrs,
                    inner: Vec::new(),
                });
            }
            end @ Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = open_heading.take() {
                    heading.emit(&mut slugger, &mut headings, &mut events);
                }
                events.push(end);
            }
            other => match open_heading.as_mut() {
                Some(heading) => heading.inner.push(other),
                None => events.push(other),
            },
        }
    }

    let mut html_out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_out, events.into_iter());
    RenderedDoc {
        html: html_out,
        headings,
    }
}

struct OpenHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    inner: Vec<Event<'a>>,
}

impl<'a> OpenHeading<'a> {
    fn emit(self, slugger: &mut Slugger, headings: &mut Vec<Heading>, out: &mut Vec<Event<'a>>) {
        let text: String = self
            .inner
            .iter()
            .filter_map(|event| match event {
                Event::Text(t) | Event::Code(t) => Some(&**t),
                _ => None,
            })
            .collect();

        let id = match self.id {
            Some(id) => Some(id.to_string()),
            None if !text.is_empty() => Some(slugger.slug(&text)),
            None => None,
        };

        let level = heading_level(self.level);
        if let Some(id) = &id {
            if level == 2 || level == 3 {
                headings.push(Heading {
                    id: id.clone(),
                    text: text.clone(),
                    level,
                });
            }
        }

        out.push(Event::Start(Tag::Heading {
            level: self.level,
            id: id.clone().map(CowStr::from),
            classes: self.classes,
            attrs: self.attrs,
        }));
        match id {
            Some(id) => {
                out.push(Event::InlineHtml(format!("<a href=\"#{id}\">").into()));
                out.extend(self.inner);
                out.push(Event::InlineHtml("</a>".into()));
            }
            None => out.extend(self.inner),
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// GitHub-style heading slugs, unique within one document.
#[derive(Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let original = slugify(text);
        let mut slug = original.clone();
        while self.occurrences.contains_key(&slug) {
            let count = {
                let count = self.occurrences.entry(original.clone()).or_insert(0);
                *count += 1;
                *count
            };
            slug = format!("{original}-{count}");
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

/// Lowercase, punctuation dropped, each space turned into `-`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '-' | '_' => Some(c),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

/// Rewrites `:::kind{title="…"}` … `:::` containers into HTML wrappers
/// around the inner markdown. Fenced code is left alone.
fn expand_admonitions(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    // `true` for admonitions we opened, `false` for unknown directives
    let mut stack: Vec<bool> = Vec::new();
    let mut fence: Option<&str> = None;

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            lines.push(line.to_string());
            continue;
        }
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(&trimmed[..3]);
            lines.push(line.to_string());
            continue;
        }

        if line.trim_end() == ":::" {
            match stack.pop() {
                Some(true) => {
                    lines.push(String::new());
                    lines.push("</div>".to_string());
                    lines.push(String::new());
                }
                Some(false) | None => lines.push(line.to_string()),
            }
            continue;
        }

        if let Some(caps) = DIRECTIVE_OPEN.captures(line.trim_end()) {
            let kind = caps[1].to_ascii_lowercase();
            if ADMONITION_KINDS.contains(&kind.as_str()) {
                let title = caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| capitalize(&kind));
                lines.push(format!("<div class=\"admonition admonition-{kind}\">"));
                lines.push(format!(
                    "<p class=\"admonition-title\">{}</p>",
                    htmlescape::encode_minimal(&title)
                ));
                lines.push(String::new());
                stack.push(true);
            } else {
                lines.push(line.to_string());
                stack.push(false);
            }
            continue;
        }

        lines.push(line.to_string());
    }

    // unclosed admonitions still get their wrapper closed
    for opened in stack.into_iter().rev() {
        if opened {
            lines.push(String::new());
            lines.push("</div>".to_string());
        }
    }

    lines.join("\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn slugger_deduplicates() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("Hello World"), "hello-world");
        assert_eq!(slugger.slug("Hello World"), "hello-world-1");
        assert_eq!(slugger.slug("Hello World"), "hello-world-2");
        assert_eq!(slugger.slug("hello-world-1"), "hello-world-1-1");
    }

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("What's new in v5?"), "whats-new-in-v5");
        assert_eq!(slugify("Cài đặt"), "cài-đặt");
    }

    #[test]
    fn toc_ids_match_rendered_ids() {
        let doc = render_doc("# Intro\n\n## Setup\n\n### `useQuery` hook\n\n## Setup\n\n#### Deep");
        let ids: Vec<_> = doc.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "usequery-hook", "setup-1"]);
        assert_eq!(doc.headings[1].text, "useQuery hook");
        assert_eq!(doc.headings[1].level, 3);

        let page = Html::parse_fragment(&doc.html);
        for id in ids {
            let selector = Selector::parse(&format!("#{id} > a[href=\"#{id}\"]")).unwrap();
            assert_eq!(page.select(&selector).count(), 1, "missing anchor for {id}");
        }
    }

    #[test]
    fn toc_skips_other_levels() {
        let headings = render_doc("# Top\n\n## Only\n\n#### Low").headings;
        assert_eq!(
            headings,
            vec![Heading {
                id: "only".into(),
                text: "Only".into(),
                level: 2
            }]
        );
    }

    #[test]
    fn renders_admonitions() {
        let doc = render_doc(":::tip{title=\"Heads up\"}\nUse **bold**.\n:::\n\nAfter");
        assert!(doc.html.contains("<div class=\"admonition admonition-tip\">"));
        assert!(doc.html.contains("<p class=\"admonition-title\">Heads up</p>"));
        assert!(doc.html.contains("<strong>bold</strong>"));

        let page = Html::parse_fragment(&doc.html);
        let inner = Selector::parse("div.admonition-tip strong").unwrap();
        assert_eq!(page.select(&inner).count(), 1);
        let after = Selector::parse("div.admonition + p").unwrap();
        assert_eq!(page.select(&after).next().unwrap().inner_html(), "After");
    }

    #[test]
    fn admonition_title_defaults_to_kind() {
        let doc = render_doc(":::warning\nCareful\n:::");
        assert!(doc.html.contains("<p class=\"admonition-title\">Warning</p>"));
    }

    #[test]
    fn unknown_directive_stays_text() {
        let doc = render_doc(":::youtube\nclip\n:::");
        assert!(!doc.html.contains("admonition"));
        assert!(doc.html.contains(":::youtube"));
    }

    #[test]
    fn directives_inside_code_are_untouched() {
        let doc = render_doc("```md\n:::note\nx\n:::\n```");
        assert!(!doc.html.contains("admonition-note"));
        assert!(doc.html.contains(":::note"));
    }

    #[test]
    fn marker_code_blocks_are_dropped() {
        let doc = render_doc("before\n\n```mdx-code-block\nimport X from 'x';\n```\n\nafter");
        assert!(!doc.html.contains("import X"));
        assert!(doc.html.contains("<p>before</p>"));
        assert!(doc.html.contains("<p>after</p>"));
    }

    #[test]
    fn renders_tables() {
        let doc = render_doc("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(doc.html.contains("<table>"));
    }
}
