//! Lightweight markdown converter for blog post bodies.
//!
//! A fixed sequence of regex rewrites, each pass working on the output of the
//! previous one. Post bodies are trusted author content: nothing is escaped.

use std::sync::LazyLock;

use regex::Regex;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(H3, r"(?m)^### (.*?)$");
pattern!(H2, r"(?m)^## (.*?)$");
pattern!(H1, r"(?m)^# (.*?)$");
pattern!(CODE_BLOCK, r"```(.*?)\n((?s:.)*?)```");
pattern!(INLINE_CODE, r"`(.*?)`");
pattern!(BOLD, r"\*\*(.*?)\*\*");
pattern!(ITALIC, r"\*(.*?)\*");
pattern!(LINK, r"\[(.*?)\]\((.*?)\)");

pub fn convert_markdown_to_html(markdown: &str) -> String {
    // h3 before h2 before h1, so `### ` is never read as `# `.
    let html = H3.replace_all(markdown, "<h3>${1}</h3>");
    let html = H2.replace_all(&html, "<h2>${1}</h2>");
    let html = H1.replace_all(&html, "<h1>${1}</h1>");

    let html = CODE_BLOCK.replace_all(&html, "<pre><code>${2}</code></pre>");
    let html = INLINE_CODE.replace_all(&html, "<code>${1}</code>");

    // Bold first: the italic pattern would eat one asterisk of each pair.
    let html = BOLD.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC.replace_all(&html, "<em>${1}</em>");

    let html = LINK.replace_all(&html, r#"<a href="${2}">${1}</a>"#);

    let html = format!("<p>{}</p>", html.replace("\n\n", "</p>\n<p>"));

    wrap_lists(&html)
}

/// A `- ` line, possibly carrying the paragraph tags added around it.
struct ListItem<'a> {
    opens_paragraph: bool,
    text: &'a str,
    closes_paragraph: bool,
}

fn list_item(line: &str) -> Option<ListItem<'_>> {
    let (opens_paragraph, rest) = match line.strip_prefix("<p>") {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let text = rest.strip_prefix("- ")?;
    let (text, closes_paragraph) = match text.strip_suffix("</p>") {
        Some(text) => (text, true),
        None => (text, false),
    };
    Some(ListItem {
        opens_paragraph,
        text,
        closes_paragraph,
    })
}

/// Turns each maximal run of `- ` lines into one `<ul>`, moving the
/// paragraph tags at the run's edges outside the list.
fn wrap_lists(html: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Vec<ListItem<'_>> = Vec::new();

    for line in html.split('\n') {
        match list_item(line) {
            Some(item) => run.push(item),
            None => {
                flush_run(&mut run, &mut lines);
                lines.push(line.to_string());
            }
        }
    }
    flush_run(&mut run, &mut lines);

    lines.join("\n")
}

fn flush_run(run: &mut Vec<ListItem<'_>>, lines: &mut Vec<String>) {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return;
    };

    let mut out = String::new();
    if !first.opens_paragraph {
        out.push_str("</p>");
    }
    out.push_str("<ul>");
    for item in run.iter() {
        out.push_str("<li>");
        out.push_str(item.text);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    if !last.closes_paragraph {
        out.push_str("<p>");
    }

    lines.push(out);
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::convert_markdown_to_html;
    use scraper::{Html, Selector};

    fn squash(html: &str) -> String {
        html.split_whitespace().collect()
    }

    #[test]
    fn headings_match_most_specific_first() {
        let html = convert_markdown_to_html("### Title");
        assert!(html.contains("<h3>Title</h3>"));
        assert!(!html.contains("<h1>"));

        let html = convert_markdown_to_html("## Sub\n# Top");
        assert!(html.contains("<h2>Sub</h2>"));
        assert!(html.contains("<h1>Top</h1>"));
    }

    #[test]
    fn bold_runs_before_italic() {
        let html = convert_markdown_to_html("**bold** and *it*");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>it</em>"));
        assert!(!html.contains("<em>*bold"));
    }

    #[test]
    fn fenced_block_drops_language_tag() {
        let html = convert_markdown_to_html("```bash\necho hi\n```");
        assert!(html.contains("<pre><code>echo hi\n</code></pre>"));
        assert!(!html.contains("bash"));
    }

    #[test]
    fn inline_code_and_links() {
        let html = convert_markdown_to_html("Run `cargo` then see [docs](http://x)");
        assert!(html.contains("<code>cargo</code>"));
        assert!(html.contains(r#"<a href="http://x">docs</a>"#));
    }

    #[test]
    fn adjacent_items_share_one_list() {
        let html = convert_markdown_to_html("- a\n- b");
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn list_interrupting_a_paragraph_closes_and_reopens_it() {
        let html = convert_markdown_to_html("Intro:\n- a\n- b\nOutro");
        assert_eq!(
            html,
            "<p>Intro:\n</p><ul><li>a</li><li>b</li></ul><p>\nOutro</p>"
        );
    }

    #[test]
    fn loose_items_still_form_one_list() {
        let html = convert_markdown_to_html("- a\n\n- b");
        let doc = Html::parse_fragment(&html);
        let lists = Selector::parse("ul").unwrap();
        let items = Selector::parse("ul > li").unwrap();
        assert_eq!(doc.select(&lists).count(), 1);
        assert_eq!(doc.select(&items).count(), 2);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let html = convert_markdown_to_html("one\n\ntwo");
        assert_eq!(html, "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn end_to_end_document() {
        let input = "# Title\n\nSome **bold** and *italic* text.\n\n- one\n- two";
        let html = squash(&convert_markdown_to_html(input));

        let heading = html.find("<h1>Title</h1>").unwrap();
        let paragraph = html
            .find("<p>Some<strong>bold</strong>and<em>italic</em>text.</p>")
            .unwrap();
        let list = html.find("<ul><li>one</li><li>two</li></ul>").unwrap();
        assert!(heading < paragraph && paragraph < list);
    }

    #[test]
    fn converting_output_again_does_not_rewrap_tags() {
        let input = "# T\n\n[l](u)\n\n```\ncode\n```";
        let once = convert_markdown_to_html(input);
        let twice = convert_markdown_to_html(&once);

        for tag in ["<h1>", "<a href=", "<pre><code>"] {
            assert_eq!(once.matches(tag).count(), 1, "{tag} in {once}");
            assert_eq!(twice.matches(tag).count(), 1, "{tag} in {twice}");
        }
        assert!(!twice.contains("<h1><h1>"));
    }

    #[test]
    fn malformed_input_does_not_panic() {
        for input in ["", "```", "**", "[x](", "- ", "#", "\n\n\n"] {
            let _ = convert_markdown_to_html(input);
        }
        assert_eq!(convert_markdown_to_html(""), "<p></p>");
    }

    #[test]
    fn markup_in_source_passes_through() {
        let html = convert_markdown_to_html("<b>raw</b>");
        assert_eq!(html, "<p><b>raw</b></p>");
    }
}
