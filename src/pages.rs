//! HTML composition for every page of both zones.
//!
//! Text from front matter and dictionaries is escaped; rendered markdown is
//! inserted as-is.

use std::sync::LazyLock;

use htmlescape::encode_minimal;
use regex::{Captures, Regex};

use crate::config::SiteConfig;
use crate::doc_render::RenderedDoc;
use crate::hot_reload::HOT_RELOAD_SCRIPT;
use crate::i18n::{Language, Translator};
use crate::icons::Icon;
use crate::markdown::convert_markdown_to_html;
use crate::models::{BlogPost, Doc, Heading};
use crate::posts::PostCatalog;
use crate::seo::{self, Crumb};
use crate::sidebar::{trail_to, SidebarItem};
use crate::state::Templates;
use crate::text::{format_date, truncate_text};

const HOME_LATEST_POSTS: usize = 3;
const CARD_EXCERPT_LEN: usize = 160;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{ (\w+) \}\}").unwrap());

/// One page ready to be poured into the layout template.
pub struct Page {
    pub title: String,
    pub language: Language,
    pub head: String,
    pub nav: String,
    pub content: String,
}

/// Fills the layout in a single pass, so text inserted for one placeholder
/// is never scanned for another. Unknown placeholders are kept verbatim.
pub fn render_with_layout(templates: &Templates, page: &Page, is_development: bool) -> String {
    let title = encode_minimal(&page.title);
    let mut html = PLACEHOLDER
        .replace_all(&templates.layout_html, |caps: &Captures<'_>| match &caps[1] {
            "title" => title.clone(),
            "lang" => page.language.code().to_string(),
            "head" => page.head.clone(),
            "banner" => templates.banner_html.clone(),
            "nav" => page.nav.clone(),
            "content" => page.content.clone(),
            _ => caps[0].to_string(),
        })
        .into_owned();

    if is_development {
        // the layout's own closing tag is the last one
        match html.rfind("</body>") {
            Some(at) => html.insert_str(at, HOT_RELOAD_SCRIPT),
            None => html.push_str(HOT_RELOAD_SCRIPT),
        }
    }

    html
}

/// `/blog` with the active search and category, as the listing was reached.
fn listing_path(query: &str, category: Option<&str>) -> String {
    let mut params = Vec::new();
    if !query.is_empty() {
        params.push(format!("q={}", urlencoding::encode(query)));
    }
    if let Some(category) = category {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if params.is_empty() {
        "/blog".to_string()
    } else {
        format!("/blog?{}", params.join("&"))
    }
}

/// Appends `lang=` to an internal link.
fn localized(href: &str, language: Language) -> String {
    let separator = if href.contains('?') { '&' } else { '?' };
    format!("{href}{separator}lang={}", language.code())
}

pub fn blog_nav(t: &Translator<'_>, current_path: &str) -> String {
    let language = t.language();
    let mut nav = String::from("<ul class=\"nav-links\">");
    for (href, key) in [("/", "nav.home"), ("/blog", "nav.blog"), ("/docs", "nav.docs")] {
        nav.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>",
            encode_minimal(&localized(href, language)),
            encode_minimal(&t.t(key))
        ));
    }
    nav.push_str("</ul>");
    nav.push_str(&language_switcher(language, |lang| {
        localized(current_path, lang)
    }));
    nav
}

pub fn master_nav(t: &Translator<'_>) -> String {
    let language = t.language();
    let mut nav = String::from("<ul class=\"nav-links\">");
    nav.push_str(&format!(
        "<li><a href=\"/{}\">{}</a></li>",
        language.code(),
        encode_minimal(&t.t("nav.home"))
    ));
    nav.push_str(&format!(
        "<li><a href=\"/blog\">{}</a></li>",
        encode_minimal(&t.t("nav.blog"))
    ));
    nav.push_str("</ul>");
    nav.push_str(&language_switcher(language, |lang| format!("/{}", lang.code())));
    nav
}

fn language_switcher(current: Language, href: impl Fn(Language) -> String) -> String {
    let mut html = format!(
        "<div class=\"language-switcher\">{}<ul>",
        Icon::Languages.svg("h-4 w-4")
    );
    for language in Language::ALL {
        let active = if language == current {
            " aria-current=\"true\" class=\"active\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<li><a href=\"{}\" hreflang=\"{}\"{active}>{}</a></li>",
            encode_minimal(&href(language)),
            language.code(),
            language.native_name()
        ));
    }
    html.push_str("</ul></div>");
    html
}

fn post_meta(t: &Translator<'_>, post: &BlogPost) -> String {
    format!(
        "<div class=\"post-meta\">\
         <span>{} {}</span>\
         <span>{} {} {}</span>\
         <span>{} {} {}</span>\
         </div>",
        Icon::Calendar.svg("h-4 w-4"),
        encode_minimal(&format_date(&post.published_at, t.language())),
        Icon::Clock.svg("h-4 w-4"),
        post.reading_time,
        encode_minimal(&t.t("blog.readingTime")),
        Icon::Eye.svg("h-4 w-4"),
        post.views,
        encode_minimal(&t.t("blog.views")),
    )
}

fn post_card(t: &Translator<'_>, post: &BlogPost) -> String {
    let href = localized(&format!("/blog/{}", post.slug), t.language());
    let mut card = String::from("<article class=\"post-card\">");
    if let Some(cover) = &post.cover_image {
        card.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            encode_minimal(cover),
            encode_minimal(&post.title)
        ));
    }
    card.push_str(&format!(
        "<p class=\"category\">{}</p><h3><a href=\"{}\">{}</a></h3><p>{}</p>{}",
        encode_minimal(&post.category),
        encode_minimal(&href),
        encode_minimal(&post.title),
        encode_minimal(&truncate_text(&post.excerpt, CARD_EXCERPT_LEN)),
        post_meta(t, post),
    ));
    card.push_str("</article>");
    card
}

fn post_grid<'a>(t: &Translator<'_>, posts: impl IntoIterator<Item = &'a BlogPost>) -> String {
    let mut grid = String::from("<div class=\"post-grid\">");
    for post in posts {
        grid.push_str(&post_card(t, post));
    }
    grid.push_str("</div>");
    grid
}

pub fn home_page(t: &Translator<'_>, config: &SiteConfig, catalog: &PostCatalog) -> Page {
    let language = t.language();
    let mut content = format!(
        "<section class=\"latest-posts\"><h2>{}</h2><p>{}</p>",
        encode_minimal(&t.t("home.latestPosts")),
        encode_minimal(&t.t("home.latestPostsDesc")),
    );
    content.push_str(&post_grid(t, catalog.latest_posts(HOME_LATEST_POSTS)));
    content.push_str(&format!(
        "<a class=\"view-all\" href=\"{}\">{} {}</a></section>",
        encode_minimal(&localized("/blog", language)),
        encode_minimal(&t.t("home.viewAll")),
        Icon::ArrowRight.svg("h-4 w-4"),
    ));

    let head = format!(
        "{}{}",
        seo::script_tag(&seo::website(config)),
        seo::script_tag(&seo::organization(config))
    );
    Page {
        title: config.site_name.clone(),
        language,
        head,
        nav: blog_nav(t, "/"),
        content,
    }
}

pub fn blog_listing_page(
    t: &Translator<'_>,
    config: &SiteConfig,
    catalog: &PostCatalog,
    query: &str,
    category: Option<&str>,
) -> Page {
    let language = t.language();
    let mut content = format!(
        "<section class=\"blog-header\"><h1>{}</h1><p>{}</p>",
        encode_minimal(&t.t("blog.title")),
        encode_minimal(&t.t("blog.subtitle")),
    );

    content.push_str(&format!(
        "<form class=\"blog-search\" method=\"get\" action=\"/blog\">\
         <input type=\"hidden\" name=\"lang\" value=\"{}\">\
         <label>{}<input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"{}\"></label>\
         <select name=\"category\"><option value=\"\">{}</option>",
        language.code(),
        Icon::Search.svg("h-4 w-4"),
        encode_minimal(query),
        encode_minimal(&t.t("blog.search")),
        encode_minimal(&t.t("blog.allCategories")),
    ));
    for name in &config.categories {
        let selected = if category == Some(name.as_str()) {
            " selected"
        } else {
            ""
        };
        content.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            encode_minimal(name),
            encode_minimal(name)
        ));
    }
    content.push_str(&format!(
        "</select><button type=\"submit\">{}</button></form></section>",
        encode_minimal(&t.t("blog.filter"))
    ));

    let tags = catalog.all_tags();
    if !tags.is_empty() {
        content.push_str("<ul class=\"tag-cloud\">");
        for tag in tags {
            content.push_str(&format!(
                "<li><a href=\"{}\">#{}</a></li>",
                encode_minimal(&localized(&listing_path(tag, None), language)),
                encode_minimal(tag)
            ));
        }
        content.push_str("</ul>");
    }

    let results = catalog.search_posts(query, category);
    if results.is_empty() {
        content.push_str(&format!(
            "<p class=\"no-results\">{}</p>",
            encode_minimal(&t.t("blog.noResults"))
        ));
    } else {
        content.push_str(&post_grid(t, results));
    }

    Page {
        title: format!("{} | {}", t.t("blog.title"), config.site_name),
        language,
        head: String::new(),
        nav: blog_nav(t, &listing_path(query, category)),
        content,
    }
}

pub fn post_page(
    t: &Translator<'_>,
    config: &SiteConfig,
    post: &BlogPost,
    related: &[&BlogPost],
) -> Page {
    let language = t.language();
    let mut content = format!(
        "<a class=\"back-link\" href=\"{}\">{} {}</a><article class=\"post\"><header>",
        encode_minimal(&localized("/blog", language)),
        Icon::ArrowLeft.svg("h-4 w-4"),
        encode_minimal(&t.t("post.backToBlog")),
    );
    if let Some(cover) = &post.cover_image {
        content.push_str(&format!(
            "<img class=\"cover\" src=\"{}\" alt=\"{}\">",
            encode_minimal(cover),
            encode_minimal(&post.title)
        ));
    }
    content.push_str(&post_meta(t, post));
    content.push_str(&format!(
        "<h1>{}</h1><p class=\"excerpt\">{}</p>",
        encode_minimal(&post.title),
        encode_minimal(&post.excerpt)
    ));
    if !post.tags.is_empty() {
        content.push_str("<ul class=\"tags\">");
        for tag in &post.tags {
            content.push_str(&format!("<li>{}</li>", encode_minimal(tag)));
        }
        content.push_str("</ul>");
    }
    if !post.author.name.is_empty() {
        content.push_str("<div class=\"author\">");
        if !post.author.avatar.is_empty() {
            content.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" width=\"48\" height=\"48\">",
                encode_minimal(&post.author.avatar),
                encode_minimal(&post.author.name)
            ));
        }
        content.push_str(&format!(
            "<p class=\"name\">{}</p><p class=\"bio\">{}</p></div>",
            encode_minimal(&post.author.name),
            encode_minimal(&post.author.bio)
        ));
    }
    content.push_str("</header><div class=\"prose\">");
    content.push_str(&convert_markdown_to_html(&post.content));
    content.push_str("</div></article>");

    if !related.is_empty() {
        content.push_str(&format!(
            "<section class=\"related-posts\"><h2>{}</h2>",
            encode_minimal(&t.t("post.relatedPosts"))
        ));
        content.push_str(&post_grid(t, related.iter().copied()));
        content.push_str("</section>");
    }

    let base = config.base_url();
    let crumbs = [
        Crumb {
            name: "Blog",
            url: format!("{base}/blog"),
        },
        Crumb {
            name: &post.title,
            url: format!("{base}/blog/{}", post.slug),
        },
    ];
    let head = format!(
        "<meta name=\"description\" content=\"{}\">{}{}",
        encode_minimal(&post.excerpt),
        seo::script_tag(&seo::blog_posting(config, post)),
        seo::script_tag(&seo::breadcrumbs(&crumbs)),
    );

    Page {
        title: format!("{} | {}", post.title, config.site_name),
        language,
        head,
        nav: blog_nav(t, &format!("/blog/{}", post.slug)),
        content,
    }
}

fn sidebar_html(items: &[SidebarItem], current_path: &str, language: Language) -> String {
    let mut html = String::from("<ul>");
    for item in items {
        match item {
            SidebarItem::Link { label, href } => {
                let active = if href == current_path {
                    " class=\"active\" aria-current=\"page\""
                } else {
                    ""
                };
                html.push_str(&format!(
                    "<li><a href=\"{}\"{active}>{}</a></li>",
                    encode_minimal(&localized(href, language)),
                    encode_minimal(label)
                ));
            }
            SidebarItem::Category { label, items, .. } => {
                let open = if item.is_open(current_path) { " open" } else { "" };
                html.push_str(&format!(
                    "<li><details{open}><summary>{}</summary>{}</details></li>",
                    encode_minimal(label),
                    sidebar_html(items, current_path, language)
                ));
            }
        }
    }
    html.push_str("</ul>");
    html
}

fn breadcrumbs_html(items: &[(String, Option<String>)]) -> String {
    let mut html = format!(
        "<nav class=\"breadcrumbs\" aria-label=\"Breadcrumb\"><ol><li><a href=\"/\" aria-label=\"Home\">{}</a></li>",
        Icon::Home.svg("h-4 w-4")
    );
    for (index, (label, href)) in items.iter().enumerate() {
        let is_last = index + 1 == items.len();
        html.push_str("<li>");
        html.push_str(&Icon::ChevronRight.svg("h-4 w-4"));
        match href {
            Some(href) if !is_last => html.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                encode_minimal(href),
                encode_minimal(label)
            )),
            _ => {
                let current = if is_last { " aria-current=\"page\"" } else { "" };
                html.push_str(&format!("<span{current}>{}</span>", encode_minimal(label)));
            }
        }
        html.push_str("</li>");
    }
    html.push_str("</ol></nav>");
    html
}

fn toc_html(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut html = String::from("<nav class=\"toc\"><ul>");
    for heading in headings {
        html.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            heading.level,
            encode_minimal(&heading.id),
            encode_minimal(&heading.text)
        ));
    }
    html.push_str("</ul></nav>");
    html
}

fn doc_pager(docs: &[Doc], slug: &str, language: Language) -> String {
    let Some(index) = docs.iter().position(|d| d.slug == slug) else {
        return String::new();
    };
    let link = |doc: &Doc, class: &str, icon: Icon| {
        let label = doc.sidebar_label.as_deref().unwrap_or(&doc.title);
        let label = encode_minimal(label);
        let href = encode_minimal(&localized(&format!("/docs/{}", doc.slug), language));
        match icon {
            Icon::ArrowLeft => format!(
                "<a class=\"{class}\" href=\"{href}\">{} {label}</a>",
                icon.svg("h-4 w-4")
            ),
            _ => format!(
                "<a class=\"{class}\" href=\"{href}\">{label} {}</a>",
                icon.svg("h-4 w-4")
            ),
        }
    };

    let mut html = String::from("<nav class=\"doc-pager\">");
    if let Some(prev) = index.checked_sub(1).and_then(|i| docs.get(i)) {
        html.push_str(&link(prev, "prev", Icon::ArrowLeft));
    }
    if let Some(next) = docs.get(index + 1) {
        html.push_str(&link(next, "next", Icon::ArrowRight));
    }
    html.push_str("</nav>");
    html
}

/// `siblings` is every doc in reading order, used for the prev/next links.
pub fn doc_page(
    t: &Translator<'_>,
    config: &SiteConfig,
    doc: &Doc,
    rendered: &RenderedDoc,
    siblings: &[Doc],
) -> Page {
    let language = t.language();
    let path = format!("/docs/{}", doc.slug);

    let mut crumbs: Vec<(String, Option<String>)> =
        vec![(t.t_or("nav.docs", Some("Docs")), Some(localized("/docs", language)))];
    crumbs.extend(trail_to(&config.sidebar, &path).into_iter().map(|c| (c, None)));
    crumbs.push((doc.title.clone(), None));

    let mut content = format!(
        "<div class=\"docs\"><aside class=\"docs-sidebar\">{}</aside><article class=\"doc\">{}<header><h1>{}</h1>",
        sidebar_html(&config.sidebar, &path, language),
        breadcrumbs_html(&crumbs),
        encode_minimal(&doc.title),
    );
    if !doc.description.is_empty() {
        content.push_str(&format!(
            "<p class=\"description\">{}</p>",
            encode_minimal(&doc.description)
        ));
    }
    content.push_str("<hr></header><div class=\"prose\">");
    content.push_str(&rendered.html);
    content.push_str("</div>");
    content.push_str(&doc_pager(siblings, &doc.slug, language));
    content.push_str("</article>");
    content.push_str(&toc_html(&rendered.headings));
    content.push_str("</div>");

    let description = if doc.description.is_empty() {
        format!("Learn about {}", doc.title)
    } else {
        doc.description.clone()
    };
    let head = format!(
        "<meta name=\"description\" content=\"{}\"><link rel=\"canonical\" href=\"{}\">{}",
        encode_minimal(&description),
        encode_minimal(&format!("{}{path}", config.base_url())),
        seo::script_tag(&seo::tech_article(config, doc)),
    );

    Page {
        title: format!("{} | Documentation", doc.title),
        language,
        head,
        nav: blog_nav(t, &path),
        content,
    }
}

pub fn not_found_page(templates: &Templates, t: &Translator<'_>, nav: String, path: &str) -> Page {
    Page {
        title: "Page Not Found".to_string(),
        language: t.language(),
        head: String::new(),
        nav,
        content: templates
            .not_found_html
            .replace("{{ path }}", &encode_minimal(path)),
    }
}

/// Landing page of the master zone; every section's copy comes from the
/// `master.*` dictionary keys.
pub fn master_landing_page(t: &Translator<'_>, config: &SiteConfig) -> Page {
    let text = |key: &str| encode_minimal(&t.t(key));
    let mut content = format!(
        "<section class=\"hero\"><h1>{}</h1><p>{}</p></section>\
         <section class=\"manifesto\"><h2>{}</h2><p>{}</p></section>",
        text("master.hero.title"),
        text("master.hero.subtitle"),
        text("master.manifesto.title"),
        text("master.manifesto.body"),
    );

    content.push_str(&format!(
        "<section class=\"zones\"><h2>{}</h2><div class=\"zone-cards\">\
         <a class=\"zone-card\" href=\"/blog\"><h3>{}</h3><p>{}</p></a></div></section>",
        text("master.zones.title"),
        text("master.zones.blog.title"),
        text("master.zones.blog.desc"),
    ));
    content.push_str(&format!(
        "<section class=\"about\"><h2>{}</h2><p>{}</p></section>",
        text("master.about.title"),
        text("master.about.body"),
    ));

    Page {
        title: format!("{} | {}", t.t("master.hero.title"), config.site_name),
        language: t.language(),
        head: seo::script_tag(&seo::organization(config)),
        nav: master_nav(t),
        content,
    }
}
