use serde::Deserialize;

/// One node of the docs navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SidebarItem {
    Link {
        label: String,
        href: String,
    },
    Category {
        label: String,
        #[serde(default)]
        items: Vec<SidebarItem>,
        #[serde(default)]
        collapsed: bool,
    },
}

impl SidebarItem {
    pub fn label(&self) -> &str {
        match self {
            SidebarItem::Link { label, .. } | SidebarItem::Category { label, .. } => label,
        }
    }

    /// True when this item, or anything below it, links to `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        match self {
            SidebarItem::Link { href, .. } => href == path,
            SidebarItem::Category { items, .. } => items.iter().any(|i| i.contains_path(path)),
        }
    }

    /// Categories start open unless collapsed, and are always open when
    /// they hold the current page.
    pub fn is_open(&self, path: &str) -> bool {
        match self {
            SidebarItem::Link { .. } => false,
            SidebarItem::Category { collapsed, .. } => !collapsed || self.contains_path(path),
        }
    }
}

pub fn default_sidebar() -> Vec<SidebarItem> {
    vec![
        SidebarItem::Category {
            label: "Get Started".into(),
            collapsed: false,
            items: vec![SidebarItem::Link {
                label: "Introduction".into(),
                href: "/docs/intro".into(),
            }],
        },
        SidebarItem::Category {
            label: "TanStack".into(),
            collapsed: false,
            items: vec![SidebarItem::Link {
                label: "TanStack Query".into(),
                href: "/docs/tanstack-query".into(),
            }],
        },
    ]
}

/// Category labels leading to `path`, outermost first.
pub fn trail_to(items: &[SidebarItem], path: &str) -> Vec<String> {
    for item in items {
        if let SidebarItem::Category { items, .. } = item {
            if item.contains_path(path) {
                let mut trail = vec![item.label().to_string()];
                trail.extend(trail_to(items, path));
                return trail;
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapsed_tree() -> Vec<SidebarItem> {
        vec![SidebarItem::Category {
            label: "Guides".into(),
            collapsed: true,
            items: vec![
                SidebarItem::Link {
                    label: "Setup".into(),
                    href: "/docs/setup".into(),
                },
                SidebarItem::Category {
                    label: "Deep".into(),
                    collapsed: true,
                    items: vec![SidebarItem::Link {
                        label: "Cache".into(),
                        href: "/docs/cache".into(),
                    }],
                },
            ],
        }]
    }

    #[test]
    fn collapsed_category_opens_for_active_child() {
        let tree = collapsed_tree();
        assert!(!tree[0].is_open("/docs/intro"));
        assert!(tree[0].is_open("/docs/setup"));
        assert!(tree[0].is_open("/docs/cache"));
    }

    #[test]
    fn expanded_category_is_open() {
        assert!(default_sidebar()[0].is_open("/docs/anything"));
    }

    #[test]
    fn trail_follows_nested_categories() {
        let tree = collapsed_tree();
        assert_eq!(trail_to(&tree, "/docs/cache"), vec!["Guides", "Deep"]);
        assert!(trail_to(&tree, "/docs/missing").is_empty());
    }

    #[test]
    fn deserializes_tagged_items() {
        let item: SidebarItem = toml::from_str(
            r#"
type = "category"
label = "API"
items = [{ type = "link", label = "Query", href = "/docs/query" }]
"#,
        )
        .unwrap();
        assert_eq!(item.label(), "API");
        assert!(item.contains_path("/docs/query"));
        assert!(item.is_open("/"));
    }
}
