//! The closed set of inline SVG icons pages may use.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    ArrowLeft,
    ArrowRight,
    Calendar,
    ChevronRight,
    Clock,
    Eye,
    Home,
    Languages,
    Search,
}

impl Icon {
    /// Stroke path on a 24x24 grid.
    pub fn path(self) -> &'static str {
        match self {
            Icon::ArrowLeft => "M19 12H5M12 19l-7-7 7-7",
            Icon::ArrowRight => "M5 12h14M12 5l7 7-7 7",
            Icon::Calendar => "M8 2v4M16 2v4M3 10h18M5 4h14a2 2 0 0 1 2 2v14a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V6a2 2 0 0 1 2-2z",
            Icon::ChevronRight => "M9 18l6-6-6-6",
            Icon::Clock => "M12 2a10 10 0 1 0 0 20 10 10 0 0 0 0-20zM12 6v6l4 2",
            Icon::Eye => "M2 12s3.5-7 10-7 10 7 10 7-3.5 7-10 7S2 12 2 12zM12 9a3 3 0 1 0 0 6 3 3 0 0 0 0-6z",
            Icon::Home => "M3 10l9-7 9 7v11a1 1 0 0 1-1 1h-5v-7H9v7H4a1 1 0 0 1-1-1z",
            Icon::Languages => "M5 8l6 6M4 14l6-6 2-3M2 5h12M7 2h1M22 22l-5-10-5 10M14 18h6",
            Icon::Search => "M11 3a8 8 0 1 0 0 16 8 8 0 0 0 0-16zM21 21l-4.35-4.35",
        }
    }

    /// Inline `<svg>` markup, hidden from assistive technology.
    pub fn svg(self, class: &str) -> String {
        format!(
            "<svg class=\"icon {class}\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\" \
             stroke-width=\"2\" stroke-linecap=\"round\" stroke-linejoin=\"round\" aria-hidden=\"true\">\
             <path d=\"{}\"/></svg>",
            self.path()
        )
    }
}
