//! Standalone HTML page surface.

use std::fmt::Write;

use mmv_renderer::{BlockKind, escape_html};
use mmv_viewer::{Branding, ElementId, RenderSurface, RenderedDocument, TableOfContents, Theme};

/// What the content region holds.
#[derive(Debug, Default)]
enum PageContent {
    #[default]
    Empty,
    Loading,
    Error(String),
    Document { title: String, html: String },
}

#[derive(Debug)]
struct TocLine {
    level: u8,
    id: String,
    text: String,
}

/// Surface that collects the shell's state and renders it as one page.
///
/// A static page cannot scroll or highlight, so those calls are ignored.
#[derive(Debug, Default)]
pub(crate) struct HtmlPageSurface {
    branding: Option<Branding>,
    theme: Theme,
    drawer_open: bool,
    index: Vec<String>,
    content: PageContent,
    toc: Vec<TocLine>,
    active: Option<String>,
    fragment: Option<String>,
}

impl HtmlPageSurface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Render the complete page.
    pub(crate) fn render_page(&self) -> String {
        let mut html = String::with_capacity(8192);
        let company = self
            .branding
            .as_ref()
            .map_or("", |branding| branding.company_name.as_str());
        let title = match &self.content {
            PageContent::Document { title, .. } => title.as_str(),
            _ => company,
        };

        html.push_str("<!DOCTYPE html>\n");
        let _ = writeln!(
            html,
            "<html lang=\"en\" data-theme=\"{}\">",
            self.theme.as_str()
        );
        html.push_str("<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(html, "<title>{}</title>", escape_html(title));
        html.push_str("</head>\n");
        match &self.fragment {
            Some(fragment) => {
                let _ = writeln!(html, "<body data-fragment=\"{}\">", escape_html(fragment));
            }
            None => html.push_str("<body>\n"),
        }

        self.render_header(&mut html);
        self.render_drawer(&mut html);

        html.push_str("<div class=\"layout\">\n<main>\n<article class=\"content\">\n");
        match &self.content {
            PageContent::Empty => {}
            PageContent::Loading => html.push_str("<p class=\"loading\">Loading…</p>"),
            PageContent::Error(message) => {
                let _ = write!(html, "<div class=\"error\">{}</div>", escape_html(message));
            }
            PageContent::Document { html: body, .. } => html.push_str(body),
        }
        html.push_str("\n</article>\n</main>\n");
        self.render_toc(&mut html);
        html.push_str("</div>\n");

        if let Some(branding) = &self.branding {
            let _ = writeln!(html, "<footer>{}</footer>", escape_html(&branding.footer()));
        }
        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_header(&self, html: &mut String) {
        let Some(branding) = &self.branding else {
            return;
        };
        html.push_str("<header>\n");
        let _ = writeln!(
            html,
            "<img class=\"company-logo\" src=\"{}\" alt=\"{}\">",
            escape_html(&branding.company_logo),
            escape_html(&branding.company_name)
        );
        let _ = writeln!(
            html,
            "<span class=\"company-name\">{}</span>",
            escape_html(&branding.company_name)
        );
        let _ = writeln!(
            html,
            "<img class=\"partner-logo\" src=\"{}\" alt=\"Partner\">",
            escape_html(&branding.partner_logo)
        );
        html.push_str("</header>\n");
    }

    fn render_drawer(&self, html: &mut String) {
        let state = if self.drawer_open { "open" } else { "closed" };
        let _ = writeln!(html, "<aside class=\"drawer\" data-state=\"{state}\">");
        html.push_str("<nav>\n<ul>\n");
        for (i, label) in self.index.iter().enumerate() {
            let _ = writeln!(
                html,
                "<li><button type=\"button\" data-index=\"{i}\">{}</button></li>",
                escape_html(label)
            );
        }
        html.push_str("</ul>\n</nav>\n</aside>\n");
    }

    fn render_toc(&self, html: &mut String) {
        if self.toc.is_empty() {
            return;
        }
        html.push_str("<aside class=\"toc\">\n<h3>On this page</h3>\n<ul>\n");
        for line in &self.toc {
            let active = if self.active.as_deref() == Some(line.id.as_str()) {
                " active"
            } else {
                ""
            };
            let _ = writeln!(
                html,
                "<li class=\"toc-level-{}{active}\"><a href=\"#{}\">{}</a></li>",
                line.level,
                escape_html(&line.id),
                escape_html(&line.text)
            );
        }
        html.push_str("</ul>\n</aside>\n");
    }
}

impl RenderSurface for HtmlPageSurface {
    fn show_branding(&mut self, branding: &Branding) {
        self.branding = Some(branding.clone());
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn set_drawer_open(&mut self, open: bool) {
        self.drawer_open = open;
    }

    fn show_index(&mut self, labels: &[String]) {
        self.index = labels.to_vec();
    }

    fn show_loading(&mut self) {
        self.content = PageContent::Loading;
    }

    fn show_error(&mut self, message: &str) {
        self.content = PageContent::Error(message.to_owned());
    }

    fn show_document(&mut self, document: &RenderedDocument) {
        self.content = PageContent::Document {
            title: document.display_title().to_owned(),
            html: document.html.clone(),
        };
    }

    fn show_toc(&mut self, toc: &TableOfContents) {
        self.toc = toc
            .entries()
            .iter()
            .map(|entry| TocLine {
                level: entry.level,
                id: entry.id.clone(),
                text: entry.text.clone(),
            })
            .collect();
    }

    fn mark_active(&mut self, id: Option<&str>) {
        self.active = id.map(str::to_owned);
    }

    fn set_highlights(&mut self, _elements: &[ElementId]) {}

    fn scroll_to(&mut self, _element: ElementId) {}

    fn scroll_to_top(&mut self) {}

    fn heading_offsets(&self, document: &RenderedDocument) -> Vec<(String, f64)> {
        // Without layout, element order stands in for position.
        document
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block.kind, BlockKind::Heading(_)))
            .filter_map(|(index, block)| {
                let position = u32::try_from(index).ok()?;
                Some((block.id.clone()?, f64::from(position)))
            })
            .collect()
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_owned());
    }
}
