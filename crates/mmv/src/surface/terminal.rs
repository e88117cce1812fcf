//! Interactive terminal surface.
//!
//! Documents are shown as numbered lines; the line numbers double as the
//! vertical offsets the scroll-spy works with.

use console::{Style, Term};
use mmv_renderer::{BlockKind, TextBlock};
use mmv_viewer::{Branding, ElementId, RenderSurface, RenderedDocument, TableOfContents, Theme};

/// Fallback width when stdout is not a terminal.
const DEFAULT_WIDTH: usize = 80;

/// Width of the line-number gutter, including the separator.
const GUTTER: usize = 6;

/// A document laid out as terminal lines.
#[derive(Debug, Default)]
pub(crate) struct TextLayout {
    /// Shown lines with the element they belong to.
    pub(crate) lines: Vec<(ElementId, String)>,
    /// First line of every element. Elements nested in a list item share
    /// the item's line.
    pub(crate) starts: Vec<usize>,
}

impl TextLayout {
    pub(crate) fn new(elements: &[TextBlock], width: usize) -> Self {
        let mut layout = Self::default();
        // Enclosing list item: its element index, text and how far nested
        // blocks have consumed it.
        let mut container: Option<(usize, &str, usize)> = None;

        for (index, block) in elements.iter().enumerate() {
            if let Some((owner, text, cursor)) = container.as_mut()
                && !matches!(block.kind, BlockKind::Heading(_))
                && let Some(pos) = text[*cursor..].find(block.text.as_str())
            {
                *cursor += pos + block.text.len();
                layout.starts.push(layout.starts[*owner]);
                continue;
            }

            layout.starts.push(layout.lines.len());
            let prefixed = match block.kind {
                BlockKind::Heading(level) => {
                    format!("{} {}", "#".repeat(usize::from(level)), block.text)
                }
                BlockKind::ListItem => format!("• {}", block.text),
                BlockKind::Paragraph => block.text.clone(),
            };
            for line in wrap(&prefixed, width) {
                layout.lines.push((ElementId(index), line));
            }

            if block.kind == BlockKind::ListItem {
                container = Some((index, block.text.as_str(), 0));
            } else {
                container = None;
                layout.lines.push((ElementId(index), String::new()));
            }
        }
        layout
    }

    /// First line of `element`.
    pub(crate) fn line_of(&self, element: ElementId) -> Option<usize> {
        self.starts.get(element.0).copied()
    }
}

/// Greedy word wrap on character counts.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current_len > 0 && current_len + 1 + len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += len;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Palette {
    heading: Style,
    title: Style,
    highlight: Style,
    error: Style,
    active: Style,
    dim: Style,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        let (heading, active) = match theme {
            Theme::Light => (Style::new().blue().bold(), Style::new().blue()),
            Theme::Dark => (Style::new().cyan().bold(), Style::new().cyan()),
        };
        Self {
            heading,
            title: Style::new().bold().underlined(),
            highlight: Style::new().black().on_yellow(),
            error: Style::new().red(),
            active,
            dim: Style::new().dim(),
        }
    }
}

/// Surface printing to stdout.
pub(crate) struct TerminalSurface {
    term: Term,
    palette: Palette,
    width: usize,
    layout: TextLayout,
    index: Vec<String>,
    highlighted: bool,
    footer: Option<String>,
}

impl TerminalSurface {
    pub(crate) fn new() -> Self {
        let term = Term::stdout();
        let width = if term.is_term() {
            usize::from(term.size().1)
        } else {
            DEFAULT_WIDTH
        };
        Self {
            term,
            palette: Palette::for_theme(Theme::default()),
            width: width.saturating_sub(GUTTER).max(20),
            layout: TextLayout::default(),
            index: Vec::new(),
            highlighted: false,
            footer: None,
        }
    }

    /// Visible rows, used as the viewport height.
    pub(crate) fn rows(&self) -> u16 {
        if self.term.is_term() {
            self.term.size().0
        } else {
            24
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn numbered(&self, number: usize, text: &str, style: Option<&Style>) {
        let gutter = self.palette.dim.apply_to(format!("{:>4} │", number + 1));
        match style {
            Some(style) => self.line(&format!("{gutter} {}", style.apply_to(text))),
            None => self.line(&format!("{gutter} {text}")),
        }
    }

    fn print_index(&self) {
        self.line(&self.palette.title.apply_to("Manuals").to_string());
        for (i, label) in self.index.iter().enumerate() {
            self.line(&format!("  {:>2}. {label}", i + 1));
        }
    }
}

impl RenderSurface for TerminalSurface {
    fn show_branding(&mut self, branding: &Branding) {
        let name = self.palette.title.apply_to(&branding.company_name);
        self.line(&name.to_string());
        let logos = format!(
            "logos: {} | {}",
            branding.company_logo, branding.partner_logo
        );
        self.line(&self.palette.dim.apply_to(logos).to_string());
        self.footer = Some(branding.footer());
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
        let label = format!("Theme: {}", theme.as_str());
        self.line(&self.palette.dim.apply_to(label).to_string());
    }

    fn set_drawer_open(&mut self, open: bool) {
        if open {
            self.print_index();
        } else {
            self.line(&self.palette.dim.apply_to("Menu closed").to_string());
        }
    }

    fn show_index(&mut self, labels: &[String]) {
        self.index = labels.to_vec();
        self.print_index();
    }

    fn show_loading(&mut self) {
        self.line(&self.palette.dim.apply_to("Loading…").to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.line(&self.palette.error.apply_to(message).to_string());
    }

    fn show_document(&mut self, document: &RenderedDocument) {
        self.layout = TextLayout::new(document.elements(), self.width);
        self.highlighted = false;

        self.line("");
        self.line(&self.palette.title.apply_to(document.display_title()).to_string());
        self.line(&self.palette.dim.apply_to(&document.source_url).to_string());
        self.line("");
        for (number, (element, text)) in self.layout.lines.iter().enumerate() {
            let heading = document
                .element(*element)
                .is_some_and(|block| matches!(block.kind, BlockKind::Heading(_)));
            self.numbered(number, text, heading.then_some(&self.palette.heading));
        }
        if let Some(footer) = &self.footer {
            self.line(&self.palette.dim.apply_to(footer).to_string());
        }
    }

    fn show_toc(&mut self, toc: &TableOfContents) {
        if toc.is_empty() {
            return;
        }
        self.line(&self.palette.title.apply_to("On this page").to_string());
        for entry in toc.entries() {
            self.line(&format!(
                "  {}{} {}",
                "  ".repeat(entry.indent()),
                entry.text,
                self.palette.dim.apply_to(format!("#{}", entry.id))
            ));
        }
    }

    fn mark_active(&mut self, id: Option<&str>) {
        if let Some(id) = id {
            self.line(&self.palette.active.apply_to(format!("§ {id}")).to_string());
        }
    }

    fn set_highlights(&mut self, elements: &[ElementId]) {
        if elements.is_empty() {
            if self.highlighted {
                self.line(&self.palette.dim.apply_to("Highlights cleared").to_string());
            }
            self.highlighted = false;
            return;
        }
        self.highlighted = true;
        for element in elements {
            let Some(start) = self.layout.line_of(*element) else {
                continue;
            };
            if let Some((_, text)) = self.layout.lines.get(start) {
                self.numbered(start, text, Some(&self.palette.highlight));
            }
        }
    }

    fn scroll_to(&mut self, element: ElementId) {
        if let Some(line) = self.layout.line_of(element) {
            let marker = format!("→ line {}", line + 1);
            self.line(&self.palette.active.apply_to(marker).to_string());
        }
    }

    fn scroll_to_top(&mut self) {
        self.line(&self.palette.dim.apply_to("↑ top").to_string());
    }

    fn heading_offsets(&self, document: &RenderedDocument) -> Vec<(String, f64)> {
        let layout = TextLayout::new(document.elements(), self.width);
        document
            .elements()
            .iter()
            .zip(&layout.starts)
            .filter(|(block, _)| matches!(block.kind, BlockKind::Heading(_)))
            .filter_map(|(block, start)| {
                let line = u32::try_from(*start).ok()?;
                Some((block.id.clone()?, f64::from(line)))
            })
            .collect()
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.line(&self.palette.dim.apply_to(fragment).to_string());
    }
}
