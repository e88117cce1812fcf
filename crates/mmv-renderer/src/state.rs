//! Shared state structs for markdown rendering.
//!
//! These structs track context during event processing: code blocks, tables,
//! image alt text, headings, the text-bearing block table and captured links.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the alignment style for the current cell.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
    pending: Option<(String, String)>,
}

impl ImageState {
    /// Start capturing alt text for an image with the given source and title.
    pub(crate) fn start(&mut self, src: String, title: String) {
        self.active = true;
        self.alt_text.clear();
        self.pending = Some((src, title));
    }

    /// End image capture and return (src, title, alt).
    pub(crate) fn end(&mut self) -> Option<(String, String, String)> {
        self.active = false;
        let alt = std::mem::take(&mut self.alt_text);
        self.pending.take().map(|(src, title)| (src, title, alt))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// State for tracking headings, their identifiers and title extraction.
pub(crate) struct HeadingState {
    extract_title: bool,
    title: Option<String>,
    current_level: Option<u8>,
    explicit_id: Option<String>,
    text: String,
    html: String,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            title: None,
            current_level: None,
            explicit_id: None,
            text: String::new(),
            html: String::new(),
            id_counts: HashMap::new(),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    /// Start tracking a heading. `explicit_id` comes from `{#id}` attributes.
    pub(crate) fn start_heading(&mut self, level: u8, explicit_id: Option<String>) {
        self.current_level = Some(level);
        self.explicit_id = explicit_id.filter(|id| !id.is_empty());
        self.text.clear();
        self.html.clear();
    }

    /// Complete the heading. Returns (level, id, text, html).
    pub(crate) fn complete_heading(&mut self) -> Option<(u8, String, String, String)> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);

        let id = match self.explicit_id.take() {
            Some(id) => {
                *self.id_counts.entry(id.clone()).or_default() += 1;
                id
            }
            None => self.generate_id(&text),
        };

        if self.extract_title && level == 1 && self.title.is_none() {
            self.title = Some(text.trim().to_owned());
        }

        Some((level, id, text, html))
    }

    /// Generate a unique ID for a heading.
    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id = "section".to_owned();
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn html_buffer(&mut self) -> &mut String {
        &mut self.html
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }
}

/// Kind of a text-bearing block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Heading with its level (1-6).
    Heading(u8),
    Paragraph,
    ListItem,
}

/// A text-bearing element of a rendered document.
///
/// Blocks are listed in document order (an enclosing block precedes the
/// blocks nested in it). `text` is the flattened plain text of the element,
/// including the text of nested blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
    /// The element's own identifier (headings).
    pub id: Option<String>,
    /// Identifier of the nearest enclosing identified container.
    pub anchor: Option<String>,
}

/// Captures text-bearing blocks while events are processed.
#[derive(Default)]
pub(crate) struct BlockCapture {
    blocks: Vec<TextBlock>,
    open: Vec<usize>,
    containers: Vec<String>,
}

impl BlockCapture {
    /// Open a new block nested in all currently open ones.
    pub(crate) fn open(&mut self, kind: BlockKind) {
        self.push_space();
        self.open.push(self.blocks.len());
        self.blocks.push(TextBlock {
            kind,
            text: String::new(),
            id: None,
            anchor: self.containers.last().cloned(),
        });
    }

    /// Close the innermost open block and return it for final touches.
    pub(crate) fn close(&mut self) -> Option<&mut TextBlock> {
        let index = self.open.pop()?;
        let block = self.blocks.get_mut(index)?;
        let trimmed = block.text.trim();
        if trimmed.len() != block.text.len() {
            block.text = trimmed.to_owned();
        }
        Some(block)
    }

    /// Append text to every open block.
    pub(crate) fn push_text(&mut self, text: &str) {
        for &index in &self.open {
            self.blocks[index].text.push_str(text);
        }
    }

    /// Separate words in every open block.
    pub(crate) fn push_space(&mut self) {
        for &index in &self.open {
            let text = &mut self.blocks[index].text;
            if !text.is_empty() && !text.ends_with(' ') {
                text.push(' ');
            }
        }
    }

    /// Enter an identified container (footnote definition).
    pub(crate) fn enter_container(&mut self, id: String) {
        self.containers.push(id);
    }

    pub(crate) fn leave_container(&mut self) {
        self.containers.pop();
    }

    pub(crate) fn finish(&mut self) -> Vec<TextBlock> {
        self.open.clear();
        self.containers.clear();
        std::mem::take(&mut self.blocks)
    }
}

/// An anchor in rendered output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedLink {
    /// Target after the URL policy was applied.
    pub href: String,
    /// Plain text of the anchor.
    pub text: String,
}

/// Captures anchors and their text.
#[derive(Default)]
pub(crate) struct LinkCapture {
    links: Vec<RenderedLink>,
    open: Vec<Option<usize>>,
}

impl LinkCapture {
    /// Open an anchor. Anchors without an allowed href are not recorded.
    pub(crate) fn open(&mut self, href: Option<&str>) {
        let slot = href.map(|href| {
            self.links.push(RenderedLink {
                href: href.to_owned(),
                text: String::new(),
            });
            self.links.len() - 1
        });
        self.open.push(slot);
    }

    pub(crate) fn close(&mut self) {
        if let Some(Some(index)) = self.open.pop() {
            let link = &mut self.links[index];
            let trimmed = link.text.trim();
            if trimmed.len() != link.text.len() {
                link.text = trimmed.to_owned();
            }
        }
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        for index in self.open.iter().flatten() {
            self.links[*index].text.push_str(text);
        }
    }

    pub(crate) fn finish(&mut self) -> Vec<RenderedLink> {
        self.open.clear();
        std::mem::take(&mut self.links)
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
