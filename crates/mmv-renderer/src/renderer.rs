//! Generic markdown renderer with pluggable backend.

use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::backend::{AlertKind, RenderBackend};
use crate::sanitize::{Sanitizer, safe_url};
use crate::state::{
    BlockCapture, BlockKind, CodeBlockState, HeadingState, ImageState, LinkCapture, RenderedLink,
    TableState, TextBlock, escape_html,
};
use crate::util::{footnote_id, heading_level_to_num};

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered, sanitized HTML content.
    pub html: String,
    /// Title extracted from first H1 heading (if title extraction was enabled).
    pub title: Option<String>,
    /// Text-bearing elements in document order.
    pub blocks: Vec<TextBlock>,
    /// Rendered anchors with an allowed target, in document order.
    pub links: Vec<RenderedLink>,
}

impl RenderResult {
    /// Headings as (level, id, text), in document order.
    pub fn headings(&self) -> impl Iterator<Item = (u8, &str, &str)> {
        self.blocks.iter().filter_map(|block| match block.kind {
            BlockKind::Heading(level) => Some((
                level,
                block.id.as_deref().unwrap_or_default(),
                block.text.as_str(),
            )),
            _ => None,
        })
    }
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate format-specific rendering
/// while handling common elements (tables, lists, inline formatting) generically.
/// Raw HTML is passed through a [`Sanitizer`] and link/image targets through
/// [`safe_url`].
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    blocks: BlockCapture,
    links: LinkCapture,
    sanitizer: Sanitizer,
    html_block: Option<String>,
    gfm: bool,
    breaks: bool,
    /// Stack of alert kinds for nested blockquotes (regular blockquote uses None).
    alert_stack: Vec<Option<AlertKind>>,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a new renderer with GFM enabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            blocks: BlockCapture::default(),
            links: LinkCapture::default(),
            sanitizer: Sanitizer::new(),
            html_block: None,
            gfm: true,
            breaks: false,
            alert_stack: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Enable title extraction from first H1 heading.
    ///
    /// The heading is still rendered.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Footnotes and alerts (`> [!NOTE]`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Render soft line breaks as hard breaks.
    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    ///
    /// Explicit heading identifiers (`# Title {#id}`) are always enabled.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            blocks: self.blocks.finish(),
            links: self.links.finish(),
        }
    }

    /// Buffer receiving inline content: the heading being built, or the output.
    fn inline_buffer(&mut self) -> &mut String {
        if self.heading.is_active() {
            self.heading.html_buffer()
        } else {
            &mut self.output
        }
    }

    fn push_inline(&mut self, content: &str) {
        self.inline_buffer().push_str(content);
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.block_html(&html),
            Event::InlineHtml(html) => self.inline_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(label) => {
                let id = footnote_id(&label);
                B::footnote_reference(&label, &id, self.inline_buffer());
            }
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.output.push_str("<p>");
                self.blocks.open(BlockKind::Paragraph);
            }
            Tag::Heading { level, id, .. } => {
                // Opening tag is written in end_tag once the ID is known.
                let level = heading_level_to_num(level);
                self.heading
                    .start_heading(level, id.map(CowStr::into_string));
                self.blocks.open(BlockKind::Heading(level));
            }
            Tag::BlockQuote(kind) => {
                if let Some(bq_kind) = kind {
                    let alert_kind = AlertKind::from(bq_kind);
                    self.alert_stack.push(Some(alert_kind));
                    B::alert_start(alert_kind, &mut self.output);
                } else {
                    self.alert_stack.push(None);
                    B::blockquote_start(&mut self.output);
                }
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => {
                self.output.push_str("<li>");
                self.blocks.open(BlockKind::ListItem);
            }
            Tag::FootnoteDefinition(label) => {
                let id = footnote_id(&label);
                B::footnote_definition_start(&label, &id, &mut self.output);
                self.blocks.enter_container(id);
            }
            Tag::HtmlBlock => {
                self.html_block = Some(String::new());
            }
            Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
                self.blocks.push_space();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let target = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.into_string()
                };
                let href = safe_url(&target);
                B::link_start(href, &title, self.inline_buffer());
                self.links.open(href);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag.
                self.image.start(dest_url.into_string(), title.into_string());
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.output.push_str("</p>");
                self.blocks.close();
            }
            TagEnd::Heading(_) => {
                if let Some((level, id, _text, html)) = self.heading.complete_heading() {
                    write!(
                        self.output,
                        r#"<h{level} id="{}">{}</h{level}>"#,
                        escape_html(&id),
                        html.trim()
                    )
                    .unwrap();
                    if let Some(block) = self.blocks.close() {
                        block.id = Some(id);
                    }
                }
            }
            TagEnd::BlockQuote(_) => match self.alert_stack.pop() {
                Some(Some(alert_kind)) => B::alert_end(alert_kind, &mut self.output),
                _ => B::blockquote_end(&mut self.output),
            },
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                self.blocks.push_space();
                self.blocks.push_text(&content);
                B::code_block(lang.as_deref(), &content, &mut self.output);
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => {
                self.output.push_str("</li>");
                self.blocks.close();
            }
            TagEnd::FootnoteDefinition => {
                B::footnote_definition_end(&mut self.output);
                self.blocks.leave_container();
            }
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html_block.take() {
                    self.sanitizer
                        .filter(&html, &mut self.output, &mut self.links);
                }
            }
            TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.end() {
                    B::image(safe_url(&src), &alt, &title, self.inline_buffer());
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => {
                self.push_inline("</a>");
                self.links.close();
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
            return;
        }
        if self.image.is_active() {
            self.image.push_str(text);
            return;
        }
        if self.sanitizer.is_skipping() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(text);
        }
        self.blocks.push_text(text);
        self.links.push_text(text);
        let escaped = escape_html(text);
        self.push_inline(&escaped);
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.blocks.push_text(code);
        self.links.push_text(code);
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn block_html(&mut self, html: &str) {
        if let Some(buffer) = self.html_block.as_mut() {
            buffer.push_str(html);
        } else {
            self.sanitizer
                .filter(html, &mut self.output, &mut self.links);
        }
    }

    fn inline_html(&mut self, html: &str) {
        if self.image.is_active() {
            return;
        }
        let out = if self.heading.is_active() {
            self.heading.html_buffer()
        } else {
            &mut self.output
        };
        self.sanitizer.filter(html, out, &mut self.links);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.blocks.push_space();
            self.links.push_text(" ");
            if self.breaks {
                B::hard_break(self.inline_buffer());
            } else {
                self.push_inline("\n");
            }
        }
    }

    fn hard_break(&mut self) {
        self.blocks.push_space();
        self.links.push_text(" ");
        B::hard_break(self.inline_buffer());
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}
