//! Rendering surfaces for the CLI.

mod html;
mod terminal;

pub(crate) use html::HtmlPageSurface;
pub(crate) use terminal::TerminalSurface;
