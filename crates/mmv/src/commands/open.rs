//! `mmv open` command implementation.

use std::rc::Rc;

use clap::Args;
use mmv_viewer::{
    FileThemeStore, HttpFetcher, LoadOutcome, SearchOutcome, StartOutcome, Viewer, Viewport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::shell::{HELP, ShellCommand};
use crate::surface::TerminalSurface;

type TerminalViewer = Viewer<HttpFetcher, TerminalSurface>;

/// Arguments for the open command.
#[derive(Args)]
pub(crate) struct OpenArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl OpenArgs {
    /// Execute the open command.
    ///
    /// Loads run as local tasks, so commands keep being read while a manual
    /// is being fetched.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.viewer_config()?;

        output.info(&format!("Manifest: {}", config.manifest_url));
        output.hint("Type `help` for commands.");

        let store = Box::new(FileThemeStore::new(&config.state_file));
        let viewer = Rc::new(Viewer::new(
            config,
            HttpFetcher::new(),
            TerminalSurface::new(),
            store,
        ));
        let fragment = self.source.initial_fragment();

        LocalSet::new()
            .run_until(async move {
                let starting = Rc::clone(&viewer);
                tokio::task::spawn_local(async move {
                    let outcome = starting.start(fragment.as_deref()).await;
                    report_start(&outcome);
                });
                session(&viewer, &output).await
            })
            .await
    }
}

async fn session(viewer: &Rc<TerminalViewer>, output: &Output) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                output.warning(&err.to_string());
                continue;
            }
        };

        match command {
            ShellCommand::Nothing => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => output.info(HELP),
            ShellCommand::Index => {
                for (i, label) in viewer.manifest().labels().iter().enumerate() {
                    output.info(&format!("{:>3}. {label}", i + 1));
                }
            }
            ShellCommand::Open(index) => {
                if index >= viewer.manifest().len() {
                    output.warning(&format!("No manual {}", index + 1));
                    continue;
                }
                spawn_load(viewer, move |viewer| async move { viewer.select(index).await });
            }
            ShellCommand::Links => {
                for (i, link) in viewer.links().iter().enumerate() {
                    let marker = if link.target.is_some() { "→" } else { " " };
                    output.info(&format!("{:>3}. {marker} {} <{}>", i + 1, link.text, link.href));
                }
            }
            ShellCommand::Follow(index) => match viewer.links().get(index) {
                Some(link) if link.target.is_some() => {
                    spawn_load(viewer, move |viewer| async move {
                        viewer.follow_link(index).await
                    });
                }
                Some(link) => output.info(&format!("External link: {}", link.href)),
                None => output.warning(&format!("No link {}", index + 1)),
            },
            ShellCommand::Toc => match viewer.toc() {
                Some(toc) if !toc.is_empty() => {
                    for entry in toc.entries() {
                        output.info(&format!("{}{}", "  ".repeat(entry.indent()), entry.text));
                    }
                }
                _ => output.hint("No headings"),
            },
            ShellCommand::Search(query) => match viewer.search(&query) {
                SearchOutcome::Cleared => {}
                SearchOutcome::NoMatch => output.hint(&format!("No matches for \"{query}\"")),
                SearchOutcome::Matches { highlighted, .. } => {
                    output.success(&format!("{} match(es)", highlighted.len()));
                }
            },
            ShellCommand::Scroll(line) => {
                let height = viewer.surface().rows();
                // Lines are shown one-based.
                let viewport = Viewport::new((line - 1.0).max(0.0), f64::from(height));
                let viewer = Rc::clone(viewer);
                tokio::task::spawn_local(async move {
                    viewer.update_viewport(viewport).await;
                });
            }
            ShellCommand::Home => {
                spawn_load(viewer, |viewer| async move { viewer.home().await });
            }
            ShellCommand::Theme => {
                let theme = viewer.toggle_theme();
                output.highlight(&format!("Theme: {}", theme.as_str()));
            }
            ShellCommand::Menu => {
                viewer.toggle_drawer();
            }
            ShellCommand::Close => viewer.escape(),
        }
    }
    Ok(())
}

/// Run a navigation in the background and report how it ended.
fn spawn_load<F, Fut>(viewer: &Rc<TerminalViewer>, navigate: F)
where
    F: FnOnce(Rc<TerminalViewer>) -> Fut + 'static,
    Fut: Future<Output = Option<LoadOutcome>> + 'static,
{
    let viewer = Rc::clone(viewer);
    tokio::task::spawn_local(async move {
        if let Some(outcome) = navigate(viewer).await {
            report_load(&outcome);
        }
    });
}

fn report_start(outcome: &StartOutcome) {
    match outcome {
        StartOutcome::ManifestFailed(_) => {
            Output::new().hint("No manuals can be opened; `theme` and `menu` still work.");
        }
        StartOutcome::Empty => Output::new().warning("The manifest lists no manuals"),
        StartOutcome::Started(outcome) => report_load(outcome),
    }
}

fn report_load(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Loaded | LoadOutcome::Failed(_) => {}
        LoadOutcome::Superseded => tracing::debug!("Load superseded by a newer one"),
    }
}
