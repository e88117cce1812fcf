//! `mmv render` command implementation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mmv_viewer::{
    Fetcher, FileThemeStore, HttpFetcher, LoadOutcome, StartOutcome, ThemeStore, Viewer,
    ViewerConfig,
};

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::surface::HtmlPageSurface;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the page to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// Load failures end up in the page as inline errors, so a page is
    /// written either way.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.viewer_config()?;
        let store = Box::new(FileThemeStore::new(&config.state_file));
        let fragment = self.source.initial_fragment();

        let (page, outcome) =
            render_page(config, HttpFetcher::new(), store, fragment.as_deref()).await;

        match &outcome {
            StartOutcome::ManifestFailed(err) => {
                output.warning(&format!("Manifest could not be loaded: {err}"));
            }
            StartOutcome::Empty => output.warning("The manifest lists no manuals"),
            StartOutcome::Started(LoadOutcome::Failed(err)) => {
                output.warning(&format!("Manual could not be loaded: {err}"));
            }
            StartOutcome::Started(_) => {}
        }

        match &self.output {
            Some(path) => {
                std::fs::write(path, &page)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(page.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Start a viewer over an HTML page surface and return the finished page.
async fn render_page<F: Fetcher>(
    config: Arc<ViewerConfig>,
    fetcher: F,
    store: Box<dyn ThemeStore>,
    fragment: Option<&str>,
) -> (String, StartOutcome) {
    let viewer = Viewer::new(config, fetcher, HtmlPageSurface::new(), store);
    let outcome = viewer.start(fragment).await;
    let page = viewer.surface().render_page();
    (page, outcome)
}

#[cfg(test)]
mod tests {
    use mmv_viewer::{MemoryThemeStore, MockFetcher, encode_fragment};

    use super::*;

    const ROOT: &str = "https://raw.example.com/acme/manuals/main/";

    fn config() -> Arc<ViewerConfig> {
        Arc::new(ViewerConfig::new(ROOT))
    }

    fn manifest() -> &'static str {
        r#"[
            {"title": "Guide", "path": "docs/guide.md"},
            {"title": "API", "path": "docs/api.md"}
        ]"#
    }

    #[tokio::test]
    async fn test_render_first_manual() {
        let fetcher = MockFetcher::new()
            .with_document(format!("{ROOT}data/manuals.json"), manifest())
            .with_document(
                format!("{ROOT}docs/guide.md"),
                "# Guide\n\nSee the [API](api.md).\n\n![shot](img/shot.png)\n",
            );

        let (page, outcome) = render_page(
            config(),
            fetcher,
            Box::new(MemoryThemeStore::with_value("dark")),
            None,
        )
        .await;

        assert!(matches!(outcome, StartOutcome::Started(LoadOutcome::Loaded)));
        assert!(page.contains("data-theme=\"dark\""));
        assert!(page.contains("<title>Guide</title>"));
        assert!(page.contains("data-fragment=\"#manual=docs%2Fguide.md\""));
        assert!(page.contains(&format!("src=\"{ROOT}docs/img/shot.png\"")));
        assert!(page.contains("data-index=\"1\">API</button>"));
    }

    #[tokio::test]
    async fn test_render_restores_fragment() {
        let fetcher = MockFetcher::new()
            .with_document(format!("{ROOT}data/manuals.json"), manifest())
            .with_document(format!("{ROOT}docs/api.md"), "# API\n\n## Endpoints\n");

        let fragment = encode_fragment("docs/api.md");
        let (page, outcome) = render_page(
            config(),
            fetcher,
            Box::new(MemoryThemeStore::new()),
            Some(&fragment),
        )
        .await;

        assert!(matches!(outcome, StartOutcome::Started(LoadOutcome::Loaded)));
        assert!(page.contains("<title>API</title>"));
        assert!(page.contains("href=\"#endpoints\""));
    }

    #[tokio::test]
    async fn test_render_manifest_failure_is_inline() {
        let fetcher =
            MockFetcher::new().with_status(format!("{ROOT}data/manuals.json"), 500);

        let (page, outcome) = render_page(
            config(),
            fetcher,
            Box::new(MemoryThemeStore::new()),
            None,
        )
        .await;

        assert!(matches!(outcome, StartOutcome::ManifestFailed(_)));
        assert!(page.contains("<div class=\"error\">Error loading manifest:"));
        assert!(page.contains("<footer>© 1970 "));
    }
}
