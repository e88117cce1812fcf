//! Immutable viewer configuration.

use std::path::PathBuf;

use mmv_config::Config;

/// Shell branding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branding {
    pub company_name: String,
    /// Company logo URL, resolved against the raw-content root.
    pub company_logo: String,
    /// Partner logo URL, resolved against the raw-content root.
    pub partner_logo: String,
    /// Year shown in the footer.
    pub year: i32,
}

impl Branding {
    /// Footer line.
    pub fn footer(&self) -> String {
        format!("© {} {}", self.year, self.company_name)
    }
}

/// Configuration shared by every viewer component.
///
/// Built once at startup and never mutated.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Raw-content root, ending with `/`.
    pub raw_root: String,
    /// Manifest URL.
    pub manifest_url: String,
    pub branding: Branding,
    /// GitHub-flavored parsing.
    pub gfm: bool,
    /// Soft line breaks render as `<br>`.
    pub breaks: bool,
    /// Durable state file (theme preference).
    pub state_file: PathBuf,
}

impl ViewerConfig {
    /// Viewer configuration for `raw_root` with default branding and rendering.
    pub fn new(raw_root: impl Into<String>) -> Self {
        let mut raw_root = raw_root.into();
        if !raw_root.ends_with('/') {
            raw_root.push('/');
        }
        Self {
            manifest_url: format!("{raw_root}data/manuals.json"),
            branding: Branding {
                company_name: "Your Company".to_owned(),
                company_logo: format!("{raw_root}images/company-logo.png"),
                partner_logo: format!("{raw_root}images/partner-logo.png"),
                year: 1970,
            },
            raw_root,
            gfm: true,
            breaks: false,
            state_file: PathBuf::from(".mmv/state.json"),
        }
    }
}

fn asset_url(raw_root: &str, asset: &str) -> String {
    if asset.starts_with("http://") || asset.starts_with("https://") {
        asset.to_owned()
    } else {
        format!("{raw_root}{}", asset.trim_start_matches('/'))
    }
}

/// Convert loaded configuration into the viewer's configuration.
pub fn viewer_config_from_mmv_config(config: &Config, year: i32) -> ViewerConfig {
    let raw_root = config.source.raw_root();
    ViewerConfig {
        manifest_url: config.source.manifest_url(),
        branding: Branding {
            company_name: config.branding.company_name.clone(),
            company_logo: asset_url(&raw_root, &config.branding.company_logo),
            partner_logo: asset_url(&raw_root, &config.branding.partner_logo),
            year,
        },
        gfm: config.render.gfm,
        breaks: config.render.breaks,
        state_file: config.state_resolved.file.clone(),
        raw_root,
    }
}
