//! Application state for the certificate server

use std::path::PathBuf;
use std::sync::Arc;

use certgen_core::source::{DirFontSource, FontSource, HttpFontSource};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Where the decorative font is loaded from; read-only across requests
    pub fonts: Arc<dyn FontSource>,
}

impl AppState {
    pub fn new(fonts: Arc<dyn FontSource>) -> Self {
        Self { fonts }
    }

    /// A base URL wins over a local directory
    pub fn from_config(font_dir: PathBuf, font_base_url: Option<String>) -> Self {
        let fonts: Arc<dyn FontSource> = match font_base_url {
            Some(url) => {
                info!("Loading fonts from {}", url);
                Arc::new(HttpFontSource::new(url))
            }
            None => {
                info!("Loading fonts from {}", font_dir.display());
                Arc::new(DirFontSource::new(font_dir))
            }
        };
        Self::new(fonts)
    }
}
