//! Where font files come from
//!
//! Generation only ever needs one asset (the decorative font), addressed by
//! a relative path. Sources resolve that path against a directory or a base
//! URL.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CertGenError;

#[async_trait]
pub trait FontSource: Send + Sync {
    /// Fetch the bytes of the asset at `path` (relative, `/`-separated)
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CertGenError>;
}

/// Reads assets from a local directory
#[derive(Debug, Clone)]
pub struct DirFontSource {
    root: PathBuf,
}

impl DirFontSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, CertGenError> {
        let relative = path.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return Err(CertGenError::FontEmbed(format!(
                "refusing to read outside the font directory: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FontSource for DirFontSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CertGenError> {
        let full = self.resolve(path)?;
        debug!("Reading font asset from {}", full.display());
        tokio::fs::read(&full)
            .await
            .map_err(|e| CertGenError::FontEmbed(format!("{}: {}", full.display(), e)))
    }
}

/// Serves a single in-memory font for every path
#[derive(Debug, Clone)]
pub struct StaticFontSource {
    bytes: Vec<u8>,
}

impl StaticFontSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[async_trait]
impl FontSource for StaticFontSource {
    async fn fetch(&self, _path: &str) -> Result<Vec<u8>, CertGenError> {
        Ok(self.bytes.clone())
    }
}

/// Has no assets; every fetch fails, so the decorative font always falls back
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFontSource;

#[async_trait]
impl FontSource for NoFontSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CertGenError> {
        Err(CertGenError::FontEmbed(format!("no font source for {}", path)))
    }
}

/// Fetches assets over HTTP relative to a base URL
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFontSource {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFontSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl FontSource for HttpFontSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CertGenError> {
        let url = self.url_for(path);
        debug!("Fetching font asset from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CertGenError::FontEmbed(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CertGenError::FontEmbed(format!(
                "Failed to load font: {} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CertGenError::FontEmbed(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}
