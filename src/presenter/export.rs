use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::llm::media::{decode_data_url, MediaError};
use crate::presenter::card::{Card, CARD_TITLE, EDITION_YEAR};
use crate::presenter::render::{RasterOptions, Rasterizer};

pub const EXPORT_MIME: &str = "image/png";

/// Rasterization passes per export. Some renderers draw embedded data-URI
/// artwork blank on the first pass, so only the last pass is kept.
pub const RASTER_PASSES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("share was cancelled")]
    Cancelled,
    #[error("share failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to rasterize card: {0:#}")]
    Rasterize(anyhow::Error),
    #[error("failed to decode rasterized card: {0}")]
    Decode(#[from] MediaError),
    #[error(transparent)]
    Share(ShareError),
    #[error("failed to download card: {0:#}")]
    Download(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Shared { filename: String },
    Downloaded { filename: String },
    Cancelled,
}

/// Native share sheet, where the platform has one.
pub trait SharePlatform {
    fn can_share(&self, file: &ExportFile) -> bool;
    fn share(&self, file: &ExportFile, title: &str) -> Result<(), ShareError>;
}

/// Plain file download, always available.
pub trait Downloader {
    fn download(&self, file: &ExportFile) -> anyhow::Result<()>;
}

impl<T: SharePlatform + ?Sized> SharePlatform for &T {
    fn can_share(&self, file: &ExportFile) -> bool {
        (**self).can_share(file)
    }

    fn share(&self, file: &ExportFile, title: &str) -> Result<(), ShareError> {
        (**self).share(file, title)
    }
}

impl<T: Downloader + ?Sized> Downloader for &T {
    fn download(&self, file: &ExportFile) -> anyhow::Result<()> {
        (**self).download(file)
    }
}

/// Command-line runs have no share sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSharePlatform;

impl SharePlatform for NoSharePlatform {
    fn can_share(&self, _file: &ExportFile) -> bool {
        false
    }

    fn share(&self, _file: &ExportFile, _title: &str) -> Result<(), ShareError> {
        Err(ShareError::Failed("sharing is not available here".to_string()))
    }
}

/// Saves downloads into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDownloader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for DirectoryDownloader {
    fn download(&self, file: &ExportFile) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(&file.name);
        fs::write(&path, &file.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Saved card to {} ({} bytes)", path.display(), file.bytes.len());
        Ok(())
    }
}

/// `valentine-card-2026-<energy>.png`, energy lowercased with inner
/// whitespace runs turned into hyphens. Leading and trailing whitespace is
/// dropped rather than hyphenated.
pub fn export_filename(energy: &str) -> String {
    let slug = energy
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("valentine-card-{EDITION_YEAR}-{slug}.png")
}

pub struct CardExporter<R, S, D> {
    rasterizer: R,
    share: S,
    downloader: D,
    options: RasterOptions,
}

impl<R, S, D> CardExporter<R, S, D>
where
    R: Rasterizer,
    S: SharePlatform,
    D: Downloader,
{
    pub fn new(rasterizer: R, share: S, downloader: D) -> Self {
        CardExporter {
            rasterizer,
            share,
            downloader,
            options: RasterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RasterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn render_file(&self, card: &Card) -> Result<ExportFile, ExportError> {
        let mut data_url = String::new();
        for _ in 0..RASTER_PASSES {
            data_url = self
                .rasterizer
                .rasterize(card, &self.options)
                .map_err(ExportError::Rasterize)?;
        }

        let blob = decode_data_url(&data_url)?;
        Ok(ExportFile {
            name: export_filename(&card.selection.energy),
            mime_type: EXPORT_MIME.to_string(),
            bytes: blob.bytes,
        })
    }

    /// Shares the card when the platform can take a PNG file, otherwise
    /// downloads it. A cancelled share is an outcome, not an error.
    pub fn export(&self, card: &Card) -> Result<ExportOutcome, ExportError> {
        let file = self.render_file(card)?;
        let filename = file.name.clone();

        if self.share.can_share(&file) {
            return match self.share.share(&file, CARD_TITLE) {
                Ok(()) => Ok(ExportOutcome::Shared { filename }),
                Err(ShareError::Cancelled) => Ok(ExportOutcome::Cancelled),
                Err(err) => Err(ExportError::Share(err)),
            };
        }

        self.downloader
            .download(&file)
            .map_err(ExportError::Download)?;
        Ok(ExportOutcome::Downloaded { filename })
    }
}
