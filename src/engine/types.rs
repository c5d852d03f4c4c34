use crate::config::{ConvertOptions, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// A document the converter has confirmed it can read. The rasterizer
/// addresses pages by `path[index]`, so a handle without a path cannot be
/// rasterized.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    path: Option<PathBuf>,
}

impl DocumentHandle {
    /// Fails when `path` cannot be opened for reading.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        File::open(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
        })
    }

    /// A handle with no filesystem origin, e.g. data held in memory.
    pub fn unnamed() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterSettings {
    pub format: ImageFormat,
    pub size: u32,
    pub density: u32,
    pub quality: u32,
}

pub const MAX_QUALITY: u32 = 100;

impl RasterSettings {
    pub fn from_options(opts: &ConvertOptions) -> Self {
        Self {
            format: opts.format,
            size: opts.size,
            density: opts.density,
            quality: MAX_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub gm_path: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
