use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub convert: ConvertOptions,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Webp => "webp",
        }
    }
}

impl ImageFormat {
    /// GraphicsMagick coder name, used as the `CODER:` output prefix.
    pub fn coder(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Webp => "WEBP",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Per-converter options. `page` is a zero-based index into the page list
/// reported by the identification command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub format: ImageFormat,
    pub size: u32,
    pub density: u32,
    pub out_dir: Option<PathBuf>,
    pub out_name: Option<String>,
    pub page: Option<usize>,
    pub start_index: i64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpg,
            size: 1024,
            density: 600,
            out_dir: None,
            out_name: None,
            page: None,
            start_index: 1,
        }
    }
}

impl ConvertOptions {
    /// Merge `patch` over the current options.
    ///
    /// Zero numbers, zero `page` and empty strings/paths are treated as unset
    /// and keep the previous value. `start_index` is the exception: any value
    /// present in the patch replaces the current one, including `0`.
    pub fn apply(&mut self, patch: &OptionsPatch) {
        if let Some(format) = patch.format {
            self.format = format;
        }
        if let Some(size) = patch.size.filter(|&v| v != 0) {
            self.size = size;
        }
        if let Some(density) = patch.density.filter(|&v| v != 0) {
            self.density = density;
        }
        if let Some(dir) = patch.out_dir.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            self.out_dir = Some(dir.clone());
        }
        if let Some(name) = patch.out_name.as_ref().filter(|n| !n.is_empty()) {
            self.out_name = Some(name.clone());
        }
        if let Some(page) = patch.page.filter(|&p| p != 0) {
            self.page = Some(page);
        }
        if let Some(start_index) = patch.start_index {
            self.start_index = start_index;
        }
    }
}

/// A partial set of options, merged with [`ConvertOptions::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsPatch {
    pub format: Option<ImageFormat>,
    pub size: Option<u32>,
    pub density: Option<u32>,
    pub out_dir: Option<PathBuf>,
    pub out_name: Option<String>,
    pub page: Option<usize>,
    pub start_index: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tools {
    pub gm_path: String,
    /// Per-command limit; 0 waits for the tool indefinitely.
    pub timeout_seconds: u64,
}
impl Default for Tools {
    fn default() -> Self {
        Self {
            gm_path: "gm".into(),
            timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_manifest: bool,
    pub print_summary: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_manifest: false,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
