use crate::config::ConvertOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One successfully rasterized page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Physical, 1-based page number.
    pub page: u32,
    pub name: String,
    /// Bytes / 1000.
    pub size_kb: f64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub input: PathBuf,
    pub started: String,
    pub finished: String,
    pub options: ConvertOptions,
    pub pages: Vec<PageResult>,
}
