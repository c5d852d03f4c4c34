pub mod gm;
pub mod types;

use crate::{error::ConvertError, report::PageResult};
use std::path::Path;

pub use types::{DocumentHandle, RasterSettings, ToolDiag};

pub trait PageCounter {
    /// Physical page identifiers in the order the tool reports them.
    fn count_pages(&self, input: &Path) -> Result<Vec<u32>, ConvertError>;
}

pub trait Rasterizer {
    /// Write exactly one image for `page` (1-based) to `output`.
    fn rasterize(
        &self,
        input: &DocumentHandle,
        output: &Path,
        page: u32,
        settings: &RasterSettings,
    ) -> Result<PageResult, ConvertError>;
}

impl<T: PageCounter + ?Sized> PageCounter for &T {
    fn count_pages(&self, input: &Path) -> Result<Vec<u32>, ConvertError> {
        (**self).count_pages(input)
    }
}

impl<T: Rasterizer + ?Sized> Rasterizer for &T {
    fn rasterize(
        &self,
        input: &DocumentHandle,
        output: &Path,
        page: u32,
        settings: &RasterSettings,
    ) -> Result<PageResult, ConvertError> {
        (**self).rasterize(input, output, page, settings)
    }
}
