pub mod cli;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod events;
pub mod report;
pub mod util;

pub use config::{Config, ConvertOptions, ImageFormat, OptionsPatch};
pub use convert::{ConversionOutcome, Converter};
pub use engine::{DocumentHandle, PageCounter, RasterSettings, Rasterizer, gm::GraphicsMagick};
pub use error::ConvertError;
pub use events::ConvertListener;
pub use report::PageResult;
