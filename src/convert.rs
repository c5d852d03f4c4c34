use crate::{
    config::{ConvertOptions, OptionsPatch},
    engine::{DocumentHandle, PageCounter, RasterSettings, Rasterizer},
    error::ConvertError,
    events::ConvertListener,
    report::PageResult,
    util::{dir_exists, file_exists, stem_of},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub type ConversionOutcome = Result<Vec<PageResult>, ConvertError>;

/// Converts PDF pages to images, one page at a time, in page order.
pub struct Converter<C: PageCounter, R: Rasterizer> {
    options: ConvertOptions,
    counter: C,
    rasterizer: R,
    listeners: Vec<Box<dyn ConvertListener>>,
}

/// Where the images of one `convert` call go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub name: String,
}

impl OutputTarget {
    /// `{dir}/{name}_{display}.{ext}` where display = page + start_index - 1.
    pub fn page_path(&self, page: u32, start_index: i64, ext: &str) -> PathBuf {
        let display = display_page(page, start_index);
        self.dir.join(format!("{}_{}.{}", self.name, display, ext))
    }
}

pub fn display_page(page: u32, start_index: i64) -> i64 {
    i64::from(page) + start_index - 1
}

impl<C: PageCounter, R: Rasterizer> Converter<C, R> {
    pub fn new(options: ConvertOptions, counter: C, rasterizer: R) -> Self {
        Self {
            options,
            counter,
            rasterizer,
            listeners: Vec::new(),
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn set_options(&mut self, patch: &OptionsPatch) {
        self.options.apply(patch);
        debug!(options = ?self.options, "options updated");
    }

    pub fn subscribe<L: ConvertListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    /// Convert `input` and notify listeners along the way. The first failure
    /// stops the run; pages after it are never attempted.
    pub fn convert(&mut self, input: &Path) -> ConversionOutcome {
        match self.run(input) {
            Ok(results) => {
                for l in self.listeners.iter_mut() {
                    l.on_complete(&results);
                }
                Ok(results)
            }
            Err(err) => {
                warn!(kind = err.kind(), "conversion failed: {err}");
                for l in self.listeners.iter_mut() {
                    l.on_error(&err);
                }
                Err(err)
            }
        }
    }

    fn run(&mut self, input: &Path) -> ConversionOutcome {
        validate_input(input)?;

        let target = self.output_target(input);
        if !dir_exists(&target.dir) {
            std::fs::create_dir(&target.dir).map_err(|source| ConvertError::OutputDir {
                path: target.dir.clone(),
                source,
            })?;
        }

        let pages = self.counter.count_pages(input)?;
        if pages.is_empty() {
            return Err(ConvertError::InvalidPageCount {
                detail: format!("no pages reported for {}", input.display()),
            });
        }
        let targets = self.select_pages(&pages)?;

        info!(
            "input={} pages={} selected={} out={}",
            input.display(),
            pages.len(),
            targets.len(),
            target.dir.display()
        );

        let settings = RasterSettings::from_options(&self.options);
        let ext = self.options.format.extension();
        let mut results = Vec::with_capacity(targets.len());

        for page in targets {
            let output = target.page_path(page, self.options.start_index, ext);
            let handle = DocumentHandle::open(input).map_err(|source| ConvertError::Io {
                path: input.to_path_buf(),
                source,
            })?;

            let result = self
                .rasterizer
                .rasterize(&handle, &output, page, &settings)?;
            info!(
                "page {} -> {} ({:.3} KB)",
                result.page,
                result.path.display(),
                result.size_kb
            );

            for l in self.listeners.iter_mut() {
                l.on_page(&result);
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Configured directory and name, falling back to the input's stem.
    pub fn output_target(&self, input: &Path) -> OutputTarget {
        let stem = stem_of(input);
        let dir = match &self.options.out_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(&stem),
        };
        let name = self.options.out_name.clone().unwrap_or(stem);
        OutputTarget { dir, name }
    }

    fn select_pages(&self, pages: &[u32]) -> Result<Vec<u32>, ConvertError> {
        match self.options.page {
            Some(index) => pages
                .get(index)
                .map(|&p| vec![p])
                .ok_or_else(|| ConvertError::InvalidPageCount {
                    detail: format!("page index {index} out of range ({} pages)", pages.len()),
                }),
            None => Ok(pages.to_vec()),
        }
    }
}

fn validate_input(input: &Path) -> Result<(), ConvertError> {
    if input.extension().and_then(|s| s.to_str()) != Some("pdf") {
        return Err(ConvertError::UnsupportedFileType {
            path: input.to_path_buf(),
        });
    }
    if !file_exists(input) {
        return Err(ConvertError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    Ok(())
}
