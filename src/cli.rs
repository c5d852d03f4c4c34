use crate::{
    config::{Config, ImageFormat, OptionsPatch},
    convert::Converter,
    engine::{PageCounter, gm::GraphicsMagick},
    events::ConvertListener,
    report::{PageResult, RunManifest},
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGING_READY: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "pdf2img")]
#[command(about = "Convert PDF pages to images with GraphicsMagick")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./pdf2img.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that GraphicsMagick is reachable.
    Doctor {},
    /// Print the page list reported for a document.
    Pages {
        #[arg(long)]
        input: PathBuf,
    },
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum)]
        format: Option<ImageFormat>,
        /// Largest output dimension in pixels.
        #[arg(long)]
        size: Option<u32>,
        /// Rasterization density in DPI.
        #[arg(long)]
        density: Option<u32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Output filename prefix.
        #[arg(long)]
        name: Option<String>,
        /// Zero-based page index; converts only that page. 0 counts as unset
        /// here, use `[convert] page = 0` to pick the first page.
        #[arg(long)]
        page: Option<usize>,
        /// Offset added to page numbers in output filenames.
        #[arg(long, allow_hyphen_values = true)]
        start_index: Option<i64>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Pages { input } => pages(&cfg, input),
        Command::Convert {
            input,
            format,
            size,
            density,
            out_dir,
            name,
            page,
            start_index,
        } => {
            let patch = OptionsPatch {
                format: *format,
                size: *size,
                density: *density,
                out_dir: out_dir.clone(),
                out_name: name.clone(),
                page: *page,
                start_index: *start_index,
            };
            convert(&cfg, input, &patch)
        }
    }
}

/// Log a fatal error. Config errors happen before logging is set up, so
/// those go straight to stderr.
pub fn report_failure(err: &anyhow::Error) {
    if logging_ready() {
        error!("{:#}", err);
    } else {
        eprintln!("error: {:#}", err);
    }
}

/// True once `dispatch` has installed the tracing subscriber.
pub fn logging_ready() -> bool {
    LOGGING_READY.load(Ordering::Relaxed)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("pdf2img.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries JSON results, so log lines go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;
    LOGGING_READY.store(true, Ordering::Relaxed);

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("pdf2img.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let gm = GraphicsMagick::new(&cfg.tools);
    let diag = gm.doctor();
    println!("{}", serde_json::to_string_pretty(&diag)?);
    if !diag.ok {
        return Err(anyhow!("GraphicsMagick is not usable: {}", diag.gm_path));
    }
    Ok(())
}

fn pages(cfg: &Config, input: &Path) -> Result<()> {
    let gm = GraphicsMagick::new(&cfg.tools);
    let pages = gm
        .count_pages(input)
        .with_context(|| format!("counting pages: {}", input.display()))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "page_count": pages.len(),
            "pages": pages,
        }))?
    );
    Ok(())
}

/// Prints one JSON line per processed page as it happens.
struct JsonLines;

impl ConvertListener for JsonLines {
    fn on_page(&mut self, result: &PageResult) {
        let line = serde_json::json!({"result": "page_processed", "message": result});
        println!("{line}");
    }
}

fn convert(cfg: &Config, input: &Path, patch: &OptionsPatch) -> Result<()> {
    let gm = GraphicsMagick::new(&cfg.tools);
    let mut converter = Converter::new(cfg.convert.clone(), gm.clone(), gm);
    converter.set_options(patch);
    converter.subscribe(JsonLines);

    let started = now_rfc3339();
    let results = converter
        .convert(input)
        .with_context(|| format!("converting {}", input.display()))?;
    info!("converted {} page(s) from {}", results.len(), input.display());

    if cfg.output.write_manifest {
        let target = converter.output_target(input);
        let manifest = RunManifest {
            input: input.to_path_buf(),
            started,
            finished: now_rfc3339(),
            options: converter.options().clone(),
            pages: results.clone(),
        };
        let path = target.dir.join(format!("{}.manifest.json", target.name));
        std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("writing manifest: {}", path.display()))?;
    }

    if cfg.output.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "result": "success",
                "message": results,
            }))?
        );
    }

    Ok(())
}
