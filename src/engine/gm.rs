use super::{DocumentHandle, PageCounter, RasterSettings, Rasterizer, ToolDiag};
use crate::{config::Tools, error::ConvertError, report::PageResult};
use regex::Regex;
use std::io::Read;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::OnceLock;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs GraphicsMagick: `gm identify` for page discovery and `gm convert`
/// for rasterization.
#[derive(Debug, Clone)]
pub struct GraphicsMagick {
    gm_exe: PathBuf,
    timeout: Option<Duration>,
}

impl GraphicsMagick {
    pub fn new(tools: &Tools) -> Self {
        let timeout = if tools.timeout_seconds > 0 {
            Some(Duration::from_secs(tools.timeout_seconds))
        } else {
            None
        };
        Self {
            gm_exe: resolve_gm_exe(&tools.gm_path),
            timeout,
        }
    }

    pub fn doctor(&self) -> ToolDiag {
        let gm_path = self.gm_exe.display().to_string();
        match self.run(&[OsString::from("version")]) {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                ToolDiag {
                    gm_path,
                    version: stdout.lines().next().map(|l| l.trim().to_string()),
                    ok: true,
                    error: None,
                }
            }
            Ok(out) => ToolDiag {
                gm_path,
                version: None,
                ok: false,
                error: Some(String::from_utf8_lossy(&out.stderr).trim().to_string()),
            },
            Err(err) => ToolDiag {
                gm_path,
                version: None,
                ok: false,
                error: Some(err),
            },
        }
    }

    fn run(&self, args: &[OsString]) -> Result<Output, String> {
        debug!(
            "gm {} timeout={:?}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
            self.timeout
        );
        let mut cmd = Command::new(&self.gm_exe);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("spawning {}: {e}", self.gm_exe.display()))?;

        if let Some(timeout) = self.timeout {
            wait_with_timeout(&mut child, timeout)
        } else {
            child
                .wait_with_output()
                .map_err(|e| format!("waiting for gm: {e}"))
        }
    }
}

impl PageCounter for GraphicsMagick {
    fn count_pages(&self, input: &Path) -> Result<Vec<u32>, ConvertError> {
        let args = vec![
            OsString::from("identify"),
            OsString::from("-format"),
            OsString::from("%p "),
            input.as_os_str().to_owned(),
        ];
        let out = self.run(&args).map_err(|detail| ConvertError::ToolFailed {
            tool: "gm identify".into(),
            detail,
        })?;
        if !out.status.success() {
            return Err(ConvertError::ToolFailed {
                tool: "gm identify".into(),
                detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(parse_page_tokens(&String::from_utf8_lossy(&out.stdout)))
    }
}

impl Rasterizer for GraphicsMagick {
    fn rasterize(
        &self,
        input: &DocumentHandle,
        output: &Path,
        page: u32,
        settings: &RasterSettings,
    ) -> Result<PageResult, ConvertError> {
        let path = input.path().ok_or(ConvertError::InvalidInputPath)?;
        let args = convert_args(path, output, page, settings);

        let write_failed = |detail: String| ConvertError::WriteFailed {
            path: output.to_path_buf(),
            detail,
        };

        let out = self.run(&args).map_err(write_failed)?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(write_failed(format!(
                "gm convert exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }

        page_result(output, page)
    }
}

/// Stat a freshly written image and describe it.
pub fn page_result(output: &Path, page: u32) -> Result<PageResult, ConvertError> {
    let meta = std::fs::metadata(output).map_err(|e| ConvertError::WriteFailed {
        path: output.to_path_buf(),
        detail: format!("stat output: {e}"),
    })?;
    if meta.len() == 0 {
        return Err(ConvertError::EmptyOutput {
            path: output.to_path_buf(),
        });
    }
    Ok(PageResult {
        page,
        name: output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size_kb: meta.len() as f64 / 1000.0,
        path: output.to_path_buf(),
    })
}

/// `gm convert -density DxD <path>[page-1] -resize SxS -quality Q FORMAT:<output>`.
/// The geometry `SxS` bounds both sides, so the larger one ends up at `S`.
/// Paths are passed through as `OsString`, never re-encoded.
pub fn convert_args(
    input: &Path,
    output: &Path,
    page: u32,
    settings: &RasterSettings,
) -> Vec<OsString> {
    let mut selector = input.as_os_str().to_owned();
    selector.push(format!("[{}]", page.saturating_sub(1)));

    let mut target = OsString::from(format!("{}:", settings.format.coder()));
    target.push(output.as_os_str());

    vec![
        OsString::from("convert"),
        OsString::from("-density"),
        OsString::from(format!("{0}x{0}", settings.density)),
        selector,
        OsString::from("-resize"),
        OsString::from(format!("{0}x{0}", settings.size)),
        OsString::from("-quality"),
        OsString::from(settings.quality.to_string()),
        target,
    ]
}

/// Every run of ASCII digits in `raw`, in order.
pub fn parse_page_tokens(raw: &str) -> Vec<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("static regex"));
    re.find_iter(raw)
        .filter_map(|m| match m.as_str().parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("ignoring out-of-range page token {}", m.as_str());
                None
            }
        })
        .collect()
}

fn resolve_gm_exe(raw: &str) -> PathBuf {
    if let Ok(env_val) = std::env::var("PDF2IMG_GM_PATH") {
        if !env_val.trim().is_empty() {
            return expand_tilde(env_val.trim());
        }
    }
    let raw = raw.trim();
    if raw.is_empty() {
        return PathBuf::from("gm");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output, String> {
    // Readers report over channels so the caller never blocks on a pipe that a
    // grandchild (gs, spawned by gm) still holds open after the kill.
    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(|e| format!("try_wait: {e}"))? {
            let stdout = recv_until(&stdout_rx, deadline, "stdout")?;
            let stderr = recv_until(&stderr_rx, deadline, "stderr")?;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if Instant::now() >= deadline {
            warn!("gm process timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().map_err(|e| format!("wait after kill: {e}"))?;
            let stderr = stderr_rx
                .recv_timeout(Duration::from_millis(100))
                .ok()
                .and_then(|r| r.ok())
                .unwrap_or_default();
            return Err(format!(
                "gm exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> Receiver<std::io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let res = match reader {
            Some(mut r) => r.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        let _ = tx.send(res);
    });
    rx
}

fn recv_until(
    rx: &Receiver<std::io::Result<Vec<u8>>>,
    deadline: Instant,
    name: &str,
) -> Result<Vec<u8>, String> {
    let left = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(left) {
        Ok(res) => res.map_err(|e| format!("read {name}: {e}")),
        Err(RecvTimeoutError::Timeout) => Err(format!(
            "gm exited but its {name} stayed open past the timeout"
        )),
        Err(RecvTimeoutError::Disconnected) => Err(format!("{name} reader thread panicked")),
    }
}
