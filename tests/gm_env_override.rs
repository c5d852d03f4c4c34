// Kept in its own test binary: it sets a process-wide environment variable.
#![cfg(unix)]

use pdf2img::{GraphicsMagick, PageCounter, config::Tools};
use std::os::unix::fs::PermissionsExt;

#[test]
fn env_path_wins_over_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let stub = dir.path().join("gm-from-env");
    std::fs::write(&stub, "#!/bin/sh\nprintf '7 8 '\n").unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
    let input = dir.path().join("doc.pdf");
    std::fs::write(&input, b"%PDF-1.4").unwrap();

    // SAFETY: this binary runs a single test, so nothing reads the environment concurrently.
    unsafe { std::env::set_var("PDF2IMG_GM_PATH", &stub) };

    let gm = GraphicsMagick::new(&Tools {
        gm_path: dir.path().join("configured-gm-does-not-exist").display().to_string(),
        timeout_seconds: 0,
    });
    assert_eq!(gm.count_pages(&input).unwrap(), vec![7, 8]);
    assert_eq!(gm.doctor().gm_path, stub.display().to_string());
}
