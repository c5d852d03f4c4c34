use pdf2img::config::{Config, ImageFormat};

#[test]
fn parse_example_config() {
    let raw = include_str!("../pdf2img.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.convert.format, ImageFormat::Jpg);
    assert_eq!(cfg.convert.size, 1024);
    assert_eq!(cfg.convert.density, 600);
    assert_eq!(cfg.convert.start_index, 1);
    assert!(cfg.convert.page.is_none());
    assert_eq!(cfg.tools.timeout_seconds, 0);
}

#[test]
fn empty_config_uses_defaults() {
    let cfg: Config = toml::from_str("").expect("parse TOML");
    assert_eq!(cfg.convert, Config::default().convert);
    assert_eq!(cfg.tools.gm_path, "gm");
    assert!(!cfg.output.write_manifest);
}

#[test]
fn partial_convert_section_keeps_other_defaults() {
    let cfg: Config = toml::from_str("[convert]\nformat = \"png\"\npage = 2\n").expect("parse TOML");
    assert_eq!(cfg.convert.format, ImageFormat::Png);
    assert_eq!(cfg.convert.page, Some(2));
    assert_eq!(cfg.convert.size, 1024);
    assert_eq!(cfg.convert.start_index, 1);
}
