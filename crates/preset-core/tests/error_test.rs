use preset_core::error::PresetError;
use preset_core::{parse_presets, PresetConfig};

#[test]
fn test_error_display() {
    assert_eq!(
        PresetError::network("connection refused").to_string(),
        "Network error: connection refused"
    );
    assert_eq!(PresetError::settings("locked").to_string(), "Settings error: locked");
    assert_eq!(PresetError::unknown("?").to_string(), "Unknown error: ?");
}

#[test]
fn test_error_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(PresetError::from(io), PresetError::Io(_)));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(PresetError::from(json), PresetError::Serialization(_)));
}

#[test]
fn test_parse_failure_is_parse_error() {
    assert!(matches!(parse_presets("[{]"), Err(PresetError::Parse(_))));
    assert!(matches!(parse_presets(r#"[{"label": "no id"}]"#), Err(PresetError::Parse(_))));
}

#[test]
fn test_missing_config_file() {
    let err = PresetConfig::from_file("/nonexistent/layer-presets.toml").unwrap_err();
    assert!(matches!(err, PresetError::Io(_)));
}
