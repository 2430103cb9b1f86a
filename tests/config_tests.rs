//! Configuration file handling

use gesture_tracking::config::{Config, EXAMPLE_CONFIG};
use gesture_tracking::Error;

#[test]
fn test_file_round_trip() {
    let path = std::env::temp_dir().join(format!("gesture_tracking_config_{}.yaml", std::process::id()));

    let mut config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    config.tracking.loss_hold_ms = 150.0;
    config.preview.enabled = false;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.tracking, config.tracking);
    assert_eq!(loaded.preview, config.preview);
    assert_eq!(loaded.profiles, config.profiles);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_missing_file() {
    assert!(matches!(Config::from_file("/nonexistent/gesture.yaml"), Err(Error::Io(_))));
}

#[test]
fn test_missing_model_path() {
    let mut config = Config::default();
    config.detector.model_path = "/nonexistent/hand.onnx".into();
    assert!(matches!(config.validate_model_path(), Err(Error::ConfigError(_))));
}

#[test]
fn test_unknown_filter_kind_rejected() {
    let config = Config::from_yaml("filter:\n  kind: kalman\n").unwrap();
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("kalman")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}
