use faceswapper::config::*;
use faceswapper::constants::*;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_app_config_default() {
    let config = AppConfig::default();

    assert_eq!(config.models.swapper.file_name, SWAP_MODEL_NAME);
    assert_eq!(config.models.swapper.url.as_deref(), Some(SWAP_MODEL_URL));
    assert_eq!(config.models.detector.file_name, DETECTOR_MODEL_NAME);
    assert_eq!(config.models.recognizer.file_name, RECOGNIZER_MODEL_NAME);
    assert_eq!(config.output.file_name, DEFAULT_OUTPUT_FILE);
    assert_eq!(config.output.preview_max_width, 400);
    assert_eq!(config.output.preview_max_height, 400);
    assert!(config.execution.prefer_accelerated);
}

#[test]
#[serial]
fn test_every_default_model_is_downloadable() {
    let models = AppConfig::default().models;

    for artifact in [&models.swapper, &models.detector, &models.recognizer] {
        let url = artifact
            .url
            .as_deref()
            .unwrap_or_else(|| panic!("{} has no default URL", artifact.file_name));
        assert!(url.starts_with("https://"), "{} should be fetched over HTTPS", url);
    }
    assert_eq!(models.detector.url.as_deref(), Some(BUFFALO_PACK_URL));
    assert_eq!(models.recognizer.url.as_deref(), Some(BUFFALO_PACK_URL));
    assert!(BUFFALO_PACK_URL.ends_with("buffalo_l.zip"));
}

#[test]
#[serial]
fn test_config_roundtrip_save_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut original = AppConfig::default();
    original.output.file_name = "result.png".to_string();
    original.output.preview_max_width = 320;
    original.models.directory = PathBuf::from("/opt/models");
    original.models.swapper.sha256 = Some("ab".repeat(32));
    original.detection.score_threshold = 0.6;
    original.execution.prefer_accelerated = false;

    original.save_to(&config_path).expect("Failed to save config");
    assert!(config_path.exists(), "Config file should be created");

    let loaded = AppConfig::load_from(&config_path).expect("Failed to load config");
    assert_eq!(loaded.output.file_name, "result.png");
    assert_eq!(loaded.output.preview_max_width, 320);
    assert_eq!(loaded.models.directory, PathBuf::from("/opt/models"));
    assert_eq!(loaded.models.swapper.sha256, original.models.swapper.sha256);
    assert_eq!(loaded.detection.score_threshold, 0.6);
    assert!(!loaded.execution.prefer_accelerated);
}

#[test]
#[serial]
fn test_config_missing_sections_use_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[window]\nwidth = 1200.0\n").expect("write config");

    let loaded = AppConfig::load_from(&config_path).expect("partial config should parse");
    assert_eq!(loaded.window.width, 1200.0);
    assert_eq!(loaded.window.height, 700.0);
    assert_eq!(loaded.output.file_name, DEFAULT_OUTPUT_FILE);
    assert_eq!(loaded.models.swapper.file_name, SWAP_MODEL_NAME);
}

#[test]
#[serial]
fn test_model_dir_env_override() {
    std::env::set_var(MODEL_DIR_ENV, "/tmp/faceswapper-models");
    let config = AppConfig::load();
    std::env::remove_var(MODEL_DIR_ENV);

    assert_eq!(config.models.directory, PathBuf::from("/tmp/faceswapper-models"));
}

#[test]
#[serial]
fn test_config_path_names_app() {
    let path = AppConfig::config_path().expect("config dir should resolve");
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
    let dir = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    assert_eq!(dir, "faceswapper");
}
