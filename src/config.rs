//! # Configuration Management Module
//!
//! Persistent application settings stored as TOML in a platform-appropriate
//! location. Configuration is optional: a missing or corrupt file yields the
//! built-in defaults so the application always starts.
//!
//! ## Configuration Storage Locations
//!
//! - **Windows**: `%APPDATA%\FaceSwapper\config.toml`
//! - **macOS**: `~/Library/Application Support/FaceSwapper/config.toml`
//! - **Linux**: `~/.config/faceswapper/config.toml`

use crate::constants::{
    BUFFALO_PACK_URL, DEFAULT_DETECTION_SIZE, DEFAULT_ERROR_LOG, DEFAULT_FATAL_ERROR_LOG,
    DEFAULT_NMS_THRESHOLD, DEFAULT_OUTPUT_FILE, DEFAULT_PREVIEW_MAX, DEFAULT_SCORE_THRESHOLD,
    DETECTOR_MODEL_NAME, MODEL_DIR_ENV, RECOGNIZER_MODEL_NAME, SWAP_MODEL_NAME, SWAP_MODEL_URL,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One model file the application needs at startup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelArtifact {
    /// File name inside the model directory
    pub file_name: String,
    /// Where to fetch the file from when it is missing
    #[serde(default)]
    pub url: Option<String>,
    /// Expected lowercase hex SHA-256 of the downloaded file
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ModelArtifact {
    pub fn new(file_name: &str, url: Option<&str>) -> Self {
        Self {
            file_name: file_name.to_string(),
            url: url.map(str::to_string),
            sha256: None,
        }
    }
}

/// Model locations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the model files; relative paths resolve against
    /// the working directory
    pub directory: PathBuf,
    pub swapper: ModelArtifact,
    pub detector: ModelArtifact,
    pub recognizer: ModelArtifact,
}

/// Detector tuning
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DetectionConfig {
    /// Square side the image is letterboxed into before detection
    pub size: u32,
    pub score_threshold: f32,
    pub nms_threshold: f32,
}

/// Inference backend selection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Try the accelerated (CUDA) context before the default CPU context
    pub prefer_accelerated: bool,
    /// Intra-op threads for the CPU context; 0 means physical core count
    pub intra_threads: usize,
}

/// Result and log file locations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub preview_max_width: u32,
    pub preview_max_height: u32,
    pub error_log: String,
    pub fatal_error_log: String,
}

/// Main window geometry
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

/// Application configuration
///
/// Every section falls back to its defaults independently, so a file that
/// only sets `output.file_name` is valid.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub detection: DetectionConfig,
    pub execution: ExecutionConfig,
    pub output: OutputConfig,
    pub window: WindowConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            swapper: ModelArtifact::new(SWAP_MODEL_NAME, Some(SWAP_MODEL_URL)),
            detector: ModelArtifact::new(DETECTOR_MODEL_NAME, Some(BUFFALO_PACK_URL)),
            recognizer: ModelArtifact::new(RECOGNIZER_MODEL_NAME, Some(BUFFALO_PACK_URL)),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_DETECTION_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            prefer_accelerated: true,
            intra_threads: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name: DEFAULT_OUTPUT_FILE.to_string(),
            preview_max_width: DEFAULT_PREVIEW_MAX,
            preview_max_height: DEFAULT_PREVIEW_MAX,
            error_log: DEFAULT_ERROR_LOG.to_string(),
            fatal_error_log: DEFAULT_FATAL_ERROR_LOG.to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 700.0,
        }
    }
}

impl ExecutionConfig {
    /// Thread count actually handed to the inference runtime
    pub fn effective_threads(&self) -> usize {
        if self.intra_threads == 0 {
            num_cpus::get_physical().max(1)
        } else {
            self.intra_threads
        }
    }
}

impl OutputConfig {
    pub fn output_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.directory.join(&self.error_log)
    }

    pub fn fatal_error_log_path(&self) -> PathBuf {
        self.directory.join(&self.fatal_error_log)
    }
}

impl AppConfig {
    /// Load configuration from disk, using defaults if the file doesn't
    /// exist or can't be parsed. `FACESWAPPER_MODEL_DIR` overrides the
    /// model directory either way.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                Self::default()
            }),
            Ok(_) => Self::default(),
            Err(e) => {
                eprintln!("Failed to get config path: {}", e);
                Self::default()
            }
        };

        if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
            if !dir.is_empty() {
                config.models.directory = PathBuf::from(dir);
            }
        }
        config
    }

    /// Parse a specific configuration file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save current configuration to the platform config directory
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::config_path()?)
    }

    /// Write configuration as pretty TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Determine the platform-appropriate configuration file path
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let app_dir = if cfg!(any(target_os = "windows", target_os = "macos")) {
            "FaceSwapper"
        } else {
            "faceswapper"
        };

        Ok(dirs::config_dir()
            .ok_or("Could not find config directory")?
            .join(app_dir)
            .join("config.toml"))
    }
}
