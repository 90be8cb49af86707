//! # Application Constants
//!
//! Application-wide constants: model artifact names and download locations,
//! output file names and the fixed geometry the models expect.
//!
//! ## Model Artifacts
//!
//! All three models are fetched on first run. The swap model is a single
//! file; the detector and recognizer are unpacked from the `buffalo_l` pack.

/// File name of the face swap model
pub const SWAP_MODEL_NAME: &str = "inswapper_128.onnx";

/// Public download location of the face swap model
pub const SWAP_MODEL_URL: &str =
    "https://huggingface.co/henryruhs/insightface-models/resolve/main/inswapper_128.onnx";

/// Public download location of the `buffalo_l` pack, which carries the
/// detector and the recognizer
pub const BUFFALO_PACK_URL: &str =
    "https://github.com/deepinsight/insightface/releases/download/v0.7/buffalo_l.zip";

/// File name of the SCRFD face detector (buffalo_l pack)
pub const DETECTOR_MODEL_NAME: &str = "det_10g.onnx";

/// File name of the ArcFace recognizer (buffalo_l pack)
pub const RECOGNIZER_MODEL_NAME: &str = "w600k_r50.onnx";

/// Environment variable overriding the configured model directory
pub const MODEL_DIR_ENV: &str = "FACESWAPPER_MODEL_DIR";

/// Fixed name of the swap result, overwritten on every run
pub const DEFAULT_OUTPUT_FILE: &str = "swapped_result.jpg";

/// Log file for recoverable swap failures
pub const DEFAULT_ERROR_LOG: &str = "error_log.txt";

/// Log file for fatal startup failures
pub const DEFAULT_FATAL_ERROR_LOG: &str = "fatal_error_log.txt";

/// Bounding box of the inline result preview
pub const DEFAULT_PREVIEW_MAX: u32 = 400;

/// Square input size of the detector
pub const DEFAULT_DETECTION_SIZE: u32 = 640;

/// Minimum detector score for a face to be kept
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// IoU above which overlapping detections are suppressed
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// Extensions accepted by the file chooser and the image loader
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Length of an identity embedding
pub const EMBEDDING_DIM: usize = 512;

/// Side of the aligned crop fed to the recognizer
pub const RECOGNIZER_INPUT_SIZE: u32 = 112;

/// Side of the aligned crop fed to the swap model
pub const SWAPPER_INPUT_SIZE: u32 = 128;
