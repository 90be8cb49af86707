//! # Face Detection and Swapping
//!
//! The orchestrator talks to two services through the traits below. The ONNX
//! implementations live in the submodules; tests substitute their own.
//!
//! ```text
//! RgbImage ──► FaceAnalyzer::detect ──► Vec<Face> (score-descending)
//!                                            │ [0]
//! target + target_face + source_face ──► FaceSwapper::swap ──► RgbImage
//! ```

pub mod align;
pub mod analyzer;
pub mod detector;
pub mod inswapper;
pub mod onnx_graph;
pub mod recognizer;
pub mod session;

use crate::error::Result;
use image::RgbImage;

pub use analyzer::OnnxFaceAnalyzer;
pub use inswapper::InSwapper;
pub use session::{init_with_fallback, ExecutionContext};

/// Axis-aligned face box in image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A detected face.
///
/// Landmarks are left eye, right eye, nose tip, left and right mouth corner.
/// `embedding` is filled by the recognizer and is L2-normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub bbox: BoundingBox,
    pub score: f32,
    pub landmarks: [[f32; 2]; 5],
    pub embedding: Option<Vec<f32>>,
}

/// Finds faces in an image.
#[cfg_attr(test, mockall::automock)]
pub trait FaceAnalyzer {
    /// All faces found, most confident first. An empty list is not an error.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Face>>;
}

/// Replaces one face in a target image with the identity of another.
#[cfg_attr(test, mockall::automock)]
pub trait FaceSwapper {
    /// Returns a full-size copy of `target` with `target_face` replaced.
    fn swap(&mut self, target: &RgbImage, target_face: &Face, source_face: &Face)
        -> Result<RgbImage>;
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}
