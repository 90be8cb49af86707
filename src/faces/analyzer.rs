//! Detection plus recognition behind the `FaceAnalyzer` trait.

use super::detector::ScrfdDetector;
use super::recognizer::ArcFaceRecognizer;
use super::{ExecutionContext, Face, FaceAnalyzer};
use crate::config::DetectionConfig;
use crate::error::Result;
use image::RgbImage;
use std::path::Path;

/// Detects faces and attaches an identity embedding to each one
pub struct OnnxFaceAnalyzer {
    detector: ScrfdDetector,
    recognizer: ArcFaceRecognizer,
}

impl OnnxFaceAnalyzer {
    pub fn new(
        detector_path: &Path,
        recognizer_path: &Path,
        context: ExecutionContext,
        threads: usize,
        detection: DetectionConfig,
    ) -> Result<Self> {
        Ok(Self {
            detector: ScrfdDetector::new(detector_path, context, threads, detection)?,
            recognizer: ArcFaceRecognizer::new(recognizer_path, context, threads)?,
        })
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Face>> {
        let mut faces = self.detector.detect(image)?;
        for face in &mut faces {
            face.embedding = Some(self.recognizer.embed(image, face)?);
        }
        Ok(faces)
    }
}
