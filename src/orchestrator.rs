//! # Swap Orchestration
//!
//! Holds the session state (chosen source and target paths) and runs the
//! compound swap action against injected detection and swap services. The
//! result is a [`SwapOutcome`]; turning it into dialogs or log entries is the
//! GUI's job.
//!
//! ## Swap Pipeline
//!
//! ```text
//! paths set? ─no─► MissingInput
//!     │
//! load both ─► detect both ─empty─► NoFaceDetected
//!     │
//! swap(target, target[0], source[0]) ─► save ─► reload ─► thumbnail ─► Swapped
//! ```
//!
//! Any error along the way becomes `Failed`. Session paths are never touched
//! by a swap, whatever its outcome, and no file is written unless the swap
//! call itself succeeded.

use crate::config::OutputConfig;
use crate::error::{Result, SwapError};
use crate::faces::{Face, FaceAnalyzer, FaceSwapper};
use crate::imaging;
use crate::logger::log;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Which inputs have been chosen so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    SourceOnly,
    TargetOnly,
    BothLoaded,
}

/// Result of one swap attempt
#[derive(Debug)]
pub enum SwapOutcome {
    /// Result written to `output`; `preview` fits the configured bounds
    Swapped { output: PathBuf, preview: RgbImage },
    /// `true` marks the input that has not been chosen
    MissingInput { source: bool, target: bool },
    /// `true` marks the image in which no face was found
    NoFaceDetected { source: bool, target: bool },
    /// Decode, inference or write failure
    Failed(SwapError),
}

impl SwapOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SwapOutcome::Swapped { .. })
    }
}

/// Owns the services and the session for one window
pub struct Orchestrator<A, S> {
    analyzer: A,
    swapper: S,
    source: Option<PathBuf>,
    target: Option<PathBuf>,
    output_path: PathBuf,
    preview_max_width: u32,
    preview_max_height: u32,
}

impl<A: FaceAnalyzer, S: FaceSwapper> Orchestrator<A, S> {
    pub fn new(analyzer: A, swapper: S, output: &OutputConfig) -> Self {
        Self {
            analyzer,
            swapper,
            source: None,
            target: None,
            output_path: output.output_path(),
            preview_max_width: output.preview_max_width,
            preview_max_height: output.preview_max_height,
        }
    }

    /// Remember the source face image, replacing any earlier choice
    pub fn set_source(&mut self, path: PathBuf) {
        log::info!("Source image: {}", path.display());
        self.source = Some(path);
    }

    /// Remember the target image, replacing any earlier choice
    pub fn set_target(&mut self, path: PathBuf) {
        log::info!("Target image: {}", path.display());
        self.target = Some(path);
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Apply changed output settings to subsequent swaps
    pub fn update_output(&mut self, output: &OutputConfig) {
        self.output_path = output.output_path();
        self.preview_max_width = output.preview_max_width;
        self.preview_max_height = output.preview_max_height;
    }

    pub fn state(&self) -> SessionState {
        match (&self.source, &self.target) {
            (None, None) => SessionState::Empty,
            (Some(_), None) => SessionState::SourceOnly,
            (None, Some(_)) => SessionState::TargetOnly,
            (Some(_), Some(_)) => SessionState::BothLoaded,
        }
    }

    /// Run the full swap for the current session.
    ///
    /// Blocks until inference and file output are done.
    pub fn swap(&mut self) -> SwapOutcome {
        let start = Instant::now();
        match self.try_swap() {
            Ok(outcome) => {
                match &outcome {
                    SwapOutcome::Swapped { output, .. } => log::info!(
                        "Swap finished in {:?}, saved to {}",
                        start.elapsed(),
                        output.display()
                    ),
                    SwapOutcome::MissingInput { source, target } => log::warn!(
                        "Swap requested without inputs (source missing: {}, target missing: {})",
                        source,
                        target
                    ),
                    SwapOutcome::NoFaceDetected { source, target } => log::warn!(
                        "No face detected (in source: {}, in target: {})",
                        source,
                        target
                    ),
                    SwapOutcome::Failed(_) => {}
                }
                outcome
            }
            Err(e) => {
                log::error!("Swap failed: {}", e);
                SwapOutcome::Failed(e)
            }
        }
    }

    fn try_swap(&mut self) -> Result<SwapOutcome> {
        let (source_path, target_path) = match (&self.source, &self.target) {
            (Some(source), Some(target)) => (source.clone(), target.clone()),
            (source, target) => {
                return Ok(SwapOutcome::MissingInput {
                    source: source.is_none(),
                    target: target.is_none(),
                })
            }
        };

        let source_image = imaging::load(&source_path)?;
        let target_image = imaging::load(&target_path)?;

        let source_faces = self.analyzer.detect(&source_image)?;
        let target_faces = self.analyzer.detect(&target_image)?;
        log::debug!(
            "Faces found: {} in source, {} in target",
            source_faces.len(),
            target_faces.len()
        );

        let source_face = first_face(&source_faces, "source");
        let target_face = first_face(&target_faces, "target");
        let (source_face, target_face) = match (source_face, target_face) {
            (Some(s), Some(t)) => (s, t),
            (s, t) => {
                return Ok(SwapOutcome::NoFaceDetected {
                    source: s.is_none(),
                    target: t.is_none(),
                })
            }
        };

        let result = self.swapper.swap(&target_image, target_face, source_face)?;
        imaging::save(&result, &self.output_path)?;

        // preview is built from what actually landed on disk
        let written = imaging::load(&self.output_path)?;
        let preview = imaging::thumbnail(&written, self.preview_max_width, self.preview_max_height);

        Ok(SwapOutcome::Swapped {
            output: self.output_path.clone(),
            preview,
        })
    }
}

/// The face a swap uses: the first (highest-scoring) detection
fn first_face<'a>(faces: &'a [Face], role: &str) -> Option<&'a Face> {
    if faces.len() > 1 {
        log::warn!(
            "{} faces detected in {} image; using the most confident one",
            faces.len(),
            role
        );
    }
    faces.first()
}
