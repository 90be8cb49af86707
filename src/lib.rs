//! # FaceSwapper - Single-Face Image Swapping
//!
//! A desktop tool that replaces the face in a target photo with the identity
//! of a face from a source photo, using ONNX models for detection,
//! recognition and swapping.
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────────────────────┐
//! │    GUI    │──►│ Orchestrator │──►│ faces                    │
//! │  (egui)   │   │  session +   │   │ • SCRFD detector         │
//! │           │◄──│  SwapOutcome │   │ • ArcFace recognizer     │
//! └───────────┘   └──────────────┘   │ • InSwapper + paste-back │
//!       │                │           └──────────────────────────┘
//!       ▼                ▼
//!   config.toml     imaging (load / save / thumbnail)
//! ```
//!
//! Model files are provisioned by [`provision`] before the window opens.

pub mod config;
pub mod constants;
pub mod error;
pub mod faces;
pub mod gui;
pub mod imaging;
pub mod logger;
pub mod orchestrator;
pub mod provision;
