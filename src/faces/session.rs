//! ONNX Runtime session creation and execution context fallback.

use crate::error::{Result, SwapError};
use crate::logger::log;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::fmt;
use std::path::Path;

/// Compute backend for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// CUDA; registration fails loudly when unavailable
    Accelerated,
    /// CPU, always available
    Default,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Accelerated => write!(f, "accelerated (CUDA)"),
            ExecutionContext::Default => write!(f, "default (CPU)"),
        }
    }
}

/// Try `init` with `preferred`; on failure retry exactly once with
/// `fallback`. Returns the value together with the context that worked.
///
/// When both contexts are the same there is nothing to fall back to and the
/// first error is returned.
pub fn init_with_fallback<T, E, F>(
    preferred: ExecutionContext,
    fallback: ExecutionContext,
    mut init: F,
) -> std::result::Result<(T, ExecutionContext), E>
where
    F: FnMut(ExecutionContext) -> std::result::Result<T, E>,
    E: fmt::Display,
{
    match init(preferred) {
        Ok(value) => Ok((value, preferred)),
        Err(e) if preferred != fallback => {
            log::warn!(
                "Initialization with {} context failed ({}); retrying with {}",
                preferred,
                e,
                fallback
            );
            init(fallback).map(|value| (value, fallback))
        }
        Err(e) => Err(e),
    }
}

/// Load an ONNX model on the given execution context
pub fn build_session(
    model_path: &Path,
    context: ExecutionContext,
    threads: usize,
) -> Result<Session> {
    let provider = match context {
        ExecutionContext::Accelerated => {
            CUDAExecutionProvider::default().build().error_on_failure()
        }
        ExecutionContext::Default => CPUExecutionProvider::default().build(),
    };

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(builder_err)?
        .with_intra_threads(threads)
        .map_err(builder_err)?
        .with_execution_providers([provider])
        .map_err(builder_err)?
        .commit_from_file(model_path)
        .map_err(|e| {
            SwapError::Model(format!("failed to load {}: {}", model_path.display(), e))
        })?;

    log::info!("Loaded {} on {} context", model_path.display(), context);
    Ok(session)
}

fn builder_err<E: fmt::Display>(e: E) -> SwapError {
    SwapError::Model(format!("session builder: {}", e))
}

/// Name of the `index`-th input of a session
pub(crate) fn input_name(session: &Session, index: usize) -> Result<String> {
    session
        .inputs
        .get(index)
        .map(|input| input.name.clone())
        .ok_or_else(|| SwapError::Model(format!("model has no input #{}", index)))
}
