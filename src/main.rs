//! Application entry point.
//!
//! Startup order: logging, configuration, model provisioning, inference
//! services (accelerated context first, CPU as fallback), then the window.
//! Any startup failure is logged, appended to the fatal error log and
//! reported through a non-zero exit status.

use eframe::egui::ViewportBuilder;
use faceswapper::config::AppConfig;
use faceswapper::faces::{init_with_fallback, ExecutionContext, InSwapper, OnnxFaceAnalyzer};
use faceswapper::gui::app::SwapperApp;
use faceswapper::logger::{self, log};
use faceswapper::orchestrator::Orchestrator;
use faceswapper::provision;
use std::process::ExitCode;

const APP_TITLE: &str = "AI Face Swapper";

fn main() -> ExitCode {
    if let Err(e) = logger::init_logger() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let config = AppConfig::load();
    let fatal_log = config.output.fatal_error_log_path();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal error: {}", e);
            eprintln!("Fatal error: {}", e);
            if let Err(io) = logger::append_error_log(&fatal_log, "startup", &e.to_string()) {
                eprintln!("Could not write {}: {}", fatal_log.display(), io);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let models = &config.models;
    let swapper_path = provision::ensure_model(&models.swapper, &models.directory)?;
    let detector_path = provision::ensure_model(&models.detector, &models.directory)?;
    let recognizer_path = provision::ensure_model(&models.recognizer, &models.directory)?;

    let preferred = if config.execution.prefer_accelerated {
        ExecutionContext::Accelerated
    } else {
        ExecutionContext::Default
    };
    let threads = config.execution.effective_threads();

    let (analyzer, context) = init_with_fallback(preferred, ExecutionContext::Default, |ctx| {
        OnnxFaceAnalyzer::new(
            &detector_path,
            &recognizer_path,
            ctx,
            threads,
            config.detection.clone(),
        )
    })?;
    log::info!("Face analysis running on {} context", context);

    let (swapper, context) = init_with_fallback(context, ExecutionContext::Default, |ctx| {
        InSwapper::new(&swapper_path, ctx, threads)
    })?;
    log::info!("Face swapper running on {} context", context);

    let orchestrator = Orchestrator::new(analyzer, swapper, &config.output);

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size((config.window.width, config.window.height))
            .with_min_inner_size((400.0, 500.0))
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(SwapperApp::new(cc, orchestrator, config)))),
    )?;
    Ok(())
}
