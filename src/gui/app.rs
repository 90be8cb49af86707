//! # Face Swapper GUI Application Module
//!
//! The main window: two file-selection actions, the swap action, an inline
//! result preview and a settings window. Rendering follows egui's immediate
//! mode model, so the whole UI is rebuilt from `SwapperApp` state each frame.
//!
//! ## Outcome Presentation
//!
//! The orchestrator reports a [`SwapOutcome`]; this module alone decides how
//! each outcome is shown. Every outcome opens a message dialog, and failures
//! are also appended to the error log file.
//!
//! All work, including inference, runs inside the click handler on the UI
//! thread. The window is unresponsive for the duration of a swap.

use crate::config::AppConfig;
use crate::constants::IMAGE_EXTENSIONS;
use crate::faces::{FaceAnalyzer, FaceSwapper};
use crate::imaging;
use crate::logger::{self, log};
use crate::orchestrator::{Orchestrator, SwapOutcome};
use eframe::egui;
use egui::{Button, CentralPanel, Color32, RichText, TopBottomPanel};
use image::RgbImage;
use std::path::{Path, PathBuf};

const BUTTON_SIZE: [f32; 2] = [300.0, 34.0];
const SWAP_GREEN: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

fn wide_button(text: &str) -> Button<'static> {
    Button::new(RichText::new(text).size(14.0)).min_size(BUTTON_SIZE.into())
}

/// Severity of a message dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// A modal-style message shown in the middle of the window
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Info,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Warning,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }

    /// Message dialog for a swap outcome
    pub fn for_outcome(outcome: &SwapOutcome) -> Self {
        match outcome {
            SwapOutcome::Swapped { output, .. } => Dialog::info(
                "Success",
                format!("Face swapped! Saved as: {}", output.display()),
            ),
            SwapOutcome::MissingInput { .. } => Dialog::warning(
                "Missing Images",
                "Please load both source and target images.",
            ),
            SwapOutcome::NoFaceDetected { source, target } => {
                let which = match (source, target) {
                    (true, true) => "either image",
                    (true, false) => "the source image",
                    _ => "the target image",
                };
                Dialog::error(
                    "No Faces Detected",
                    format!(
                        "No face was found in {}. Make sure both images contain clear faces.",
                        which
                    ),
                )
            }
            SwapOutcome::Failed(e) => Dialog::error("Error", e.to_string()),
        }
    }
}

/// Which input a file chooser is picking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Source,
    Target,
}

impl Slot {
    fn label(self) -> &'static str {
        match self {
            Slot::Source => "Source",
            Slot::Target => "Target",
        }
    }
}

/// Main application state
pub struct SwapperApp<A, S> {
    /// Session paths and the injected inference services
    orchestrator: Orchestrator<A, S>,

    /// Settings as edited in the settings window
    config: AppConfig,

    /// Unsaved edits in the settings window
    config_changed: bool,

    show_settings: bool,

    /// Decoded preview waiting to be uploaded as a texture
    pending_preview: Option<RgbImage>,

    preview_texture: Option<egui::TextureHandle>,

    /// Output of the last successful swap
    last_output: Option<PathBuf>,

    dialog: Option<Dialog>,
}

impl<A: FaceAnalyzer, S: FaceSwapper> SwapperApp<A, S> {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        orchestrator: Orchestrator<A, S>,
        config: AppConfig,
    ) -> Self {
        Self {
            orchestrator,
            config,
            config_changed: false,
            show_settings: false,
            pending_preview: None,
            preview_texture: None,
            last_output: None,
            dialog: None,
        }
    }

    /// Open a file chooser and store the selection; cancel changes nothing
    fn pick_image(&mut self, slot: Slot) {
        let picked = rfd::FileDialog::new()
            .set_title(format!("Select {} Image", slot.label()))
            .add_filter("Image files", IMAGE_EXTENSIONS)
            .pick_file();

        let Some(path) = picked else {
            log::debug!("{} selection cancelled", slot.label());
            return;
        };

        if !imaging::is_supported_image(&path) {
            self.dialog = Some(Dialog::error(
                "Unsupported File",
                format!("{} is not a PNG or JPEG image.", path.display()),
            ));
            return;
        }

        self.dialog = Some(Dialog::info(
            &format!("{} Loaded", slot.label()),
            format!("Loaded: {}", path.display()),
        ));
        match slot {
            Slot::Source => self.orchestrator.set_source(path),
            Slot::Target => self.orchestrator.set_target(path),
        }
    }

    /// Run the swap and present its outcome
    fn run_swap(&mut self) {
        let outcome = self.orchestrator.swap();
        self.dialog = Some(Dialog::for_outcome(&outcome));

        match outcome {
            SwapOutcome::Swapped { output, preview } => {
                self.pending_preview = Some(preview);
                self.last_output = Some(output);
            }
            SwapOutcome::Failed(e) => {
                let log_path = self.config.output.error_log_path();
                if let Err(io) = logger::append_error_log(&log_path, "swap", &e.to_string()) {
                    log::error!("Could not write {}: {}", log_path.display(), io);
                }
            }
            SwapOutcome::MissingInput { .. } | SwapOutcome::NoFaceDetected { .. } => {}
        }
    }

    fn save_config(&mut self) {
        self.orchestrator.update_output(&self.config.output);
        match self.config.save() {
            Ok(()) => {
                self.config_changed = false;
                log::info!("Configuration saved");
            }
            Err(e) => {
                log::error!("Failed to save configuration: {}", e);
                self.dialog = Some(Dialog::error(
                    "Settings",
                    format!("Could not save settings: {}", e),
                ));
            }
        }
    }

    fn upload_preview(&mut self, ctx: &egui::Context) {
        if let Some(preview) = self.pending_preview.take() {
            let size = [preview.width() as usize, preview.height() as usize];
            let color = egui::ColorImage::from_rgb(size, preview.as_raw());
            let texture = ctx.load_texture("result-preview", color, egui::TextureOptions::LINEAR);
            self.preview_texture = Some(texture);
        }
    }

    fn path_label(ui: &mut egui::Ui, label: &str, path: Option<&Path>) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(label).strong());
            match path {
                Some(p) => ui.label(p.display().to_string()),
                None => ui.label(RichText::new("not selected").italics().color(Color32::GRAY)),
            };
        });
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let mut close = false;

        egui::Window::new(dialog.title.as_str())
            .id(egui::Id::new("message_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let text = RichText::new(&dialog.message);
                match dialog.kind {
                    DialogKind::Info => ui.label(text),
                    DialogKind::Warning => {
                        ui.label(text.color(Color32::from_rgb(0xF5, 0x7C, 0x00)))
                    }
                    DialogKind::Error => ui.label(text.color(Color32::from_rgb(0xD3, 0x2F, 0x2F))),
                };
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.dialog = None;
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = true;

        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .default_width(420.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Output");
                ui.add_space(5.0);
                egui::Grid::new("output_settings").num_columns(2).show(ui, |ui| {
                    ui.label("Result file:");
                    if ui.text_edit_singleline(&mut self.config.output.file_name).changed() {
                        self.config_changed = true;
                    }
                    ui.end_row();

                    ui.label("Preview width:");
                    if ui
                        .add(
                            egui::DragValue::new(&mut self.config.output.preview_max_width)
                                .range(50..=2000),
                        )
                        .changed()
                    {
                        self.config_changed = true;
                    }
                    ui.end_row();

                    ui.label("Preview height:");
                    if ui
                        .add(
                            egui::DragValue::new(&mut self.config.output.preview_max_height)
                                .range(50..=2000),
                        )
                        .changed()
                    {
                        self.config_changed = true;
                    }
                    ui.end_row();
                });

                ui.add_space(10.0);
                ui.heading("Inference");
                if ui
                    .checkbox(
                        &mut self.config.execution.prefer_accelerated,
                        "Try GPU acceleration first",
                    )
                    .on_hover_text("Takes effect on next start")
                    .changed()
                {
                    self.config_changed = true;
                }
                ui.small(format!("Models: {}", self.config.models.directory.display()));

                ui.add_space(10.0);
                ui.separator();
                ui.horizontal(|ui| {
                    let valid_name =
                        imaging::is_supported_image(Path::new(&self.config.output.file_name));
                    let can_save = self.config_changed && valid_name;
                    if ui
                        .add_enabled(can_save, Button::new("💾 Save"))
                        .on_disabled_hover_text("Result file must end in .png, .jpg or .jpeg")
                        .clicked()
                    {
                        self.save_config();
                    }
                });
            });

        if !open {
            self.show_settings = false;
        }
    }
}

impl<A: FaceAnalyzer, S: FaceSwapper> eframe::App for SwapperApp<A, S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.upload_preview(ctx);
        let idle = self.dialog.is_none();

        TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("State: {:?}", self.orchestrator.state())).small());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("⚙ Settings")
                        .on_hover_text("Output and inference settings")
                        .clicked()
                    {
                        self.show_settings = true;
                    }
                    if self.config_changed {
                        ui.colored_label(Color32::GRAY, "●");
                    } else {
                        ui.colored_label(Color32::GREEN, "●");
                    }
                });
            });
        });

        CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.label(RichText::new("AI Face Swapper").size(24.0).strong());
                ui.add_space(20.0);

                if ui
                    .add_enabled(idle, wide_button("Load Source Face"))
                    .clicked()
                {
                    self.pick_image(Slot::Source);
                }
                ui.add_space(5.0);
                if ui
                    .add_enabled(idle, wide_button("Load Target Image"))
                    .clicked()
                {
                    self.pick_image(Slot::Target);
                }
                ui.add_space(15.0);
                let swap = Button::new(RichText::new("Swap Faces").size(14.0).color(Color32::WHITE))
                    .fill(SWAP_GREEN)
                    .min_size(BUTTON_SIZE.into());
                if ui.add_enabled(idle, swap).clicked() {
                    self.run_swap();
                }

                ui.add_space(10.0);
                Self::path_label(ui, "Source:", self.orchestrator.source());
                Self::path_label(ui, "Target:", self.orchestrator.target());

                ui.add_space(20.0);
                match &self.preview_texture {
                    Some(texture) => {
                        ui.image((texture.id(), texture.size_vec2()));
                        if let Some(output) = &self.last_output {
                            ui.add_space(5.0);
                            if ui
                                .button("Open Result")
                                .on_hover_text(output.display().to_string())
                                .clicked()
                            {
                                if let Err(e) = webbrowser::open(&output.to_string_lossy()) {
                                    log::error!("Failed to open result: {}", e);
                                }
                            }
                        }
                    }
                    None => {
                        ui.label(
                            RichText::new("Result preview will appear here").color(Color32::GRAY),
                        );
                    }
                }
            });
        });

        if self.show_settings {
            self.show_settings_window(ctx);
        }
        self.show_dialog(ctx);
    }
}
