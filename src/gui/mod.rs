//! Desktop window built on eframe/egui.

pub mod app;
