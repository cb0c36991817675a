// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! Chemdraft - Main Entry Point
//!
//! A chemical formula editor with live mhchem preview and clipboard export.
//! Built with Rust and egui.

mod app;
mod config;
mod error;
mod export;
mod presets;
mod preview;
mod render;
mod shell;
mod state;
#[cfg(test)]
mod testing;
mod ui;

use app::{ChemdraftApp, WINDOW_TITLE};
use config::load_config;
use log::info;

/// Application name constant.
const APP_NAME: &str = "Chemdraft";

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    // Load settings to get window configuration
    let settings = load_config();
    let window_size = &settings.window_size;

    info!(
        "Window configuration: {}x{}, maximized: {}",
        window_size.width, window_size.height, window_size.maximized
    );

    let viewport = eframe::egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([window_size.width, window_size.height])
        .with_min_inner_size([600.0, 400.0]);

    // Apply position if saved
    let viewport = if let (Some(x), Some(y)) = (window_size.x, window_size.y) {
        viewport.with_position([x, y])
    } else {
        viewport
    };

    // Apply maximized state
    let viewport = if window_size.maximized {
        viewport.with_maximized(true)
    } else {
        viewport
    };

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(ChemdraftApp::new(cc, settings)))),
    )
}
