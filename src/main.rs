// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use live_scanner::{InterfaceOrientation, RecognitionLevel};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "live-scanner")]
#[command(about = "Scan barcodes from image files and inspect overlay geometry")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode barcodes in image files or directories
    Scan {
        /// Images or directories of images, processed in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Interface orientation the frames were captured in
        #[arg(short, long, default_value = "landscape-right")]
        orientation: InterfaceOrientation,

        /// Recognition level (fast, accurate)
        #[arg(short, long)]
        level: Option<RecognitionLevel>,
    },

    /// Project normalized rectangles onto a frame and print the overlay
    Project {
        /// Target frame size, e.g. 400x200
        #[arg(short, long)]
        frame: String,

        /// Normalized rectangle x,y,w,h (repeatable)
        #[arg(short, long = "rect", required = true)]
        rects: Vec<String>,

        /// Interface orientation
        #[arg(short, long, default_value = "landscape-right")]
        orientation: InterfaceOrientation,
    },

    /// Print the effective configuration
    Config {
        /// Write it back to the config file
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=live_scanner=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => live_scanner::config::default_config_path()?,
    };

    match cli.command {
        Commands::Scan {
            inputs,
            orientation,
            level,
        } => cli::scan_files(&config_path, inputs, orientation, level),
        Commands::Project {
            frame,
            rects,
            orientation,
        } => cli::project_rects(&config_path, &frame, &rects, orientation),
        Commands::Config { write } => cli::show_config(&config_path, write),
    }
}
