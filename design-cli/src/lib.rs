//! # Design Canvas CLI
//!
//! Command-line host for the print canvas editor.
//!
//! ## Usage
//!
//! ```bash
//! design-canvas validate design.json
//! design-canvas export design.json --format pdf --out-dir out/
//! design-canvas surfaces tent all-sides
//! design-canvas render tent canopy-only placements.json --out-dir thumbs/
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved configuration handed to the commands
//! - `commands` - One async function per subcommand

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use design_renderer::ExportFormat;

/// Command-line arguments for design-canvas.
#[derive(Debug, Clone, Parser)]
#[command(name = "design-canvas")]
#[command(about = "Validate, export and render print canvas designs")]
#[command(version)]
pub struct CliArgs {
    /// Directory output files are written to
    #[arg(long, global = true, env = "DESIGN_CANVAS_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Directory relative image sources resolve against
    #[arg(long, global = true, env = "DESIGN_CANVAS_ASSETS_DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Skip loading system fonts (text will not render)
    #[arg(long, global = true)]
    pub no_system_fonts: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check a design document or template against the document contract
    Validate {
        /// Path to the JSON file
        file: PathBuf,
        /// Treat the file as a template (`canvasData` plus metadata)
        #[arg(long)]
        template: bool,
    },
    /// Export a design document as an image or PDF
    Export {
        /// Path to the document JSON
        file: PathBuf,
        /// Output format: png, jpg, pdf or svg
        #[arg(long, env = "DESIGN_CANVAS_FORMAT", default_value = "png")]
        format: ExportFormat,
        /// JPEG quality from 0 to 1
        #[arg(long)]
        quality: Option<f32>,
        /// Pixel ratio applied to the canvas size
        #[arg(long)]
        scale: Option<f32>,
        /// Background color override
        #[arg(long)]
        background: Option<String>,
    },
    /// List the surfaces of a product for a coverage option
    Surfaces {
        /// Product type (tin, tent)
        product: String,
        /// Coverage option, e.g. canopy-only
        coverage: String,
    },
    /// Render one PNG per product surface
    Render {
        /// Product type (tin, tent)
        product: String,
        /// Coverage option, e.g. canopy-only
        coverage: String,
        /// JSON object mapping surface keys to element arrays
        placements: PathBuf,
        /// Background color painted under every surface
        #[arg(long, default_value = design_core::DEFAULT_BACKGROUND)]
        background: String,
    },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Output directory.
    pub out_dir: PathBuf,
    /// Base directory for relative image sources.
    pub assets_dir: Option<PathBuf>,
    /// Load system fonts for text rendering.
    pub load_system_fonts: bool,
    /// The command to run.
    pub command: Command,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            out_dir: args.out_dir,
            assets_dir: args.assets_dir,
            load_system_fonts: !args.no_system_fonts,
            command: args.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_args() {
        let args = CliArgs::try_parse_from([
            "design-canvas",
            "export",
            "design.json",
            "--format",
            "jpeg",
            "--quality",
            "0.5",
            "--out-dir",
            "/tmp/out",
        ])
        .expect("parse");
        let config = CliConfig::from(args);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/out"));
        assert!(config.load_system_fonts);
        let Command::Export {
            format, quality, ..
        } = config.command
        else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::Jpg);
        assert_eq!(quality, Some(0.5));
    }

    #[test]
    fn test_parse_render_args() {
        let args = CliArgs::try_parse_from([
            "design-canvas",
            "--no-system-fonts",
            "render",
            "tent",
            "canopy-only",
            "placements.json",
        ])
        .expect("parse");
        let config = CliConfig::from(args);
        assert!(!config.load_system_fonts);
        assert!(matches!(
            config.command,
            Command::Render { ref background, .. } if background == "#ffffff"
        ));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result =
            CliArgs::try_parse_from(["design-canvas", "export", "d.json", "--format", "bmp"]);
        assert!(result.is_err());
    }
}
