//! CLI Module
//!
//! Command-line interface driving the command engine on JSON sprite
//! documents.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// spritecmd - reversible sprite editing from the shell
#[derive(Parser, Debug)]
#[command(name = "spritecmd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drop sprite files onto a document's timeline
    #[command(name = "drop")]
    Drop {
        /// Destination sprite document
        doc: PathBuf,

        /// Files to merge, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Frame where the dropped content starts
        #[arg(short, long, default_value_t = 0)]
        frame: u32,

        /// Index of the reference layer (bottom layer is 0)
        #[arg(short, long, default_value_t = 0)]
        layer: usize,

        /// Insert below the reference layer instead of above it
        #[arg(long)]
        before: bool,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the result (defaults to the destination)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to save the action log in
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Print a document's layer listing
    #[command(name = "tree")]
    Tree {
        /// Sprite document
        doc: PathBuf,
    },

    /// Drop files, undo and redo, and compare fingerprints
    #[command(name = "roundtrip")]
    Roundtrip {
        /// Destination sprite document
        doc: PathBuf,

        /// Files to merge, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Frame where the dropped content starts
        #[arg(short, long, default_value_t = 0)]
        frame: u32,

        /// Index of the reference layer (bottom layer is 0)
        #[arg(short, long, default_value_t = 0)]
        layer: usize,

        /// Insert below the reference layer instead of above it
        #[arg(long)]
        before: bool,
    },

    /// Print the entries of a .col palette
    #[command(name = "palette")]
    Palette {
        /// Palette file
        path: PathBuf,
    },
}
