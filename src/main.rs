//! spritecmd CLI
//!
//! Command-line interface for the sprite command engine.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use spritecmd::cli::commands::{self, DropTarget};
use spritecmd::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("spritecmd v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => {
            let result = handle_command(cmd);
            if let Err(err) = &result {
                if let Some(hint) = commands::recovery_hint(err) {
                    eprintln!("Hint: {}", hint);
                }
            }
            result
        }
        None => {
            println!("spritecmd v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Drop {
            doc,
            files,
            frame,
            layer,
            before,
            config,
            output,
            history,
        } => commands::drop_files(
            &doc,
            &files,
            DropTarget {
                frame,
                layer,
                before,
            },
            config.as_deref(),
            output.as_deref(),
            history.as_deref(),
        )
        .with_context(|| format!("dropping files onto {}", doc.display())),
        Commands::Tree { doc } => {
            commands::print_tree(&doc).with_context(|| format!("reading {}", doc.display()))
        }
        Commands::Roundtrip {
            doc,
            files,
            frame,
            layer,
            before,
        } => commands::roundtrip(
            &doc,
            &files,
            DropTarget {
                frame,
                layer,
                before,
            },
        )
        .with_context(|| format!("round-tripping a drop onto {}", doc.display())),
        Commands::Palette { path } => commands::print_palette(&path)
            .with_context(|| format!("reading palette {}", path.display())),
    }
}
