//! # Meme CLI
//!
//! Command-line front end for Memeforge.
//!
//! ```text
//! memeforge export doc.json --format png --quality high [--transparent]
//! memeforge save doc.json --owner <id> --title <title> [--tags a,b] [--public]
//! memeforge list --owner <id> [--json]
//! memeforge delete <meme-id>
//! ```
//!
//! Documents are the JSON form of [`meme_core::CanvasDocument`]. Saved memes
//! live as one JSON file per record under `--data-dir`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;

pub use cli::{export_options, CliArgs, CliConfig, Command, FormatArg, QualityArg};
pub use commands::{load_document, run};
