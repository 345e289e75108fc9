//! Command-line arguments and the configuration derived from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use meme_renderer::{ExportFormat, ExportOptions, Quality};

/// Command-line arguments for memeforge.
#[derive(Debug, Clone, Parser)]
#[command(name = "memeforge")]
#[command(about = "Export and manage meme canvas documents")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding saved meme records
    #[arg(long, env = "MEMEFORGE_DATA_DIR", default_value = "./memes")]
    pub data_dir: PathBuf,

    /// Directory exported images are written to
    #[arg(long, env = "MEMEFORGE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Time allowed for loading each image, in milliseconds
    #[arg(long, env = "MEMEFORGE_IMAGE_TIMEOUT_MS", default_value = "10000")]
    pub image_timeout_ms: u64,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a document JSON file to PNG or JPEG
    Export {
        /// Path to the document JSON
        document: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
        /// Output scale
        #[arg(long, value_enum, default_value_t = QualityArg::High)]
        quality: QualityArg,
        /// Leave the background transparent (PNG only)
        #[arg(long)]
        transparent: bool,
    },
    /// Save a document JSON file to the meme library
    Save {
        /// Path to the document JSON
        document: PathBuf,
        /// Owner identity
        #[arg(long)]
        owner: String,
        /// Meme title
        #[arg(long)]
        title: String,
        /// Meme description
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Make the meme public
        #[arg(long)]
        public: bool,
    },
    /// List an owner's saved memes, newest first
    List {
        /// Owner identity
        #[arg(long)]
        owner: String,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved meme
    Delete {
        /// Record id (`meme-...`)
        id: String,
    },
}

/// `--format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// PNG
    Png,
    /// JPEG
    #[value(alias = "jpeg")]
    Jpg,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Jpg => Self::Jpeg,
        }
    }
}

/// `--quality` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    /// 1x
    Low,
    /// 2x
    Medium,
    /// 3x
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Self::Low,
            QualityArg::Medium => Self::Medium,
            QualityArg::High => Self::High,
        }
    }
}

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding saved meme records.
    pub data_dir: PathBuf,
    /// Directory exported images are written to.
    pub out_dir: PathBuf,
    /// Time allowed for loading each image.
    pub image_timeout: Duration,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            out_dir: args.out_dir.clone(),
            image_timeout: Duration::from_millis(args.image_timeout_ms),
        }
    }
}

/// Build export options from the `export` subcommand flags.
#[must_use]
pub fn export_options(format: FormatArg, quality: QualityArg, transparent: bool) -> ExportOptions {
    ExportOptions {
        format: format.into(),
        quality: quality.into(),
        transparent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_defaults() {
        let args = CliArgs::try_parse_from(["memeforge", "export", "doc.json"]).expect("parse");
        match args.command {
            Command::Export {
                document,
                format,
                quality,
                transparent,
            } => {
                assert_eq!(document, PathBuf::from("doc.json"));
                assert_eq!(format, FormatArg::Png);
                assert_eq!(quality, QualityArg::High);
                assert!(!transparent);
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_export_flags() {
        let args = CliArgs::try_parse_from([
            "memeforge",
            "--out-dir",
            "/tmp/out",
            "--image-timeout-ms",
            "250",
            "export",
            "doc.json",
            "--format",
            "jpeg",
            "--quality",
            "low",
            "--transparent",
        ])
        .expect("parse");
        let config = CliConfig::from(&args);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.image_timeout, Duration::from_millis(250));

        let Command::Export {
            format,
            quality,
            transparent,
            ..
        } = args.command
        else {
            panic!("expected export");
        };
        let options = export_options(format, quality, transparent);
        assert_eq!(options.format, ExportFormat::Jpeg);
        assert_eq!(options.quality, Quality::Low);
        assert!(options.transparent);
    }

    #[test]
    fn test_save_requires_owner_and_title() {
        assert!(CliArgs::try_parse_from(["memeforge", "save", "doc.json"]).is_err());
        let args = CliArgs::try_parse_from([
            "memeforge", "save", "doc.json", "--owner", "u1", "--title", "Hi", "--tags", "a,b",
            "--public",
        ])
        .expect("parse");
        match args.command {
            Command::Save {
                owner,
                title,
                tags,
                public,
                description,
                ..
            } => {
                assert_eq!(owner, "u1");
                assert_eq!(title, "Hi");
                assert_eq!(tags, "a,b");
                assert_eq!(description, "");
                assert!(public);
            }
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_quality_rejected() {
        assert!(
            CliArgs::try_parse_from(["memeforge", "export", "d.json", "--quality", "ultra"])
                .is_err()
        );
    }

    #[test]
    fn test_delete_takes_id() {
        let args = CliArgs::try_parse_from(["memeforge", "delete", "meme-abc"]).expect("parse");
        assert!(matches!(args.command, Command::Delete { ref id } if id == "meme-abc"));
    }
}
