//! Subcommand implementations.
//!
//! Each command returns the text to print so it can be checked in tests.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use meme_core::{CanvasDocument, JsonDirStore, MemeLibrary, SaveRequest};
use meme_renderer::{ExportConfig, ExportOptions, Exporter};

use crate::cli::{export_options, CliConfig, Command};

/// Run one subcommand.
///
/// # Errors
///
/// Returns an error if the document cannot be read, the export fails or the
/// library rejects the operation.
pub async fn run(config: &CliConfig, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Export {
            document,
            format,
            quality,
            transparent,
        } => {
            let options = export_options(format, quality, transparent);
            export(config, &document, &options).await
        }
        Command::Save {
            document,
            owner,
            title,
            description,
            tags,
            public,
        } => {
            let request = SaveRequest {
                title,
                description,
                tags,
                is_public: public,
            };
            save(config, &document, &owner, &request).await
        }
        Command::List { owner, json } => list(config, &owner, json),
        Command::Delete { id } => delete(config, &id),
    }
}

/// Read and parse a document JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub async fn load_document(path: &Path) -> anyhow::Result<CanvasDocument> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let document = CanvasDocument::from_json(&json)
        .with_context(|| format!("Invalid document {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        elements = document.element_count(),
        "document loaded"
    );
    Ok(document)
}

fn library(config: &CliConfig) -> anyhow::Result<MemeLibrary> {
    let store = JsonDirStore::open(&config.data_dir).with_context(|| {
        format!(
            "Failed to open meme library at {}",
            config.data_dir.display()
        )
    })?;
    Ok(MemeLibrary::new(Arc::new(store)))
}

/// Export `document_path` and write the image into the output directory.
///
/// # Errors
///
/// Returns an error if loading, rendering or writing fails.
pub async fn export(
    config: &CliConfig,
    document_path: &Path,
    options: &ExportOptions,
) -> anyhow::Result<String> {
    let document = load_document(document_path).await?;
    let exporter = Exporter::new(ExportConfig {
        image_timeout: config.image_timeout,
        ..ExportConfig::default()
    })?;

    let artifact = exporter
        .export(&document, options)
        .await
        .with_context(|| format!("Failed to export {}", document_path.display()))?;
    let path = artifact.write_to_dir(&config.out_dir).await?;

    Ok(format!(
        "Wrote {} ({}x{}, {}, {} bytes)",
        path.display(),
        artifact.width,
        artifact.height,
        artifact.content_type,
        artifact.bytes.len()
    ))
}

/// Save `document_path` to the library.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or the save is rejected.
pub async fn save(
    config: &CliConfig,
    document_path: &Path,
    owner: &str,
    request: &SaveRequest,
) -> anyhow::Result<String> {
    let document = load_document(document_path).await?;
    let record = library(config)?.save(owner, &document, request)?;
    Ok(format!("Saved {} \"{}\"", record.id, record.title))
}

/// List an owner's memes.
///
/// # Errors
///
/// Returns an error if the library cannot be read.
pub fn list(config: &CliConfig, owner: &str, json: bool) -> anyhow::Result<String> {
    let records = library(config)?.list(owner)?;
    if json {
        return Ok(serde_json::to_string_pretty(&records)?);
    }

    let mut out = String::new();
    for record in &records {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            record.id,
            record.title,
            if record.is_public { "public" } else { "private" },
            record.tags.join(",")
        );
    }
    if records.is_empty() {
        out.push_str("No memes saved yet\n");
    }
    Ok(out)
}

/// Delete a meme by id.
///
/// # Errors
///
/// Returns an error if no meme has this id.
pub fn delete(config: &CliConfig, id: &str) -> anyhow::Result<String> {
    library(config)?.delete(id)?;
    Ok(format!("Deleted {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use meme_core::ShapeKind;
    use meme_renderer::{ExportFormat, Quality};

    fn config(root: &Path) -> CliConfig {
        CliConfig {
            data_dir: root.join("memes"),
            out_dir: root.join("out"),
            image_timeout: Duration::from_millis(500),
        }
    }

    fn write_document(root: &Path) -> std::path::PathBuf {
        let doc = CanvasDocument::new(40, 30);
        let doc = doc.with_element(doc.create_shape(ShapeKind::Rectangle));
        let path = root.join("doc.json");
        std::fs::write(&path, doc.to_json().expect("json")).expect("write");
        path
    }

    #[tokio::test]
    async fn test_export_writes_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        let doc = write_document(dir.path());

        let options = ExportOptions {
            format: ExportFormat::Jpeg,
            quality: Quality::Medium,
            transparent: false,
        };
        let report = export(&config, &doc, &options).await.expect("export");
        assert!(report.contains("80x60"));
        assert!(report.contains("image/jpeg"));

        let written: Vec<_> = std::fs::read_dir(&config.out_dir)
            .expect("out dir")
            .filter_map(Result::ok)
            .collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("meme-") && name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_export_missing_document_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        let err = export(&config, &dir.path().join("nope.json"), &ExportOptions::default())
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("Failed to read document"));
    }

    #[tokio::test]
    async fn test_save_list_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        let doc = write_document(dir.path());

        let request = SaveRequest {
            title: "Box".to_string(),
            tags: "shapes, blue".to_string(),
            is_public: true,
            ..SaveRequest::default()
        };
        let report = save(&config, &doc, "alice", &request).await.expect("save");
        assert!(report.starts_with("Saved meme-"));

        let listing = list(&config, "alice", false).expect("list");
        assert!(listing.contains("Box\tpublic\tshapes,blue"));
        let id = listing.split('\t').next().expect("id").to_string();

        let json = list(&config, "alice", true).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));

        assert_eq!(
            list(&config, "bob", false).expect("list"),
            "No memes saved yet\n"
        );

        delete(&config, &id).expect("delete");
        assert!(delete(&config, &id).is_err());
    }

    #[tokio::test]
    async fn test_save_blank_title_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        let doc = write_document(dir.path());

        let err = save(&config, &doc, "alice", &SaveRequest::titled("  "))
            .await
            .expect_err("blank title");
        assert!(err.to_string().contains("Please enter a title"));
        assert!(list(&config, "alice", false)
            .expect("list")
            .contains("No memes"));
    }
}
