use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::model::{SourceEntry, SourceFormat, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        for source in &manifest.sources {
            info!(
                file = %source.filename,
                format = ?source.format,
                bytes = source.bytes,
                "source"
            );
        }
        info!(
            source_count = manifest.source_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.source_dir
            .join("manifests")
            .join("source_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path) -> Result<SourceInventoryManifest> {
    let mut paths = discover_sources(source_dir)?;
    paths.sort_by(|left, right| left.0.cmp(&right.0));

    if paths.is_empty() {
        bail!("no PDF or XML sources found in {}", source_dir.display());
    }

    let mut sources = Vec::with_capacity(paths.len());
    for (path, format) in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let (sha256, bytes) = sha256_file(&path)?;
        if bytes == 0 {
            warn!(file = %filename, "source file is empty");
        }

        sources.push(SourceEntry {
            filename,
            format,
            bytes,
            sha256,
        });
    }

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        source_count: sources.len(),
        sources,
    })
}

fn discover_sources(source_dir: &Path) -> Result<Vec<(PathBuf, SourceFormat)>> {
    let mut sources = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(SourceFormat::from_extension);

        if let Some(format) = format {
            sources.push((path, format));
        }
    }

    Ok(sources)
}
