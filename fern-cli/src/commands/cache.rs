//! Web library cache management.

use crate::CacheCommands;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use fern_core::{cache, locate};
use std::fs;

pub fn cache(command: CacheCommands) -> Result<()> {
    match command {
        CacheCommands::Status => status(),
        CacheCommands::Clear => clear(),
        CacheCommands::Rebuild => rebuild(),
    }
}

fn library_cache() -> Result<cache::LibraryCache> {
    Ok(cache::LibraryCache::at_default(
        cache::WebToolchain::default(),
    )?)
}

fn status() -> Result<()> {
    let library_cache = library_cache()?;
    let artifact = library_cache.artifact_path();

    let Ok(meta) = fs::metadata(&artifact) else {
        println!("Web library cache not found");
        println!("  Expected file: {}", artifact.display());
        println!("  It will be created automatically on the first web build");
        return Ok(());
    };

    let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
    println!("✓ Web library cache is available");
    println!("  Location: {}", library_cache.dir().display());
    println!("  Size: {size_mb:.1} MB");
    if let Ok(modified) = meta.modified() {
        let stamp: DateTime<Local> = modified.into();
        println!("  Last modified: {}", stamp.format("%Y-%m-%d %H:%M:%S"));
    }

    match locate::locate_source() {
        Ok(tree) => {
            println!("  Source: {}", tree.root().display());
            if cache::is_stale(&artifact, &tree)? {
                println!("⚠ Cache is outdated (source files newer than cache)");
                println!("  It will be rebuilt automatically on the next web build");
            } else {
                println!("✓ Cache is up to date");
            }
        }
        Err(_) => {
            println!("⚠ Fern source not found; freshness cannot be checked");
        }
    }
    Ok(())
}

fn clear() -> Result<()> {
    let library_cache = library_cache()?;
    if !library_cache.dir().exists() {
        println!("Cache directory does not exist, nothing to clear");
        return Ok(());
    }
    library_cache.clear().context("Failed to clear cache")?;
    println!("✓ Web library cache cleared");
    println!("  It will be recreated automatically on the next web build");
    Ok(())
}

fn rebuild() -> Result<()> {
    let toolchain = cache::WebToolchain::default();
    toolchain.probe()?;

    let tree = locate::locate_source()?;
    let library_cache = library_cache()?;
    library_cache.clear().context("Failed to clear cache")?;

    let artifact = library_cache.rebuild(&tree)?;
    println!("  Location: {}", artifact.display());
    Ok(())
}
