//! Enumeration of the framework sources tracked by the web build cache.
//!
//! The tracked set is fixed: the `.cpp` files directly under the core,
//! graphics, text and font modules, everything under `ui/` recursively,
//! plus the three web platform-integration files. Both the staleness check
//! and the cache rebuild iterate exactly this set.

use crate::locate::SourceTree;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MODULE_DIRS: [&str; 4] = ["core", "graphics", "text", "font"];

const PLATFORM_FILES: [&str; 3] = [
    "platform/web_renderer.cpp",
    "platform/platform_factory.cpp",
    "fern.cpp",
];

fn is_cpp(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("cpp")
}

/// Every framework source file that feeds the cached web library, in a
/// deterministic order.
pub fn tracked_sources(tree: &SourceTree) -> io::Result<Vec<PathBuf>> {
    let src = tree.src_dir();
    let mut files = Vec::new();

    for module in MODULE_DIRS {
        let dir = src.join(module);
        if !dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_cpp(path))
            .collect();
        entries.sort();
        files.extend(entries);
    }

    // Widgets and layout code nest below ui/, so that one is walked
    // recursively.
    let ui = src.join("ui");
    if ui.is_dir() {
        files.extend(
            WalkDir::new(&ui)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_cpp(path)),
        );
    }

    for rel in PLATFORM_FILES {
        let path = src.join(rel);
        if path.is_file() {
            files.push(path);
        } else {
            tracing::warn!("Platform source missing: {}", path.display());
        }
    }

    Ok(files)
}
