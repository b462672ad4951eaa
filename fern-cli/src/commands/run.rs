//! Build-and-run: the main entry point for project and single-file builds.

use crate::serve;
use anyhow::{bail, Context, Result};
use fern_core::{build, cache, locate, project, GlobalConfig, OutputKind, Platform};
use std::path::{Path, PathBuf};

const DEFAULT_PREVIEW_PORT: u16 = 8000;

/// Dispatch on presence of an entry file: with one, build that file alone;
/// without, build the surrounding project.
pub async fn run(
    config: &GlobalConfig,
    platform: Platform,
    file: Option<&Path>,
    port: Option<u16>,
) -> Result<()> {
    match file {
        Some(file) => run_single_file(config, platform, file, port).await,
        None => run_project(config, platform, port).await,
    }
}

async fn run_project(config: &GlobalConfig, platform: Platform, port: Option<u16>) -> Result<()> {
    let (root, entry) = resolve_project_entry()?;
    println!("Found Fern project at {}", root.display());
    println!("Building project for {platform}...");

    let build_dir = root.join("build");
    match platform {
        Platform::Native => {
            let output = build::build_native(&entry, &build_dir, config, OutputKind::Project)?;
            println!("✓ Build successful");
            run_executable(&output)
        }
        Platform::Web => {
            let output = build_web_entry(&entry, &build_dir, Some(&root), OutputKind::Project)?;
            println!("✓ Build successful");

            let port = port
                .or_else(|| project::ProjectConfig::load(&root).and_then(|c| c.web_port()))
                .unwrap_or(DEFAULT_PREVIEW_PORT);
            serve::serve(&build_dir, &file_name(&output), port).await
        }
    }
}

async fn run_single_file(
    config: &GlobalConfig,
    platform: Platform,
    file: &Path,
    port: Option<u16>,
) -> Result<()> {
    let cwd = locate::original_cwd();
    let entry = if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    };
    println!("Building {} for {platform}...", entry.display());

    let build_dir = cwd.join("build");
    match platform {
        Platform::Native => {
            let output = build::build_native(&entry, &build_dir, config, OutputKind::Disposable)?;
            println!("✓ Build successful");
            run_executable(&output)
        }
        Platform::Web => {
            let output = build_web_entry(&entry, &build_dir, None, OutputKind::Disposable)?;
            println!("✓ Build successful");

            let port = port.unwrap_or(DEFAULT_PREVIEW_PORT);
            serve::serve(&build_dir, &file_name(&output), port).await
        }
    }
}

/// The shared web build pipeline: entry validation, toolchain probe,
/// source location, cache ensure, then the entry-file compile+link.
pub(crate) fn build_web_entry(
    entry: &Path,
    build_dir: &Path,
    project_root: Option<&Path>,
    kind: OutputKind,
) -> Result<PathBuf> {
    // A bad entry path must fail here, before the toolchain probe and the
    // (potentially long) cached-library build.
    build::check_entry(entry)?;

    let toolchain = cache::WebToolchain::default();
    toolchain.probe()?;

    let tree = locate::locate_source()?;
    println!("Found Fern source at {}", tree.root().display());

    let library_cache = cache::LibraryCache::at_default(toolchain.clone())?;
    let library = library_cache.ensure(&tree)?;

    // A project's web/template.html wins; single-file builds look for a
    // template.html next to the caller.
    let local_template = match project_root {
        Some(root) => root.join("web").join("template.html"),
        None => locate::original_cwd().join("template.html"),
    };
    let shell = build::resolve_shell_template(&local_template);

    let output = build::build_web(entry, build_dir, &tree, &library, shell, kind, &toolchain)?;
    Ok(output)
}

pub(crate) fn resolve_project_entry() -> Result<(PathBuf, PathBuf)> {
    let cwd = locate::original_cwd();
    let Some(root) = project::find_project_root(&cwd) else {
        bail!("Not in a Fern project directory. Run 'fern new <name>' to create one");
    };

    let entry = root.join("lib").join("main.cpp");
    if !entry.is_file() {
        bail!("No main.cpp found in lib/. Create lib/main.cpp with your Fern code");
    }
    Ok((root, entry))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main.html".to_string())
}

fn run_executable(path: &Path) -> Result<()> {
    println!("Running {}...", path.display());
    println!("🔥 Fern started!\n");

    let status = std::process::Command::new(path)
        .status()
        .with_context(|| format!("Failed to run {}", path.display()))?;

    if !status.success() {
        match status.code() {
            Some(code) => bail!("Process exited with status {code}"),
            // Killed by a signal (e.g. the user's Ctrl+C); not our error.
            None => println!("\nStopped"),
        }
    }
    Ok(())
}
