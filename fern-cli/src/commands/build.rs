//! Project build without run/serve.

use super::run::{build_web_entry, resolve_project_entry};
use anyhow::Result;
use fern_core::{build, GlobalConfig, OutputKind, Platform};

/// Build the current project for `platform` and report the output path.
pub fn build_project(config: &GlobalConfig, platform: Platform) -> Result<()> {
    let (root, entry) = resolve_project_entry()?;
    println!("Found Fern project at {}", root.display());
    println!("Building for {platform}...");

    let build_dir = root.join("build");
    let output = match platform {
        Platform::Native => build::build_native(&entry, &build_dir, config, OutputKind::Project)?,
        Platform::Web => build_web_entry(&entry, &build_dir, Some(&root), OutputKind::Project)?,
    };

    println!("✓ Build successful: {}", output.display());
    if platform == Platform::Web {
        println!("  Serve it with: fern run -p web");
    }
    Ok(())
}
