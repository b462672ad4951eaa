//! Project scaffolding.
//!
//! The generated files are pre-authored template blobs; only the project
//! name is interpolated.

use anyhow::{bail, Context, Result};
use fern_core::locate;
use std::fs;
use std::path::Path;

const PROJECT_CONFIG: &str = include_str!("../../templates/fern.yaml");
const MAIN_CPP: &str = include_str!("../../templates/main.cpp");
const WEB_TEMPLATE: &str = include_str!("../../templates/template.html");
const README: &str = include_str!("../../templates/README.md");
const GITIGNORE: &str = include_str!("../../templates/gitignore");

/// Create a new Fern project directory with starter files.
pub fn new_project(name: &str) -> Result<()> {
    if !is_valid_name(name) {
        bail!("Invalid project name: '{name}' (use letters, digits, '-' and '_')");
    }

    let root = locate::original_cwd().join(name);
    if root.exists() {
        bail!("Directory '{name}' already exists");
    }

    for dir in ["lib", "web", "linux", "assets"] {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    write_template(&root, "fern.yaml", PROJECT_CONFIG, name)?;
    write_template(&root, "lib/main.cpp", MAIN_CPP, name)?;
    write_template(&root, "web/template.html", WEB_TEMPLATE, name)?;
    write_template(&root, "README.md", README, name)?;
    write_template(&root, ".gitignore", GITIGNORE, name)?;

    println!("🌱 Project '{name}' created");
    println!("  - cd {name}");
    println!("  - fern run              # build and run natively");
    println!("  - fern run -p web       # build and serve in the browser");
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn write_template(root: &Path, rel: &str, template: &str, name: &str) -> Result<()> {
    let path = root.join(rel);
    let content = template.replace("__PROJECT_NAME__", name);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Created {}", path.display());
    Ok(())
}
