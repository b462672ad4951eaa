//! Environment diagnostics.

use anyhow::Result;
use fern_core::{cache, locate, tool, GlobalConfig};

/// Report compilers, toolchains, the framework install and the source
/// search transcript. Always exits successfully; the point is the report.
pub fn doctor(config: &GlobalConfig) -> Result<()> {
    println!("Fern doctor\n");

    println!("Compilers:");
    report_tool("g++", "native builds");
    report_tool("clang++", "alternative native compiler");
    report_tool("pkg-config", "native library discovery");
    println!();

    println!("Web toolchain:");
    report_tool("emcc", "web builds (Emscripten)");
    report_tool("emar", "web library archiving");
    println!();

    println!("Framework installation:");
    if config.is_framework_installed() {
        println!("  ✓ Headers: {}", config.installed_include_dir().display());
        println!("  ✓ Library: {}", config.installed_library_file().display());
    } else {
        println!("  ✗ Not installed under {}", config.cpp_library_path.display());
        println!("    Native builds need the installed framework; run install.sh");
    }
    println!();

    println!("Source tree search:");
    for probe in locate::probe_candidates(&locate::default_candidates()) {
        let marker = if probe.found { "✓" } else { "✗" };
        println!("  {marker} {}", probe.path.display());
    }
    println!();

    println!("Web library cache:");
    match cache::LibraryCache::at_default(cache::WebToolchain::default()) {
        Ok(library_cache) => {
            let artifact = library_cache.artifact_path();
            if artifact.is_file() {
                println!("  ✓ {}", artifact.display());
            } else {
                println!("  ✗ {} (built on first web build)", artifact.display());
            }
        }
        Err(_) => println!("  ✗ No home directory; cache unavailable"),
    }

    Ok(())
}

fn report_tool(name: &str, purpose: &str) {
    match tool::find_program(name) {
        Some(path) => println!("  ✓ {name}: {} ({purpose})", path.display()),
        None => println!("  ✗ {name}: not found ({purpose})"),
    }
}
