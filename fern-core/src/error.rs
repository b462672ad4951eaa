//! Error types for the build pipeline.
//!
//! Every expected failure mode carries enough context to print a single
//! corrective status line; raw toolchain diagnostics are preserved verbatim
//! because they are the user's primary debugging signal.

use std::path::PathBuf;
use thiserror::Error;

/// One candidate location probed while searching for the framework source
/// tree, with the outcome of the probe.
#[derive(Debug, Clone)]
pub struct Probe {
    pub path: PathBuf,
    pub found: bool,
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Fern source files not found. Locations tried:\n{}", format_probes(probes))]
    SourceNotFound { probes: Vec<Probe> },

    #[error(
        "Fern C++ library is not installed globally.\n\
         Run './install.sh' from the Fern source directory to install"
    )]
    NotInstalled,

    #[error(
        "Emscripten not found. Please install and activate Emscripten:\n  \
         git clone https://github.com/emscripten-core/emsdk.git\n  \
         cd emsdk && ./emsdk install latest && ./emsdk activate latest"
    )]
    ToolchainMissing,

    #[error("File not found: {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("Unsupported file type: '{0}' (supported: .cpp, .cxx, .cc)")]
    UnsupportedExtension(String),

    #[error("Compilation of {} failed:\n{stderr}", file.display())]
    CompileFailed { file: PathBuf, stderr: String },

    #[error("Archiving the web library failed:\n{stderr}")]
    ArchiveFailed { stderr: String },

    #[error("Home directory could not be determined")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_probes(probes: &[Probe]) -> String {
    probes
        .iter()
        .map(|probe| {
            let marker = if probe.found { "✓" } else { "✗" };
            format!("  {} {}", marker, probe.path.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_not_found_lists_every_probe() {
        let err = BuildError::SourceNotFound {
            probes: vec![
                Probe {
                    path: PathBuf::from("/home/u/.fern/src/cpp"),
                    found: false,
                },
                Probe {
                    path: PathBuf::from("/opt/fern/src/cpp"),
                    found: false,
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("/home/u/.fern/src/cpp"));
        assert!(rendered.contains("/opt/fern/src/cpp"));
        assert!(rendered.contains('✗'));
    }

    #[test]
    fn compile_failed_preserves_diagnostics() {
        let err = BuildError::CompileFailed {
            file: PathBuf::from("main.cpp"),
            stderr: "main.cpp:3: error: expected ';'".into(),
        };
        assert!(err.to_string().contains("error: expected ';'"));
    }
}
