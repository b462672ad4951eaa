//! Per-platform compiler invocations.
//!
//! Native builds link the entry file against the globally installed
//! framework library. Web builds compile the entry file with Emscripten
//! and link it against the cached web library from [`crate::cache`], so a
//! web build never recompiles the framework itself.

use crate::cache::WebToolchain;
use crate::config::{self, GlobalConfig};
use crate::error::BuildError;
use crate::locate::SourceTree;
use crate::tool;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Native => write!(f, "native"),
            Platform::Web => write!(f, "web"),
        }
    }
}

/// How the build output is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Project builds: `build/main` or `build/main.html`.
    Project,
    /// One-off single-file builds: `build/<stem>_temp[.html]`.
    Disposable,
}

pub const ENTRY_EXTENSIONS: [&str; 3] = ["cpp", "cxx", "cc"];

/// Validate the entry file: it must exist and carry one of the accepted
/// native-source extensions.
pub fn check_entry(entry: &Path) -> Result<(), BuildError> {
    if !entry.is_file() {
        return Err(BuildError::MissingEntry(entry.to_path_buf()));
    }
    match entry.extension().and_then(|e| e.to_str()) {
        Some(ext) if ENTRY_EXTENSIONS.contains(&ext) => Ok(()),
        other => Err(BuildError::UnsupportedExtension(
            other.map(|e| format!(".{e}")).unwrap_or_default(),
        )),
    }
}

/// One compiler invocation, assembled in full before spawning.
#[derive(Debug, Clone, Default)]
pub struct BuildSpec {
    pub program: PathBuf,
    pub flags: Vec<String>,
    pub include_paths: Vec<PathBuf>,
    pub inputs: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub shell_file: Option<PathBuf>,
    pub output: PathBuf,
}

impl BuildSpec {
    /// Argument list in invocation order.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for flag in &self.flags {
            args.push(flag.into());
        }
        for include in &self.include_paths {
            args.push("-I".into());
            args.push(include.into());
        }
        for input in &self.inputs {
            args.push(input.into());
        }
        for dir in &self.library_paths {
            args.push("-L".into());
            args.push(dir.into());
        }
        for lib in &self.libraries {
            args.push(format!("-l{lib}").into());
        }
        if let Some(shell) = &self.shell_file {
            args.push("--shell-file".into());
            args.push(shell.into());
        }
        args.push("-o".into());
        args.push(self.output.as_os_str().into());
        args
    }

    /// Spawn the compiler, creating the output directory first. A non-zero
    /// exit surfaces the compiler's raw stderr verbatim.
    pub fn run(&self) -> Result<PathBuf, BuildError> {
        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)?;
        }

        let out = tool::capture(Command::new(&self.program).args(self.args()))?;
        if !out.success {
            return Err(BuildError::CompileFailed {
                file: self.inputs.first().cloned().unwrap_or_default(),
                stderr: out.stderr,
            });
        }
        Ok(self.output.clone())
    }
}

fn output_name(entry: &Path, kind: OutputKind, platform: Platform) -> String {
    let stem = entry
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main");
    match (kind, platform) {
        (OutputKind::Project, Platform::Native) => "main".to_string(),
        (OutputKind::Project, Platform::Web) => "main.html".to_string(),
        (OutputKind::Disposable, Platform::Native) => format!("{stem}_temp"),
        (OutputKind::Disposable, Platform::Web) => format!("{stem}_temp.html"),
    }
}

/// Compile `entry` against the installed native library.
///
/// Native builds always recompile the entry file; there is no staleness or
/// cache logic because the installed library is stable.
pub fn build_native(
    entry: &Path,
    build_dir: &Path,
    config: &GlobalConfig,
    kind: OutputKind,
) -> Result<PathBuf, BuildError> {
    check_entry(entry)?;
    if !config.is_framework_installed() {
        return Err(BuildError::NotInstalled);
    }

    let spec = BuildSpec {
        program: PathBuf::from("g++"),
        flags: config.build.default_flags.clone(),
        include_paths: config.build.include_paths.clone(),
        inputs: vec![entry.to_path_buf()],
        library_paths: config.build.library_paths.clone(),
        libraries: config.build.libraries.clone(),
        shell_file: None,
        output: build_dir.join(output_name(entry, kind, Platform::Native)),
    };

    println!("Compiling...");
    spec.run()
}

fn web_flags() -> Vec<String> {
    [
        "-std=c++17",
        "-O2",
        "-s",
        "WASM=1",
        "-s",
        "ALLOW_MEMORY_GROWTH=1",
        "-s",
        "USE_WEBGL2=1",
        "-s",
        "EXPORTED_FUNCTIONS=['_main']",
        "-s",
        "EXPORTED_RUNTIME_METHODS=['ccall','cwrap']",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Compile `entry` with the web toolchain and link it against the cached
/// framework library.
pub fn build_web(
    entry: &Path,
    build_dir: &Path,
    tree: &SourceTree,
    library: &Path,
    shell_file: Option<PathBuf>,
    kind: OutputKind,
    toolchain: &WebToolchain,
) -> Result<PathBuf, BuildError> {
    check_entry(entry)?;

    let spec = BuildSpec {
        program: toolchain.compiler.clone(),
        flags: web_flags(),
        include_paths: vec![tree.include_dir()],
        inputs: vec![entry.to_path_buf(), library.to_path_buf()],
        library_paths: Vec::new(),
        libraries: Vec::new(),
        shell_file,
        output: build_dir.join(output_name(entry, kind, Platform::Web)),
    };

    println!("Compiling for web...");
    spec.run()
}

/// Resolve the HTML shell template for a web build.
///
/// The project-local candidate wins over the global default under
/// `~/.fern/templates/`; with neither present the toolchain's built-in
/// shell applies.
pub fn resolve_shell_template(local_candidate: &Path) -> Option<PathBuf> {
    if local_candidate.is_file() {
        return Some(local_candidate.to_path_buf());
    }
    let global = config::config_dir()?
        .join("templates")
        .join("template.html");
    if global.is_file() {
        return Some(global);
    }
    tracing::debug!("No HTML shell template found; using the toolchain default");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn entry_extension_gate() {
        let tmp = tempdir().unwrap();
        for name in ["a.cpp", "b.cxx", "c.cc"] {
            let path = tmp.path().join(name);
            fs::write(&path, "int main() {}").unwrap();
            assert!(check_entry(&path).is_ok(), "{name} should be accepted");
        }

        let bad = tmp.path().join("script.py");
        fs::write(&bad, "").unwrap();
        assert!(matches!(
            check_entry(&bad),
            Err(BuildError::UnsupportedExtension(ext)) if ext == ".py"
        ));

        assert!(matches!(
            check_entry(&tmp.path().join("absent.cpp")),
            Err(BuildError::MissingEntry(_))
        ));
    }

    #[test]
    fn output_names_per_platform_and_kind() {
        let entry = Path::new("sketch.cpp");
        assert_eq!(output_name(entry, OutputKind::Project, Platform::Native), "main");
        assert_eq!(
            output_name(entry, OutputKind::Project, Platform::Web),
            "main.html"
        );
        assert_eq!(
            output_name(entry, OutputKind::Disposable, Platform::Native),
            "sketch_temp"
        );
        assert_eq!(
            output_name(entry, OutputKind::Disposable, Platform::Web),
            "sketch_temp.html"
        );
    }

    #[test]
    fn spec_args_in_invocation_order() {
        let spec = BuildSpec {
            program: PathBuf::from("g++"),
            flags: vec!["-std=c++17".into(), "-O2".into()],
            include_paths: vec![PathBuf::from("/usr/include/fern")],
            inputs: vec![PathBuf::from("main.cpp")],
            library_paths: vec![PathBuf::from("/usr/lib")],
            libraries: vec!["fern".into(), "X11".into()],
            shell_file: None,
            output: PathBuf::from("build/main"),
        };

        let args: Vec<String> = spec
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-std=c++17",
                "-O2",
                "-I",
                "/usr/include/fern",
                "main.cpp",
                "-L",
                "/usr/lib",
                "-lfern",
                "-lX11",
                "-o",
                "build/main",
            ]
        );
    }

    #[test]
    fn shell_file_argument_precedes_output() {
        let spec = BuildSpec {
            program: PathBuf::from("emcc"),
            inputs: vec![PathBuf::from("main.cpp")],
            shell_file: Some(PathBuf::from("web/template.html")),
            output: PathBuf::from("build/main.html"),
            ..BuildSpec::default()
        };

        let args: Vec<String> = spec
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let shell_pos = args.iter().position(|a| a == "--shell-file").unwrap();
        let out_pos = args.iter().position(|a| a == "-o").unwrap();
        assert!(shell_pos < out_pos);
        assert_eq!(args[shell_pos + 1], "web/template.html");
    }

    #[test]
    fn native_build_requires_installed_library() {
        let tmp = tempdir().unwrap();
        let entry = tmp.path().join("main.cpp");
        fs::write(&entry, "int main() {}").unwrap();

        let mut config = GlobalConfig::default();
        config.cpp_library_path = tmp.path().join("not-installed");

        let err = build_native(&entry, &tmp.path().join("build"), &config, OutputKind::Project)
            .unwrap_err();
        assert!(matches!(err, BuildError::NotInstalled));
        // Precondition failure: no build directory, no compiler run.
        assert!(!tmp.path().join("build").exists());
    }

    #[test]
    fn local_shell_template_wins() {
        let tmp = tempdir().unwrap();
        let local = tmp.path().join("template.html");
        fs::write(&local, "<html></html>").unwrap();
        assert_eq!(resolve_shell_template(&local), Some(local.clone()));
    }
}
