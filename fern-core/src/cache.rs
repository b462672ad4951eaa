//! The precompiled web library cache.
//!
//! Web builds would otherwise recompile the whole framework on every
//! invocation. Instead the framework sources are compiled once into a
//! static archive under `~/.fern/cache/web/` and later builds link against
//! it, rebuilding only when a tracked source file is newer than the
//! artifact. The staleness check is timestamp-only on purpose: no hashing,
//! no header dependency tracking.

use crate::config;
use crate::error::BuildError;
use crate::locate::SourceTree;
use crate::sources::tracked_sources;
use crate::tool;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const WEB_LIBRARY_NAME: &str = "libfern_web.a";

/// External programs used for web-target compilation. Overridable mainly
/// for tests; the defaults resolve through `PATH`.
#[derive(Debug, Clone)]
pub struct WebToolchain {
    pub compiler: PathBuf,
    pub archiver: PathBuf,
}

impl Default for WebToolchain {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("emcc"),
            archiver: PathBuf::from("emar"),
        }
    }
}

impl WebToolchain {
    /// Availability check: the compiler must exist and answer a version
    /// probe.
    pub fn probe(&self) -> Result<(), BuildError> {
        match tool::capture(Command::new(&self.compiler).arg("--version")) {
            Ok(out) if out.success => Ok(()),
            _ => Err(BuildError::ToolchainMissing),
        }
    }
}

/// Whether the cached artifact must be rebuilt before use.
///
/// A missing artifact is always stale; otherwise any tracked source file
/// with a newer modification time than the artifact makes it stale.
pub fn is_stale(artifact: &Path, tree: &SourceTree) -> io::Result<bool> {
    let meta = match fs::metadata(artifact) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    };
    let artifact_mtime = meta.modified()?;

    for source in tracked_sources(tree)? {
        if fs::metadata(&source)?.modified()? > artifact_mtime {
            tracing::debug!(
                "{} is newer than the cached library",
                source.display()
            );
            return Ok(true);
        }
    }
    Ok(false)
}

/// Single-slot cache holding the precompiled web library.
pub struct LibraryCache {
    dir: PathBuf,
    toolchain: WebToolchain,
}

impl LibraryCache {
    pub fn new(dir: PathBuf, toolchain: WebToolchain) -> Self {
        Self { dir, toolchain }
    }

    /// The cache at its fixed home-directory location.
    pub fn at_default(toolchain: WebToolchain) -> Result<Self, BuildError> {
        let dir = config::config_dir()
            .ok_or(BuildError::NoHomeDir)?
            .join("cache")
            .join("web");
        Ok(Self::new(dir, toolchain))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(WEB_LIBRARY_NAME)
    }

    /// Remove the cache directory wholesale.
    pub fn clear(&self) -> io::Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Return the cached library, rebuilding it first if it is missing or
    /// stale. The fast path most builds take is the cache hit.
    pub fn ensure(&self, tree: &SourceTree) -> Result<PathBuf, BuildError> {
        fs::create_dir_all(&self.dir)?;
        let artifact = self.artifact_path();
        if !is_stale(&artifact, tree)? {
            tracing::info!("Reusing cached web library at {}", artifact.display());
            println!("✓ Using cached Fern web library");
            return Ok(artifact);
        }
        self.rebuild(tree)
    }

    /// Compile every tracked source to an object file and archive them,
    /// replacing any existing artifact atomically.
    pub fn rebuild(&self, tree: &SourceTree) -> Result<PathBuf, BuildError> {
        fs::create_dir_all(&self.dir)?;
        let sources = tracked_sources(tree)?;
        println!("Compiling Fern web library ({} files)...", sources.len());

        let mut objects = Vec::with_capacity(sources.len());
        let compiled = self.compile_objects(tree, &sources, &mut objects);
        let archived = compiled.and_then(|()| self.archive(&objects));

        // Intermediates never outlive the rebuild, pass or fail.
        for object in &objects {
            let _ = fs::remove_file(object);
        }

        let artifact = archived?;
        println!("✓ Fern web library built");
        Ok(artifact)
    }

    fn compile_objects(
        &self,
        tree: &SourceTree,
        sources: &[PathBuf],
        objects: &mut Vec<PathBuf>,
    ) -> Result<(), BuildError> {
        for (index, source) in sources.iter().enumerate() {
            let object = self.dir.join(format!("fern_web_{index}.o"));
            // Record before checking so a failed compile still gets its
            // partial output cleaned up.
            objects.push(object.clone());

            let out = tool::capture(
                Command::new(&self.toolchain.compiler)
                    .args(["-std=c++17", "-O2", "-c"])
                    .arg("-I")
                    .arg(tree.include_dir())
                    .arg(source)
                    .arg("-o")
                    .arg(&object),
            )?;
            if !out.success {
                return Err(BuildError::CompileFailed {
                    file: source.clone(),
                    stderr: out.stderr,
                });
            }
        }
        Ok(())
    }

    fn archive(&self, objects: &[PathBuf]) -> Result<PathBuf, BuildError> {
        let artifact = self.artifact_path();
        let staging = self.dir.join(format!("{WEB_LIBRARY_NAME}.tmp"));
        let _ = fs::remove_file(&staging);

        let out = tool::capture(
            Command::new(&self.toolchain.archiver)
                .arg("rcs")
                .arg(&staging)
                .args(objects),
        )?;
        if !out.success {
            let _ = fs::remove_file(&staging);
            return Err(BuildError::ArchiveFailed { stderr: out.stderr });
        }

        fs::rename(&staging, &artifact)?;
        Ok(artifact)
    }
}
