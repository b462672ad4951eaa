//! # fern-core
//!
//! Core build orchestration for the Fern UI framework CLI.
//!
//! This crate provides the building blocks behind `fern run`/`fern build`:
//! locating the framework source tree, deciding whether the precompiled
//! web library is stale, rebuilding and caching it, dispatching native and
//! WebAssembly compiler invocations, and resolving project configuration.

pub mod build;
pub mod cache;
pub mod config;
pub mod error;
pub mod locate;
pub mod project;
pub mod sources;
pub mod tool;

pub use build::{build_native, build_web, BuildSpec, OutputKind, Platform};
pub use cache::{is_stale, LibraryCache, WebToolchain};
pub use config::GlobalConfig;
pub use error::{BuildError, Probe};
pub use locate::{locate_source, locate_source_in, SourceTree};
pub use project::{find_project_root, ProjectConfig, Value};
pub use sources::tracked_sources;
