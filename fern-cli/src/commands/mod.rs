//! CLI command implementations.

pub mod build;
pub mod cache;
pub mod doctor;
pub mod new;
pub mod run;

pub use build::build_project;
pub use cache::cache;
pub use doctor::doctor;
pub use new::new_project;
pub use run::run;
