//! Lifecycle hooks run by the build tool around its prepare stage.
//!
//! Both hooks read the configuration fresh on every invocation; nothing is
//! carried over between runs except the files on disk.
mod after_prepare;
mod before_prepare;

pub use after_prepare::run_after_prepare;
pub use before_prepare::run_before_prepare;
