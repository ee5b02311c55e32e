//! Shared utilities across autoiso modules.

pub mod files;

pub use files::{write_file_mode, write_file_with_dirs};
