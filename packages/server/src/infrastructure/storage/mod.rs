//! Document storage implementations

pub mod file;

pub use file::FileDocumentStorage;
