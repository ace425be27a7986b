//! Document loaders.

pub mod directory;

pub use directory::{DEFAULT_CHUNK_SIZE, DirectoryLoader, LoaderConfig, chunk_text};
