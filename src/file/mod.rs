//! Loading and saving
//!
//! Real image codecs live outside this crate. What is here is the loader
//! seam the commands talk to, plus reference implementations: a JSON
//! sprite document format, the `.col` palette codec and two loaders.

pub mod col;
pub mod format;
mod fs_loader;
mod loader;
mod memory;

pub use col::{load_col_file, save_col_file};
pub use format::{read_document, read_sprite, write_sprite, SpriteFile};
pub use fs_loader::FsLoader;
pub use loader::{DocumentLoader, LoadFailure, LoadFlags, LoadResult};
pub use memory::{MemoryLoader, RequestLog};
