//! Library folder hierarchy
//!
//! [`FolderTree`] is the local model with its structural rules;
//! [`LibraryManager`] keeps it in step with a [`LibraryStore`](crate::backend::LibraryStore).

pub mod folder;
pub mod manager;
pub mod tree;

pub use folder::{FolderRow, LibraryFolder, LibrarySnapshot};
pub use manager::LibraryManager;
pub use tree::FolderTree;
