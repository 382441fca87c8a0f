//! Filesystem primitives shared by the installers.

pub mod link_mode;
pub mod tree_hash;

pub use link_mode::LinkMode;
pub use tree_hash::hash_path;
