//! Project configuration stored in `webasset.toml`.
//!
//! The file lives at the project root and holds installers, install
//! targets, the default target and the discovery bindings.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, config_path_for_root, find_project_root};
pub use schema::{AssetConfig, InstallerEntry, ParameterEntry, TargetEntry};
pub use store::ConfigStore;
