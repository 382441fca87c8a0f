//! Webasset Core Library
//!
//! Publishes repository resources as web assets. Asset mappings bind a
//! repository glob to a web path on a named install target; installers copy
//! or symlink the matched resources into the target, and the URL generator
//! resolves repository paths to their public URLs.
//!
//! Mappings are stored as discovery bindings. Filters written against
//! mapping fields are translated into binding queries by
//! [`asset::BindingExpressionBuilder`].

pub mod asset;
pub mod binding;
pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod fs;
pub mod install;
pub mod installer;
pub mod target;
pub mod url;

/// Re-exports of commonly used types
pub mod prelude {
    // Assets
    pub use crate::asset::{AssetManager, AssetMapping, BindingExpressionBuilder};

    // Bindings
    pub use crate::binding::{BindingDescriptor, BindingState, Discovery};

    // Configuration
    pub use crate::config::{AssetConfig, ConfigStore};
    pub use crate::context::ProjectContext;

    // Errors
    pub use crate::error::{AssetError, ExprError};

    // Expressions
    pub use crate::expr::{Criterion, Expr, Record};

    // Filesystem
    pub use crate::fs::LinkMode;

    // Installation
    pub use crate::install::{AssetInstallationManager, ResourceInstallOutcome};
    pub use crate::installer::{InstallerDescriptor, InstallerManager, InstallerParameter};
    pub use crate::target::{InstallTarget, InstallTargetManager};
    pub use crate::url::AssetUrlGenerator;
}
