//! Asset mappings: which repository paths are published where.

pub mod expression_builder;
pub mod manager;
pub mod mapping;

pub use expression_builder::{BindingExpressionBuilder, MappingField};
pub use manager::{AssetManager, DiscoveryAssetManager, target_filter};
pub use mapping::AssetMapping;

/// Binding type under which asset mappings are stored.
pub const BINDING_TYPE: &str = "webasset/asset-mapping";

/// Binding parameter holding the install target name.
pub const TARGET_PARAMETER: &str = "target";

/// Binding parameter holding the web path.
pub const PATH_PARAMETER: &str = "path";

/// Appended to a mapping's glob to form the binding query, so the binding
/// matches the glob itself and everything beneath it.
pub const QUERY_SUFFIX: &str = "{,/**}";
