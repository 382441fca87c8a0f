//! Asset mapping registry on top of the binding discovery.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::binding::{BindingDescriptor, Discovery};
use crate::error::AssetError;
use crate::expr::Expr;
use crate::target::{DEFAULT_TARGET, InstallTargetManager};

use super::{AssetMapping, BindingExpressionBuilder};

/// Manages asset mappings.
pub trait AssetManager {
    /// Add an asset mapping.
    ///
    /// Fails with [`AssetError::NoSuchTarget`] if the mapping's target does
    /// not exist and with [`AssetError::DuplicateAssetMapping`] if any stored
    /// binding already uses its UUID.
    fn add_asset_mapping(&self, mapping: AssetMapping) -> anyhow::Result<()>;

    /// Remove the mapping with the given UUID. Does nothing if it does not exist.
    fn remove_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<()>;

    /// Remove all mappings matching `expr` and return how many were removed.
    fn remove_asset_mappings(&self, expr: &Expr) -> anyhow::Result<usize>;

    fn clear_asset_mappings(&self) -> anyhow::Result<()>;

    /// Fails with [`AssetError::NoSuchAssetMapping`] if the mapping does not exist.
    fn get_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<AssetMapping>;

    fn get_asset_mappings(&self) -> anyhow::Result<Vec<AssetMapping>>;

    /// Return all mappings matching `expr`, an expression over the
    /// [`AssetMapping`] field names.
    fn find_asset_mappings(&self, expr: &Expr) -> anyhow::Result<Vec<AssetMapping>>;

    fn has_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<bool>;

    /// Whether any mapping matches `expr` (or any mapping exists at all).
    fn has_asset_mappings(&self, expr: Option<&Expr>) -> anyhow::Result<bool>;
}

/// Asset manager that stores mappings as discovery bindings.
#[derive(Debug, Clone)]
pub struct DiscoveryAssetManager<D, T> {
    discovery: D,
    targets: T,
    builder: BindingExpressionBuilder,
}

impl<D: Discovery, T: InstallTargetManager> DiscoveryAssetManager<D, T> {
    pub fn new(discovery: D, targets: T) -> Self {
        Self {
            discovery,
            targets,
            builder: BindingExpressionBuilder::new(),
        }
    }

    fn query(&self, expr: Option<&Expr>) -> anyhow::Result<Expr> {
        let query = self.builder.build_expression(expr)?;
        debug!(query = %query, "built binding query");
        Ok(query)
    }

    fn find_by_query(&self, query: &Expr) -> anyhow::Result<Vec<AssetMapping>> {
        Ok(self
            .discovery
            .find_bindings(query)?
            .iter()
            .filter_map(to_mapping)
            .collect())
    }
}

/// Filter over mapping fields selecting the mappings installed on `name`.
///
/// Mappings stored with the reserved `default` target are included when
/// `name` resolves to the current default target.
pub fn target_filter(targets: &dyn InstallTargetManager, name: &str) -> anyhow::Result<Expr> {
    let resolved = targets.get_target(name)?;
    let filter = Expr::same(AssetMapping::TARGET_NAME, resolved.name.clone());
    let is_default = targets
        .get_default_target()
        .is_ok_and(|default| default.name == resolved.name);
    Ok(if is_default {
        filter.or_same(AssetMapping::TARGET_NAME, DEFAULT_TARGET)
    } else {
        filter
    })
}

fn by_uuid(uuid: Uuid) -> Expr {
    Expr::same(AssetMapping::UUID, uuid.to_string())
}

fn to_mapping(binding: &BindingDescriptor) -> Option<AssetMapping> {
    match AssetMapping::from_binding(binding) {
        Ok(mapping) => Some(mapping),
        Err(err) => {
            warn!(uuid = %binding.uuid, error = %err, "skipping malformed asset binding");
            None
        }
    }
}

impl<D: Discovery, T: InstallTargetManager> AssetManager for DiscoveryAssetManager<D, T> {
    fn add_asset_mapping(&self, mapping: AssetMapping) -> anyhow::Result<()> {
        if !self.targets.has_target(&mapping.target_name)? {
            return Err(AssetError::NoSuchTarget(mapping.target_name).into());
        }
        // Any binding holding the UUID counts, whatever its type or state
        let taken = Expr::same(BindingDescriptor::UUID, mapping.uuid.to_string());
        if self.discovery.has_bindings(Some(&taken))? {
            return Err(AssetError::DuplicateAssetMapping(mapping.uuid).into());
        }
        debug!(
            uuid = %mapping.uuid,
            glob = %mapping.glob,
            target = %mapping.target_name,
            web_path = %mapping.web_path,
            "adding asset mapping"
        );
        self.discovery.add_binding(mapping.to_binding())
    }

    fn remove_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<()> {
        self.remove_asset_mappings(&by_uuid(uuid))?;
        Ok(())
    }

    fn remove_asset_mappings(&self, expr: &Expr) -> anyhow::Result<usize> {
        let query = self.query(Some(expr))?;
        self.discovery.remove_bindings(&query)
    }

    fn clear_asset_mappings(&self) -> anyhow::Result<()> {
        let query = self.query(None)?;
        self.discovery.remove_bindings(&query)?;
        Ok(())
    }

    fn get_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<AssetMapping> {
        let query = self.query(Some(&by_uuid(uuid)))?;
        self.find_by_query(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| AssetError::NoSuchAssetMapping(uuid).into())
    }

    fn get_asset_mappings(&self) -> anyhow::Result<Vec<AssetMapping>> {
        let query = self.query(None)?;
        self.find_by_query(&query)
    }

    fn find_asset_mappings(&self, expr: &Expr) -> anyhow::Result<Vec<AssetMapping>> {
        let query = self.query(Some(expr))?;
        self.find_by_query(&query)
    }

    fn has_asset_mapping(&self, uuid: Uuid) -> anyhow::Result<bool> {
        let query = self.query(Some(&by_uuid(uuid)))?;
        self.discovery.has_bindings(Some(&query))
    }

    fn has_asset_mappings(&self, expr: Option<&Expr>) -> anyhow::Result<bool> {
        let query = self.query(expr)?;
        self.discovery.has_bindings(Some(&query))
    }
}
