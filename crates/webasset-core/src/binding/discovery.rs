//! Binding discovery: storage and expression search of bindings.

use tracing::debug;

use crate::config::ConfigStore;
use crate::expr::Expr;

use super::BindingDescriptor;

/// Search API over stored bindings.
pub trait Discovery {
    /// Store a binding. A binding with the same UUID is replaced; replacing a
    /// binding of another type fails.
    fn add_binding(&self, binding: BindingDescriptor) -> anyhow::Result<()>;

    /// Remove every binding matching `expr` and return how many were removed.
    fn remove_bindings(&self, expr: &Expr) -> anyhow::Result<usize>;

    /// Return every binding matching `expr`, in storage order.
    fn find_bindings(&self, expr: &Expr) -> anyhow::Result<Vec<BindingDescriptor>>;

    /// Whether any binding matches `expr` (or any binding exists at all).
    fn has_bindings(&self, expr: Option<&Expr>) -> anyhow::Result<bool>;
}

/// Discovery backed by the `[[bindings]]` table of the project config.
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    store: ConfigStore,
}

impl ConfigDiscovery {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }
}

impl Discovery for ConfigDiscovery {
    fn add_binding(&self, binding: BindingDescriptor) -> anyhow::Result<()> {
        debug!(uuid = %binding.uuid, query = %binding.query, "adding binding");
        self.store.update(|config| {
            if let Some(existing) = config
                .bindings
                .iter()
                .find(|existing| existing.uuid == binding.uuid)
                && existing.type_name != binding.type_name
            {
                anyhow::bail!(
                    "Binding {} has type '{}' and cannot be replaced by a '{}' binding",
                    binding.uuid,
                    existing.type_name,
                    binding.type_name
                );
            }
            config.bindings.retain(|existing| existing.uuid != binding.uuid);
            config.bindings.push(binding);
            Ok(())
        })
    }

    fn remove_bindings(&self, expr: &Expr) -> anyhow::Result<usize> {
        let mut config = self.store.load()?;
        let before = config.bindings.len();
        config.bindings.retain(|binding| !expr.evaluate(binding));
        let removed = before - config.bindings.len();
        if removed > 0 {
            debug!(removed, filter = %expr, "removing bindings");
            self.store.save(&config)?;
        }
        Ok(removed)
    }

    fn find_bindings(&self, expr: &Expr) -> anyhow::Result<Vec<BindingDescriptor>> {
        let config = self.store.load()?;
        Ok(config
            .bindings
            .into_iter()
            .filter(|binding| expr.evaluate(binding))
            .collect())
    }

    fn has_bindings(&self, expr: Option<&Expr>) -> anyhow::Result<bool> {
        let config = self.store.load()?;
        Ok(match expr {
            Some(expr) => config.bindings.iter().any(|binding| expr.evaluate(binding)),
            None => !config.bindings.is_empty(),
        })
    }
}
