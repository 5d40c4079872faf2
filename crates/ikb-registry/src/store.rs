//! Atomically swappable registry handle.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::RegistryResult;
use crate::manifest::ManifestCatalog;
use crate::registry::Registry;
use crate::types::{CmsType, Profile};

/// Shared handle publishing immutable [`Registry`] snapshots.
///
/// Readers take an `Arc` snapshot with [`current`](Self::current) and keep
/// using it for as long as they like. [`reload`](Self::reload) builds the new
/// registry outside the lock and then swaps the pointer, so a reader sees
/// either the old registry or the new one, never a mix.
#[derive(Debug)]
pub struct RegistryStore {
    catalog: ManifestCatalog,
    current: RwLock<Arc<Registry>>,
}

impl RegistryStore {
    /// Load the initial registry from a catalog.
    pub fn load(catalog: ManifestCatalog, profile: Profile, cms: CmsType) -> RegistryResult<Self> {
        let registry = catalog.load(profile, cms)?;
        Ok(Self {
            catalog,
            current: RwLock::new(Arc::new(registry)),
        })
    }

    /// Wrap an already built registry. Reloads use the built-in catalog.
    pub fn new(registry: Registry) -> Self {
        Self {
            catalog: ManifestCatalog::builtin(),
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// Snapshot of the active registry.
    pub fn current(&self) -> Arc<Registry> {
        Arc::clone(&self.current.read())
    }

    /// Build a registry for `profile`/`cms` and make it the active one.
    ///
    /// On error the active registry is left untouched.
    pub fn reload(&self, profile: Profile, cms: CmsType) -> RegistryResult<Arc<Registry>> {
        let next = Arc::new(self.catalog.load(profile, cms)?);
        *self.current.write() = Arc::clone(&next);
        tracing::info!(profile = %profile, cms = %cms, "registry reloaded");
        Ok(next)
    }

    /// Replace the active registry, returning the previous one.
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        std::mem::replace(&mut *self.current.write(), Arc::new(registry))
    }
}
