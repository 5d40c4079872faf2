//! Component, filter and platform registry.
//!
//! The registry is a declarative catalog assembled from JSON manifests. A
//! [`Profile`] picks which built-in manifests are merged, the [`CmsType`]
//! adds one CMS-specific manifest on top, and callers may add their own
//! sources in between. Merging is last-wins per component or filter name.
//!
//! A loaded [`Registry`] is immutable and safe to share between threads.
//! [`RegistryStore`] publishes snapshots and swaps them atomically on reload.
//!
//! ```
//! use ikb_registry::{CmsType, Profile, RegistryStore, ManifestCatalog};
//! use serde_json::json;
//!
//! let store = RegistryStore::load(ManifestCatalog::builtin(), Profile::Full, CmsType::Native).unwrap();
//! let registry = store.current();
//! assert!(registry.has_component("ikb_section"));
//! assert_eq!(registry.apply_filter("upper", &json!("hi"), &[]), json!("HI"));
//! ```

pub mod dispatch;
pub mod error;
pub mod filters;
pub mod manifest;
pub mod registry;
pub mod store;
pub mod types;

pub use dispatch::{DEFAULT_HANDLER, TagDispatch};
pub use error::{RegistryError, RegistryResult};
pub use filters::{FilterArg, FilterFn, builtin_filter, builtin_filter_names};
pub use manifest::{Manifest, ManifestCatalog, ManifestSource};
pub use registry::Registry;
pub use store::RegistryStore;
pub use types::{
    CmsType, ComponentSpec, FilterSpec, ManifestInfo, ParamSchema, PlatformCategory, PlatformSet,
    PlatformSpec, Profile, PropSchema,
};
