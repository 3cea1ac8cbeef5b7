//! IMAGEN instrument registry.
//!
//! The catalogue of supported instruments and labelled-dataset sets is data,
//! not code: a TOML document compiled into the crate (or loaded from a path)
//! is resolved into [`imagen_model::InstrumentSchema`] values. [`DataLayout`]
//! maps those schemas onto the fixed directory conventions of the data root.

#![deny(unsafe_code)]

pub mod error;
pub mod manifest;
pub mod paths;
pub mod registry;

pub use error::StandardsError;
pub use paths::{DATA_ROOT_ENV_VAR, DEFAULT_DATA_ROOT, DEFAULT_RELEASE, DataLayout, data_root};
pub use registry::{BUILTIN_REGISTRY, InstrumentRegistry, load_default_registry};
