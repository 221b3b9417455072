//! Provider templates and configured-provider state.

pub mod catalog;
pub mod model;

pub use catalog::{AuthScheme, ProviderCatalog, ProviderTemplate};
pub use model::{ConfiguredProvider, VerificationStatus};
