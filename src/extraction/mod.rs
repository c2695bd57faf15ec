//! Type-specific object extraction.
//!
//! Every live heap object passes through the [`ExtractorRegistry`] exactly once.
//! The registry asks its extractors in registration order whether they claim the
//! object's descriptor; the first one that does interprets the object into an
//! [`ObjectPayload`]. Objects nobody claims, and objects whose extractor fails or
//! panics, are handled by the [`DefaultExtractor`], which always succeeds and
//! records only the generic fields.
//!
//! # Key Components
//!
//! - [`ObjectExtractor`] - The extraction strategy trait
//! - [`ExtractorRegistry`] - Ordered strategy list with guaranteed fallback
//! - [`DefaultExtractor`] - The fallback
//! - [`StringExtractor`] - Reads `System.String` values
//! - [`TypeExtractor`] - A strategy built from a type-name matcher and a closure
//!
//! # Examples
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use dumpgraph::extraction::{ExtractorRegistry, TypeExtractor};
//! use dumpgraph::model::ObjectPayload;
//!
//! let mut registry = ExtractorRegistry::with_defaults();
//! registry.register(TypeExtractor::exact("orders", "Contoso.Order", |object, _| {
//!     let mut properties = BTreeMap::new();
//!     properties.insert("size".to_string(), object.size.to_string());
//!     Ok(ObjectPayload::Properties(properties))
//! }));
//! assert_eq!(registry.len(), 2);
//! ```

mod custom;
mod fallback;
mod registry;
mod string;

pub use custom::TypeExtractor;
pub use fallback::DefaultExtractor;
pub use registry::{Extracted, ExtractionFailure, ExtractorRegistry};
pub use string::{StringExtractor, STRING_TYPE_NAME};

use crate::{
    inspector::{ObjectDescriptor, RuntimeInspector},
    model::ObjectPayload,
    Result,
};

/// A type-specific extraction strategy.
///
/// Implementations must be cheap to query: [`ObjectExtractor::can_extract`] runs
/// for every heap object until one strategy accepts it.
pub trait ObjectExtractor: Send + Sync {
    /// Name used in diagnostics and recorded on each produced object
    fn name(&self) -> &'static str;

    /// Returns true if this strategy wants to interpret `object`
    fn can_extract(&self, object: &ObjectDescriptor, inspector: &dyn RuntimeInspector) -> bool;

    /// Interprets `object`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extraction`] (or any inspector error) if the object
    /// cannot be read; the registry then falls back to generic extraction.
    fn extract(
        &self,
        object: &ObjectDescriptor,
        inspector: &dyn RuntimeInspector,
    ) -> Result<ObjectPayload>;
}
