//! Registry selecting the extractor for each heap object.
//!
//! This module provides [`ExtractorRegistry`], which keeps the registered
//! strategies in registration order and runs the first one that claims an object.

use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
};

use crate::{
    extraction::{DefaultExtractor, ObjectExtractor, StringExtractor},
    inspector::{ObjectDescriptor, RuntimeInspector},
    model::ObjectPayload,
};

/// The outcome of running the registry on one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// The payload produced
    pub payload: ObjectPayload,
    /// Name of the extractor whose payload was kept
    pub extractor: &'static str,
    /// Set when a claiming extractor failed and the fallback was used instead
    pub failure: Option<ExtractionFailure>,
}

/// Why a claiming extractor's result was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// Name of the extractor that failed
    pub extractor: &'static str,
    /// The error or panic message
    pub message: String,
    /// The extractor panicked rather than returning an error
    pub panicked: bool,
}

/// Ordered set of extraction strategies with a guaranteed fallback.
///
/// # Strategy Resolution
///
/// 1. Strategies are checked in registration order
/// 2. The first strategy whose `can_extract` returns true is run
/// 3. If it returns an error or panics, the [`DefaultExtractor`] is used for
///    that object only
/// 4. If no strategy claims the object, the [`DefaultExtractor`] is used
///
/// Only one strategy ever runs per object.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ObjectExtractor>>,
    fallback: DefaultExtractor,
}

impl ExtractorRegistry {
    /// Creates a registry without strategies; everything goes to the fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in strategies ([`StringExtractor`]).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(StringExtractor);
        registry
    }

    /// Appends a strategy. Earlier registrations take precedence.
    pub fn register<E: ObjectExtractor + 'static>(&mut self, extractor: E) {
        self.extractors.push(Box::new(extractor));
    }

    /// Appends an already boxed strategy.
    pub fn register_boxed(&mut self, extractor: Box<dyn ObjectExtractor>) {
        self.extractors.push(extractor);
    }

    /// Finds the first strategy claiming `object`.
    #[must_use]
    pub fn find_matching(
        &self,
        object: &ObjectDescriptor,
        inspector: &dyn RuntimeInspector,
    ) -> Option<&dyn ObjectExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_extract(object, inspector))
            .map(|e| e.as_ref())
    }

    /// Runs the selected strategy on `object`.
    ///
    /// Never fails: errors and panics of the selected strategy are reported in
    /// [`Extracted::failure`] and replaced by generic extraction.
    pub fn extract(&self, object: &ObjectDescriptor, inspector: &dyn RuntimeInspector) -> Extracted {
        let Some(extractor) = self.find_matching(object, inspector) else {
            return self.fallback(object, inspector, None);
        };

        let result = catch_unwind(AssertUnwindSafe(|| extractor.extract(object, inspector)));
        let failure = match result {
            Ok(Ok(payload)) => {
                return Extracted {
                    payload,
                    extractor: extractor.name(),
                    failure: None,
                }
            }
            Ok(Err(e)) => ExtractionFailure {
                extractor: extractor.name(),
                message: e.to_string(),
                panicked: false,
            },
            Err(panic) => ExtractionFailure {
                extractor: extractor.name(),
                message: panic_message(panic.as_ref()),
                panicked: true,
            },
        };

        self.fallback(object, inspector, Some(failure))
    }

    fn fallback(
        &self,
        object: &ObjectDescriptor,
        inspector: &dyn RuntimeInspector,
        failure: Option<ExtractionFailure>,
    ) -> Extracted {
        Extracted {
            payload: self
                .fallback
                .extract(object, inspector)
                .unwrap_or_default(),
            extractor: self.fallback.name(),
            failure,
        }
    }

    /// Returns the number of registered strategies, not counting the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Returns `true` if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Names of the registered strategies, in resolution order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extractors.iter().map(|e| e.name())
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extractors", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "extractor panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extraction::TypeExtractor,
        inspector::SyntheticSnapshot,
        model::{Address, DumpTypeKey},
        Error,
    };

    fn descriptor(name: &str) -> ObjectDescriptor {
        ObjectDescriptor::new(Address(0x100), &DumpTypeKey::new(0x10, name), 24)
    }

    #[test]
    fn test_registry_empty_uses_fallback() {
        let registry = ExtractorRegistry::new();
        let snapshot = SyntheticSnapshot::new();
        assert!(registry.is_empty());

        let extracted = registry.extract(&descriptor("A"), &snapshot);
        assert_eq!(extracted.extractor, DefaultExtractor::NAME);
        assert!(extracted.payload.is_none());
        assert!(extracted.failure.is_none());
    }

    #[test]
    fn test_registration_order_wins() {
        let mut registry = ExtractorRegistry::new();
        registry.register(TypeExtractor::exact("first", "A", |_, _| {
            Ok(ObjectPayload::Text("first".into()))
        }));
        registry.register(TypeExtractor::exact("second", "A", |_, _| {
            Ok(ObjectPayload::Text("second".into()))
        }));

        let snapshot = SyntheticSnapshot::new();
        let extracted = registry.extract(&descriptor("A"), &snapshot);
        assert_eq!(extracted.extractor, "first");
        assert_eq!(extracted.payload, ObjectPayload::Text("first".into()));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn test_failing_extractor_falls_back() {
        let mut registry = ExtractorRegistry::new();
        registry.register(TypeExtractor::exact("broken", "A", |object, _| {
            Err(Error::Extraction {
                extractor: "broken".into(),
                address: object.address,
                message: "bad layout".into(),
            })
        }));

        let snapshot = SyntheticSnapshot::new();
        let extracted = registry.extract(&descriptor("A"), &snapshot);
        assert_eq!(extracted.extractor, DefaultExtractor::NAME);
        assert!(extracted.payload.is_none());

        let failure = extracted.failure.unwrap();
        assert_eq!(failure.extractor, "broken");
        assert!(failure.message.contains("bad layout"));
        assert!(!failure.panicked);
    }

    #[test]
    fn test_panicking_extractor_falls_back() {
        let mut registry = ExtractorRegistry::new();
        registry.register(TypeExtractor::exact("panics", "A", |_, _| {
            panic!("field offset out of range")
        }));

        let snapshot = SyntheticSnapshot::new();
        let extracted = registry.extract(&descriptor("A"), &snapshot);
        assert_eq!(extracted.extractor, DefaultExtractor::NAME);

        let failure = extracted.failure.unwrap();
        assert!(failure.panicked);
        assert_eq!(failure.message, "field offset out of range");
    }

    #[test]
    fn test_with_defaults_reads_strings() {
        let registry = ExtractorRegistry::with_defaults();
        let mut snapshot = SyntheticSnapshot::new();
        snapshot.add_string(Address(0x100), "hello");

        let extracted = registry.extract(&descriptor("System.String"), &snapshot);
        assert_eq!(extracted.extractor, "string");
        assert_eq!(extracted.payload, ObjectPayload::Text("hello".into()));
    }
}
