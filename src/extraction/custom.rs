//! Extractors assembled from a type matcher and a closure.

use std::fmt;

use regex::Regex;

use crate::{
    extraction::ObjectExtractor,
    inspector::{ObjectDescriptor, RuntimeInspector},
    model::ObjectPayload,
    Result,
};

/// Type alias for extraction closures.
pub type ExtractFn =
    dyn Fn(&ObjectDescriptor, &dyn RuntimeInspector) -> Result<ObjectPayload> + Send + Sync;

enum TypeMatcher {
    Exact(String),
    Pattern(Regex),
}

impl TypeMatcher {
    fn matches(&self, type_name: &str) -> bool {
        match self {
            TypeMatcher::Exact(name) => name == type_name,
            TypeMatcher::Pattern(pattern) => pattern.is_match(type_name),
        }
    }
}

impl fmt::Display for TypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeMatcher::Exact(name) => write!(f, "type={name}"),
            TypeMatcher::Pattern(pattern) => write!(f, "type=~{}", pattern.as_str()),
        }
    }
}

/// An [`ObjectExtractor`] that claims objects by type name.
///
/// ```rust
/// use regex::Regex;
/// use dumpgraph::extraction::TypeExtractor;
/// use dumpgraph::model::ObjectPayload;
///
/// let sessions = TypeExtractor::pattern(
///     "sessions",
///     Regex::new(r"^Contoso\.Web\..*Session$").unwrap(),
///     |_, _| Ok(ObjectPayload::None),
/// );
/// ```
pub struct TypeExtractor {
    name: &'static str,
    matcher: TypeMatcher,
    extract: Box<ExtractFn>,
}

impl TypeExtractor {
    /// Claims objects whose type name equals `type_name`
    pub fn exact<F>(name: &'static str, type_name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&ObjectDescriptor, &dyn RuntimeInspector) -> Result<ObjectPayload>
            + Send
            + Sync
            + 'static,
    {
        TypeExtractor {
            name,
            matcher: TypeMatcher::Exact(type_name.into()),
            extract: Box::new(extract),
        }
    }

    /// Claims objects whose type name matches `pattern`
    pub fn pattern<F>(name: &'static str, pattern: Regex, extract: F) -> Self
    where
        F: Fn(&ObjectDescriptor, &dyn RuntimeInspector) -> Result<ObjectPayload>
            + Send
            + Sync
            + 'static,
    {
        TypeExtractor {
            name,
            matcher: TypeMatcher::Pattern(pattern),
            extract: Box::new(extract),
        }
    }
}

impl ObjectExtractor for TypeExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn can_extract(&self, object: &ObjectDescriptor, _inspector: &dyn RuntimeInspector) -> bool {
        object
            .type_name
            .as_deref()
            .is_some_and(|type_name| self.matcher.matches(type_name))
    }

    fn extract(
        &self,
        object: &ObjectDescriptor,
        inspector: &dyn RuntimeInspector,
    ) -> Result<ObjectPayload> {
        (self.extract)(object, inspector)
    }
}

impl fmt::Debug for TypeExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeExtractor")
            .field("name", &self.name)
            .field("matcher", &self.matcher.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inspector::SyntheticSnapshot,
        model::{Address, DumpTypeKey},
    };

    fn descriptor(name: &str) -> ObjectDescriptor {
        ObjectDescriptor::new(Address(0x100), &DumpTypeKey::new(0x10, name), 24)
    }

    #[test]
    fn test_exact_match() {
        let snapshot = SyntheticSnapshot::new();
        let extractor = TypeExtractor::exact("orders", "Contoso.Order", |_, _| {
            Ok(ObjectPayload::Text("order".into()))
        });

        assert!(extractor.can_extract(&descriptor("Contoso.Order"), &snapshot));
        assert!(!extractor.can_extract(&descriptor("Contoso.OrderLine"), &snapshot));
        assert_eq!(
            extractor
                .extract(&descriptor("Contoso.Order"), &snapshot)
                .unwrap(),
            ObjectPayload::Text("order".into())
        );
    }

    #[test]
    fn test_pattern_match() {
        let snapshot = SyntheticSnapshot::new();
        let extractor = TypeExtractor::pattern(
            "generic lists",
            Regex::new(r"^System\.Collections\.Generic\.List<.*>$").unwrap(),
            |_, _| Ok(ObjectPayload::None),
        );

        assert!(extractor.can_extract(
            &descriptor("System.Collections.Generic.List<System.String>"),
            &snapshot
        ));
        assert!(!extractor.can_extract(&descriptor("System.String"), &snapshot));

        let mut unnamed = descriptor("x");
        unnamed.type_name = None;
        assert!(!extractor.can_extract(&unnamed, &snapshot));
    }

    #[test]
    fn test_debug_shows_matcher() {
        let extractor = TypeExtractor::exact("orders", "Contoso.Order", |_, _| {
            Ok(ObjectPayload::None)
        });
        assert!(format!("{extractor:?}").contains("type=Contoso.Order"));
    }
}
