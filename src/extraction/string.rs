use crate::{
    extraction::ObjectExtractor,
    inspector::{ObjectDescriptor, RuntimeInspector},
    model::ObjectPayload,
    Error, Result,
};

/// Type name of the runtime's string type
pub const STRING_TYPE_NAME: &str = "System.String";

/// Reads the value of `System.String` objects into a text payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringExtractor;

impl ObjectExtractor for StringExtractor {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_extract(&self, object: &ObjectDescriptor, _inspector: &dyn RuntimeInspector) -> bool {
        object.is_type(STRING_TYPE_NAME)
    }

    fn extract(
        &self,
        object: &ObjectDescriptor,
        inspector: &dyn RuntimeInspector,
    ) -> Result<ObjectPayload> {
        inspector
            .read_string(object.address)
            .map(ObjectPayload::Text)
            .map_err(|e| Error::Extraction {
                extractor: self.name().to_string(),
                address: object.address,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inspector::SyntheticSnapshot,
        model::{Address, DumpTypeKey},
    };

    #[test]
    fn test_reads_string_value() {
        let mut snapshot = SyntheticSnapshot::new();
        snapshot.add_string(Address(0x100), "hello");

        let key = DumpTypeKey::new(0x10, STRING_TYPE_NAME);
        let object = ObjectDescriptor::new(Address(0x100), &key, 32);

        assert!(StringExtractor.can_extract(&object, &snapshot));
        assert_eq!(
            StringExtractor.extract(&object, &snapshot).unwrap(),
            ObjectPayload::Text("hello".to_string())
        );
    }

    #[test]
    fn test_unreadable_string_is_extraction_error() {
        let snapshot = SyntheticSnapshot::new();
        let key = DumpTypeKey::new(0x10, STRING_TYPE_NAME);
        let object = ObjectDescriptor::new(Address(0x100), &key, 32);

        let err = StringExtractor.extract(&object, &snapshot).unwrap_err();
        assert!(matches!(err, Error::Extraction { address, .. } if address == Address(0x100)));
    }

    #[test]
    fn test_ignores_other_types() {
        let snapshot = SyntheticSnapshot::new();
        let key = DumpTypeKey::new(0x18, "System.Object");
        let object = ObjectDescriptor::new(Address(0x100), &key, 24);
        assert!(!StringExtractor.can_extract(&object, &snapshot));
    }
}
