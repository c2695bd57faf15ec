use crate::{
    extraction::ObjectExtractor,
    inspector::{ObjectDescriptor, RuntimeInspector},
    model::ObjectPayload,
    Result,
};

/// Generic extraction: address, type, size and generation, without payload.
///
/// Accepts every object and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtractor;

impl DefaultExtractor {
    /// Name recorded on objects produced by the fallback
    pub const NAME: &'static str = "default";
}

impl ObjectExtractor for DefaultExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_extract(&self, _object: &ObjectDescriptor, _inspector: &dyn RuntimeInspector) -> bool {
        true
    }

    fn extract(
        &self,
        _object: &ObjectDescriptor,
        _inspector: &dyn RuntimeInspector,
    ) -> Result<ObjectPayload> {
        Ok(ObjectPayload::None)
    }
}
