//! Heap objects and their reference edges.

use std::{collections::BTreeMap, fmt};

use crossbeam_skiplist::SkipSet;
use strum::{EnumCount, EnumIter};

use crate::model::{Address, DumpTypeKey};

/// Maximum number of characters of a string payload shown in short descriptions
pub const SHORT_DESCRIPTION_PREVIEW: usize = 24;

/// The GC generation an object was found in at capture time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
pub enum Generation {
    /// Generation 0 (youngest)
    Gen0,
    /// Generation 1
    Gen1,
    /// Generation 2 (oldest small object generation)
    Gen2,
    /// Large object heap
    LargeObjectHeap,
    /// Pinned object heap
    PinnedObjectHeap,
    /// The inspector could not determine the generation
    Unknown,
}

impl From<i32> for Generation {
    fn from(value: i32) -> Self {
        match value {
            0 => Generation::Gen0,
            1 => Generation::Gen1,
            2 => Generation::Gen2,
            3 => Generation::LargeObjectHeap,
            4 => Generation::PinnedObjectHeap,
            _ => Generation::Unknown,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Gen0 => write!(f, "gen0"),
            Generation::Gen1 => write!(f, "gen1"),
            Generation::Gen2 => write!(f, "gen2"),
            Generation::LargeObjectHeap => write!(f, "loh"),
            Generation::PinnedObjectHeap => write!(f, "poh"),
            Generation::Unknown => write!(f, "unknown"),
        }
    }
}

/// Type-specific data interpreted by an extractor.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ObjectPayload {
    /// Generic extraction only
    #[default]
    None,
    /// Textual value, e.g. the contents of a System.String
    Text(String),
    /// Named values read by a custom extractor
    Properties(BTreeMap<String, String>),
}

impl ObjectPayload {
    /// Returns true if no extractor-specific data is present
    pub fn is_none(&self) -> bool {
        matches!(self, ObjectPayload::None)
    }
}

/// One live heap object at capture time.
///
/// Everything except the two edge sets is fixed when the object is created. The
/// edge sets are filled by the graph linker, which runs after every object exists
/// and may insert from several threads at once.
pub struct DumpObject {
    /// Address of the object; unique in the object store
    pub address: Address,
    /// Key of the owning type
    pub type_key: DumpTypeKey,
    /// Size of the object in bytes
    pub size: u64,
    /// GC generation at capture time
    pub generation: Generation,
    /// Extractor-specific payload
    pub payload: ObjectPayload,
    /// Name of the extractor that produced this object
    pub extractor: &'static str,
    references: SkipSet<Address>,
    referencers: SkipSet<Address>,
}

impl DumpObject {
    /// Create a new object without edges
    pub fn new(
        address: Address,
        type_key: DumpTypeKey,
        size: u64,
        generation: Generation,
        payload: ObjectPayload,
        extractor: &'static str,
    ) -> Self {
        DumpObject {
            address,
            type_key,
            size,
            generation,
            payload,
            extractor,
            references: SkipSet::new(),
            referencers: SkipSet::new(),
        }
    }

    /// The display name of the owning type
    pub fn type_name(&self) -> &str {
        &self.type_key.name
    }

    /// Addresses this object references, in address order
    pub fn references(&self) -> impl Iterator<Item = Address> + '_ {
        self.references.iter().map(|entry| *entry.value())
    }

    /// Addresses of the objects referencing this one, in address order
    pub fn referencers(&self) -> impl Iterator<Item = Address> + '_ {
        self.referencers.iter().map(|entry| *entry.value())
    }

    /// Returns true if this object references `address`
    pub fn references_address(&self, address: Address) -> bool {
        self.references.contains(&address)
    }

    /// Returns true if the object at `address` references this object
    pub fn is_referenced_by(&self, address: Address) -> bool {
        self.referencers.contains(&address)
    }

    /// Number of outbound edges
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Number of inbound edges
    pub fn referencer_count(&self) -> usize {
        self.referencers.len()
    }

    pub(crate) fn add_reference(&self, child: Address) {
        self.references.insert(child);
    }

    pub(crate) fn add_referencer(&self, parent: Address) {
        self.referencers.insert(parent);
    }

    /// A single-line description of the object
    pub fn short_description(&self) -> String {
        let base = format!(
            "{} {} ({} bytes, {})",
            self.address, self.type_key.name, self.size, self.generation
        );
        match &self.payload {
            ObjectPayload::Text(value) => {
                let preview: String = value.chars().take(SHORT_DESCRIPTION_PREVIEW).collect();
                format!("{base} - {preview}")
            }
            _ => base,
        }
    }
}

impl PartialEq for DumpObject {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.type_key == other.type_key
            && self.size == other.size
            && self.generation == other.generation
            && self.payload == other.payload
    }
}

impl Eq for DumpObject {}

impl fmt::Debug for DumpObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpObject")
            .field("address", &self.address)
            .field("type_key", &self.type_key)
            .field("size", &self.size)
            .field("generation", &self.generation)
            .field("payload", &self.payload)
            .field("extractor", &self.extractor)
            .field("references", &self.references.len())
            .field("referencers", &self.referencers.len())
            .finish()
    }
}
