use thiserror::Error;

use crate::model::{Address, DumpTypeKey};

macro_rules! structural_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Structural {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Structural {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

pub(crate) use structural_error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only failures that abort a construction run, or lookups that miss on a finished
/// repository, surface as an [`Error`]. Problems with a single object, edge, root or
/// diagnostic line are absorbed by the pass that detects them and reported through
/// [`crate::diagnostics::Diagnostics`] instead.
///
/// # Error Categories
///
/// ## Inspector Errors
/// - [`Error::Inspector`] - The runtime inspector failed a top-level enumeration
/// - [`Error::NotSupported`] - The inspector does not offer the requested capability
///
/// ## Lookup Errors
/// - [`Error::ObjectNotFound`], [`Error::TypeNotFound`], [`Error::ModuleNotFound`],
///   [`Error::AppDomainNotFound`], [`Error::ThreadNotFound`], [`Error::RootNotFound`]
///
/// ## Structural Defects
/// - [`Error::DuplicateAddress`] - Two objects claimed the same heap address
/// - [`Error::UnknownObjectType`] - An object referenced a type the module pass never saw
/// - [`Error::Structural`] - Any other broken build-order invariant
///
/// ## Extraction Errors
/// - [`Error::Extraction`] - A type-specific extractor could not interpret an object
///
/// # Examples
///
/// ```rust,no_run
/// use dumpgraph::{Error, model::Address};
/// # fn demo(repos: &dumpgraph::repository::DumpRepositories) {
/// match repos.objects().get(Address(0x7ff0_1000)) {
///     Ok(object) => println!("{}", object.short_description()),
///     Err(Error::ObjectNotFound(address)) => eprintln!("nothing lives at {address}"),
///     Err(e) => eprintln!("lookup failed: {e}"),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Inspector errors
    /// The runtime inspector failed while enumerating a top-level collection.
    ///
    /// Raised when the snapshot cannot be opened or when enumerating modules,
    /// objects, roots or threads fails as a whole. Construction aborts.
    #[error("Runtime inspector failure - {0}")]
    Inspector(String),

    /// The inspector does not provide the requested capability.
    #[error("This operation is not supported by the inspector")]
    NotSupported,

    // Lookup errors
    /// No object lives at the requested address.
    #[error("There is no object matching address: {0}")]
    ObjectNotFound(Address),

    /// No type with the requested key was loaded.
    #[error("There is no type matching key: {0}")]
    TypeNotFound(DumpTypeKey),

    /// No module was loaded at the requested address.
    #[error("There is no module matching address: {0}")]
    ModuleNotFound(Address),

    /// No application domain exists at the requested address.
    #[error("There is no app domain matching address: {0}")]
    AppDomainNotFound(Address),

    /// No thread with the requested OS id was captured.
    #[error("There is no thread matching os id: {0}")]
    ThreadNotFound(u32),

    /// No GC root exists at the requested address.
    #[error("There is no object root matching address: {0}")]
    RootNotFound(Address),

    // Structural defects
    /// Two heap objects were reported at the same address.
    ///
    /// The object store keys every object by its address; a collision means the
    /// inspector reported the heap inconsistently or the build order is broken.
    #[error("Duplicate object address {address} (types {existing} and {incoming})")]
    DuplicateAddress {
        /// The address both objects claimed
        address: Address,
        /// The type of the object already in the store
        existing: DumpTypeKey,
        /// The type of the object that collided with it
        incoming: DumpTypeKey,
    },

    /// An object referenced a type that the module/type pass did not register.
    #[error("Object {address} references type {key} which was not discovered in any module")]
    UnknownObjectType {
        /// Address of the offending object
        address: Address,
        /// The unresolved type key
        key: DumpTypeKey,
    },

    /// A build-order invariant was violated.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the violation was detected
    /// * `line` - Source line where the violation was detected
    #[error("Structural defect - {file}:{line}: {message}")]
    Structural {
        /// The message to be printed for the Structural error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    // Extraction errors
    /// A type-specific extractor failed to interpret an object.
    ///
    /// Extractors return this to the registry, which records it and falls back
    /// to generic extraction for that object.
    #[error("Extractor '{extractor}' failed on {address}: {message}")]
    Extraction {
        /// Name of the failing extractor
        extractor: String,
        /// Address of the object being extracted
        address: Address,
        /// What went wrong
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_macro() {
        let err = structural_error!("broken order in pass {}", 2);
        match err {
            Error::Structural {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "broken order in pass 2");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::ObjectNotFound(Address(0x1000));
        assert_eq!(
            err.to_string(),
            "There is no object matching address: 0x0000000000001000"
        );

        let err = Error::ThreadNotFound(0x1c8c);
        assert_eq!(err.to_string(), "There is no thread matching os id: 7308");
    }

    #[test]
    fn test_duplicate_address_display() {
        let err = Error::DuplicateAddress {
            address: Address(0x20),
            existing: DumpTypeKey::new(0x10, "System.String"),
            incoming: DumpTypeKey::new(0x18, "System.Object"),
        };
        let text = err.to_string();
        assert!(text.contains("0x0000000000000020"));
        assert!(text.contains("System.String"));
        assert!(text.contains("System.Object"));
    }
}
