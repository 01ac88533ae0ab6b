use thiserror::Error;

use crate::metadata::handle::{ClassHandle, IfaceMethodId};

/// The generic Error type, which provides coverage for all errors this library can
/// potentially return.
///
/// Lookup misses are expected runtime conditions and map to the `*NotFound` variants;
/// callers translate them into the pending-exception channel owned outside this crate.
/// The remaining variants report programming or codegen errors that must never occur
/// in a well-typed program.
///
/// # Error Categories
///
/// ## Lookup Misses
/// - [`Error::ClassNotFound`] - No class registered under the queried canonical name
/// - [`Error::HandleNotFound`] - No class registered under the queried handle
/// - [`Error::FieldNotFound`] - Instance field absent after walking the superclass chain
/// - [`Error::StaticFieldNotFound`] - Static field absent after walking the superclass chain
/// - [`Error::MethodNotFound`] - Method absent from the chain and all implemented interfaces
///
/// ## Registration and Loading
/// - [`Error::DuplicateRegistration`] - A class handle was registered twice
/// - [`Error::CircularLoad`] - A load re-entered itself on the same call stack
/// - [`Error::ClassLoadFailure`] - The external class loader failed; registry rolled back
///
/// ## Invariant Violations
/// - [`Error::InvalidOperation`] - Query applied to a descriptor of the wrong kind
/// - [`Error::InterfaceMethodResolutionFailure`] - Interface dispatch table miss
#[derive(Error, Debug)]
pub enum Error {
    /// No class is registered under the queried canonical name.
    ///
    /// Returned after the on-demand loading path (if a loader is configured) has been
    /// exhausted. The registry is left exactly as it was before the lookup.
    #[error("Class not found - {0}")]
    ClassNotFound(String),

    /// No class is registered under the queried handle.
    ///
    /// Handles are assigned by the code generator; querying one that was never
    /// registered usually means the owning shared unit has not been loaded yet.
    #[error("No class registered for handle {0}")]
    HandleNotFound(ClassHandle),

    /// An instance field was not found after exhausting the superclass chain.
    #[error("Field '{name}' not found on class {class} or its superclasses")]
    FieldNotFound {
        /// Canonical name of the class the lookup was scoped at
        class: String,
        /// The queried field name
        name: String,
    },

    /// A static field was not found after exhausting the superclass chain.
    ///
    /// Static fields match on name and signature together, since a subclass may
    /// shadow a superclass static with a different type.
    #[error("Static field '{name}:{sig}' not found on class {class} or its superclasses")]
    StaticFieldNotFound {
        /// Canonical name of the class the lookup was scoped at
        class: String,
        /// The queried field name
        name: String,
        /// The queried field signature
        sig: String,
    },

    /// A method was not found in the class chain or any transitively implemented
    /// interface.
    #[error("Method '{name}{sig}' not found on class {class}")]
    MethodNotFound {
        /// Canonical name of the class the lookup was scoped at
        class: String,
        /// The queried method name
        name: String,
        /// The queried method signature
        sig: String,
    },

    /// A class handle was registered a second time.
    ///
    /// Registration happens at most once per class; a second registration is an
    /// invariant violation in the loading path, not an expected runtime condition.
    /// The first registration stays visible, untouched.
    #[error("Class already registered for handle {0}")]
    DuplicateRegistration(ClassHandle),

    /// An on-demand load re-entered a name already loading on the same call stack.
    ///
    /// Detected through the owner thread recorded on the loading placeholder.
    /// Surfacing this instead of parking the thread avoids a self-deadlock on
    /// cyclic load dependencies.
    #[error("Cyclic load dependency while loading class '{0}'")]
    CircularLoad(String),

    /// The external class loader failed, or returned without registering the class.
    ///
    /// The loading placeholder has been removed and any waiting threads woken; the
    /// registry is exactly as it was before the load attempt.
    #[error("Failed to load class '{name}': {reason}")]
    ClassLoadFailure {
        /// Canonical name of the class the load was attempted for
        name: String,
        /// Reason reported by the loader, or a description of the protocol violation
        reason: String,
    },

    /// A query was applied to a descriptor of the wrong kind, e.g. a component-class
    /// query on a non-array class.
    #[error("{0}")]
    InvalidOperation(String),

    /// The interface dispatch table has no binding for the queried method identity.
    ///
    /// In a well-typed program this must not happen; it signals a mismatch between
    /// the compiler-emitted metadata and the dispatch table contents. Fatal in
    /// production, reported as an error so tests can observe it.
    #[error("No implementation bound for interface method {id} on class {class}")]
    InterfaceMethodResolutionFailure {
        /// Canonical name of the class the resolution was attempted on
        class: String,
        /// The interface method identity that missed
        id: IfaceMethodId,
    },
}
