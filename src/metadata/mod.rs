//! Class metadata: raw ABI records, descriptors, the registry and the
//! resolution machinery built on top of it.
//!
//! The layering runs bottom-up:
//!
//! - [`handle`] - opaque newtypes for the pointer-sized values crossing the ABI
//! - [`raw`] - the compiler-emitted record layouts, kept faithful to the wire
//! - [`descriptor`] - the immutable in-memory model built from the raw records
//! - [`registry`] - the concurrent name/handle maps with on-demand loading
//! - [`resolver`] - inheritance-chain member resolution over the registry
//! - [`interfaces`] - hash-based interface method dispatch tables
//! - [`intern`] - the string literal intern pool
//! - [`primitives`] - primitive singletons and runtime-minted array classes

pub mod descriptor;
pub mod handle;
pub mod intern;
pub mod interfaces;
pub mod primitives;
pub mod raw;
pub mod registry;
pub mod resolver;

pub use descriptor::{
    ClassDescriptor, ClassDescriptorRc, ClassKind, FieldDescriptor, FieldRc, IfaceIdent,
    MethodDescriptor, MethodRc, MethodRole, StaticFieldDescriptor, StaticFieldRc,
};
pub use handle::{ClassHandle, CodePtr, DispatchVectorPtr, IfaceMethodId, StaticSlot};
pub use intern::{InternPool, InternedString};
pub use interfaces::{resolve_interface_method, InterfaceDispatchTable};
pub use primitives::{ArrayPrimitiveCatalog, PrimitiveKind};
pub use raw::{
    ClassInfo, FieldInfo, MethodInfo, Modifiers, StaticFieldInfo, TypeInfo,
    METHOD_OFFSET_CONSTRUCTOR, METHOD_OFFSET_STATIC,
};
pub use registry::{ClassLoader, ClassRegistry};
pub use resolver::ResolutionEngine;
