//! Convenient re-exports of the most commonly used types and traits.
//!
//! Intended for glob import:
//!
//! ```rust
//! use classmeta::prelude::*;
//! ```

pub use crate::metadata::descriptor::{
    ClassDescriptor, ClassDescriptorRc, ClassKind, FieldDescriptor, FieldRc, IfaceIdent,
    MethodDescriptor, MethodRc, MethodRole, StaticFieldDescriptor, StaticFieldRc,
};
pub use crate::metadata::handle::{
    ClassHandle, CodePtr, DispatchVectorPtr, IfaceMethodId, StaticSlot,
};
pub use crate::metadata::intern::{InternPool, InternedString};
pub use crate::metadata::primitives::PrimitiveKind;
pub use crate::metadata::raw::{
    ClassInfo, FieldInfo, MethodInfo, Modifiers, StaticFieldInfo, TypeInfo,
};
pub use crate::{ClassLoader, Error, Result, Runtime};
