//! Compiler-emitted metadata records.
//!
//! These records are the binary contract shared with the code generator: one
//! [`ClassInfo`] aggregate per class, emitted statically and handed to the runtime
//! at load time through [`crate::Runtime::register_class`]. **Field order is part
//! of the ABI and is not negotiable**; the layout must precisely mirror what the
//! compiler emits.
//!
//! The records carry no behavior beyond conversion into the richer descriptor model
//! (see [`crate::metadata::descriptor`]). In particular the `-1`/`-2`/`>= 0` role
//! sentinel on [`MethodInfo::offset`] exists only at this edge; all internal logic
//! works on the tagged [`crate::metadata::descriptor::MethodRole`] instead.

use std::sync::{Arc, OnceLock};

use bitflags::bitflags;

use crate::metadata::handle::{ClassHandle, CodePtr, DispatchVectorPtr, StaticSlot};

/// Sentinel offset marking a static method slot.
pub const METHOD_OFFSET_STATIC: i32 = -1;
/// Sentinel offset marking a constructor slot.
pub const METHOD_OFFSET_CONSTRUCTOR: i32 = -2;

bitflags! {
    /// Java access and property modifiers, as defined by the class file format.
    ///
    /// The numeric values match the JVM `access_flags` encoding, so the compiler
    /// can emit the flag word unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u32 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private`
        const PRIVATE = 0x0002;
        /// Declared `protected`
        const PROTECTED = 0x0004;
        /// Declared `static`
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Declared `synchronized` (methods only)
        const SYNCHRONIZED = 0x0020;
        /// Declared `volatile` (fields only)
        const VOLATILE = 0x0040;
        /// Declared `transient` (fields only)
        const TRANSIENT = 0x0080;
        /// Declared `native` (methods only)
        const NATIVE = 0x0100;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Declared `strictfp` (methods only)
        const STRICT = 0x0800;
        /// Not present in source; emitted by the compiler
        const SYNTHETIC = 0x1000;
    }
}

impl Modifiers {
    /// Build a modifier set from the raw compiler-emitted flag word, dropping any
    /// bits outside the defined set.
    #[must_use]
    pub fn from_raw(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

/// Lazily materialized class object for a type.
///
/// ABI record: cached type handle cell, then the initializer. The code generator
/// emits one per referenced type; the runtime exports nine of them for the
/// primitive types (see [`crate::metadata::primitives`]).
///
/// The first successful initialization wins and is permanent; concurrent first
/// accesses run the initializer at most once and all observe the same handle.
pub struct TypeInfo {
    /// Cached type handle, absent until first access
    cached: OnceLock<ClassHandle>,
    /// Initializer invoked exactly once to materialize the handle
    init: fn() -> ClassHandle,
}

impl TypeInfo {
    /// Create an uninitialized record with the given initializer.
    #[must_use]
    pub const fn new(init: fn() -> ClassHandle) -> Self {
        TypeInfo {
            cached: OnceLock::new(),
            init,
        }
    }

    /// The materialized type handle, computing and publishing it on first access.
    pub fn get(&self) -> ClassHandle {
        *self.cached.get_or_init(self.init)
    }

    /// The cached handle if it has been materialized, without triggering the
    /// initializer.
    #[must_use]
    pub fn peek(&self) -> Option<ClassHandle> {
        self.cached.get().copied()
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo").field("cached", &self.peek()).finish()
    }
}

/// ABI record for one instance field.
///
/// Field order: name, byte offset, modifiers, type info, signature.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name (without signature)
    pub name: String,
    /// Byte offset of the field within an instance
    pub offset: i32,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Lazily materialized class object for the field's type
    pub type_info: Arc<TypeInfo>,
    /// JNI-style signature encoding of the field's type
    pub sig: String,
}

/// ABI record for one static field.
///
/// Represented differently from [`FieldInfo`] since static fields are implemented
/// as global storage. Field order: name, signature, storage pointer, modifiers,
/// type info.
#[derive(Debug, Clone)]
pub struct StaticFieldInfo {
    /// Field name (without signature)
    pub name: String,
    /// JNI-style signature encoding of the field's type
    pub sig: String,
    /// Address of the field's process-wide storage
    pub storage: StaticSlot,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Lazily materialized class object for the field's type
    pub type_info: Arc<TypeInfo>,
}

/// ABI record for one method slot.
///
/// Field order: name, signature, role/offset, function pointer, trampoline,
/// interface method id, interface method id hash, modifiers, return type,
/// argument types.
///
/// `offset` encodes the method's role: [`METHOD_OFFSET_STATIC`] for static methods,
/// [`METHOD_OFFSET_CONSTRUCTOR`] for constructors, any value `>= 0` is the slot in
/// the class's dispatch vector. `iface_id`/`iface_id_hash` are only meaningful for
/// interface-declared methods and are zero otherwise.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method name (without signature)
    pub name: String,
    /// JNI-style signature encoding
    pub sig: String,
    /// Role sentinel / dispatch vector slot (see type-level docs)
    pub offset: i32,
    /// Entry point, used for non-virtual and static calls
    pub fn_ptr: CodePtr,
    /// Trampoline for casting `fn_ptr` to the correct type at the call site
    pub trampoline: CodePtr,
    /// Interface method identity; zero when not interface-declared
    pub iface_id: usize,
    /// Precomputed hash of `iface_id`; zero when not interface-declared
    pub iface_id_hash: i32,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Handle of the return type's class; null handle for `void`
    pub return_type: ClassHandle,
    /// Handles of the argument types' classes, in declaration order
    pub arg_types: Vec<ClassHandle>,
}

/// ABI record for one class or interface.
///
/// Field order: name, superclass handle, dispatch vector pointer, object size,
/// is-interface flag, implemented interfaces, fields, static fields, methods.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Canonical dotted class name (e.g. `java.lang.String`)
    pub name: String,
    /// Handle of the superclass; `None` for root classes and interfaces
    pub super_class: Option<ClassHandle>,
    /// The class's compiler-generated dispatch vector (opaque)
    pub dispatch_vector: DispatchVectorPtr,
    /// Instance size in bytes
    pub obj_size: u32,
    /// True if this describes an interface
    pub is_interface: bool,
    /// Handles of the directly implemented interfaces
    pub interfaces: Vec<ClassHandle>,
    /// Instance field table
    pub fields: Vec<FieldInfo>,
    /// Static field table
    pub static_fields: Vec<StaticFieldInfo>,
    /// Method table
    pub methods: Vec<MethodInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_from_raw() {
        let m = Modifiers::from_raw(0x0019); // public static final
        assert!(m.contains(Modifiers::PUBLIC));
        assert!(m.contains(Modifiers::STATIC));
        assert!(m.contains(Modifiers::FINAL));
        assert!(!m.contains(Modifiers::PRIVATE));
    }

    #[test]
    fn test_modifiers_from_raw_drops_unknown_bits() {
        let m = Modifiers::from_raw(0x8000_0001);
        assert_eq!(m, Modifiers::PUBLIC);
    }

    #[test]
    fn test_type_info_lazy_materialization() {
        fn init() -> ClassHandle {
            ClassHandle::new(0x42)
        }

        let info = TypeInfo::new(init);
        assert_eq!(info.peek(), None);
        assert_eq!(info.get(), ClassHandle::new(0x42));
        assert_eq!(info.peek(), Some(ClassHandle::new(0x42)));
        // Second access observes the published value
        assert_eq!(info.get(), ClassHandle::new(0x42));
    }

    #[test]
    fn test_role_sentinels() {
        assert_eq!(METHOD_OFFSET_STATIC, -1);
        assert_eq!(METHOD_OFFSET_CONSTRUCTOR, -2);
    }
}
