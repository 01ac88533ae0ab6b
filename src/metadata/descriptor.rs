//! Immutable in-memory descriptors built from the raw ABI records.
//!
//! Where [`crate::metadata::raw`] is a wire contract, this module is the model the
//! rest of the crate works on: role sentinels become the tagged [`MethodRole`],
//! the is-interface flag and the runtime-minted primitive/array classes collapse
//! into [`ClassKind`], and every descriptor is reference-counted so lookups can
//! hand them out without copying.
//!
//! Descriptors never mutate after registration. The two exceptions are
//! first-writer-wins cells: the lazily built interface dispatch table attached to
//! each class, and the cached type handles inside [`crate::metadata::raw::TypeInfo`].

use std::sync::{Arc, OnceLock};

use crate::{
    metadata::{
        handle::{ClassHandle, CodePtr, DispatchVectorPtr, IfaceMethodId, StaticSlot},
        interfaces::InterfaceDispatchTable,
        primitives::PrimitiveKind,
        raw::{
            ClassInfo, FieldInfo, MethodInfo, Modifiers, StaticFieldInfo, TypeInfo,
            METHOD_OFFSET_CONSTRUCTOR, METHOD_OFFSET_STATIC,
        },
    },
    Error::InvalidOperation,
    Result,
};

/// Reference to a [`ClassDescriptor`]
pub type ClassDescriptorRc = Arc<ClassDescriptor>;
/// Reference to a [`FieldDescriptor`]
pub type FieldRc = Arc<FieldDescriptor>;
/// Reference to a [`StaticFieldDescriptor`]
pub type StaticFieldRc = Arc<StaticFieldDescriptor>;
/// Reference to a [`MethodDescriptor`]
pub type MethodRc = Arc<MethodDescriptor>;

/// The role of a method slot, decoded from the ABI offset sentinel.
///
/// Internal logic never sees the raw `-1`/`-2`/`>= 0` encoding; it is translated
/// here at the boundary and back only when a caller needs the wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    /// A static method (`offset == -1` on the wire)
    Static,
    /// A constructor (`offset == -2` on the wire)
    Constructor,
    /// An instance method occupying the given dispatch vector slot
    Instance(u32),
}

impl MethodRole {
    /// Decode the ABI offset sentinel.
    ///
    /// # Errors
    /// Returns [`InvalidOperation`] for negative values other than the two defined
    /// sentinels, which can only come from malformed metadata.
    pub fn from_offset(offset: i32) -> Result<Self> {
        match offset {
            METHOD_OFFSET_STATIC => Ok(MethodRole::Static),
            METHOD_OFFSET_CONSTRUCTOR => Ok(MethodRole::Constructor),
            #[allow(clippy::cast_sign_loss)]
            slot if slot >= 0 => Ok(MethodRole::Instance(slot as u32)),
            other => Err(InvalidOperation(format!(
                "invalid method offset sentinel: {other}"
            ))),
        }
    }

    /// Encode back to the ABI offset sentinel.
    #[must_use]
    pub fn to_offset(&self) -> i32 {
        match self {
            MethodRole::Static => METHOD_OFFSET_STATIC,
            MethodRole::Constructor => METHOD_OFFSET_CONSTRUCTOR,
            #[allow(clippy::cast_possible_wrap)]
            MethodRole::Instance(slot) => *slot as i32,
        }
    }

    /// Returns true for [`MethodRole::Static`]
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, MethodRole::Static)
    }

    /// Returns true for [`MethodRole::Constructor`]
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self, MethodRole::Constructor)
    }
}

/// What kind of type a [`ClassDescriptor`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// An ordinary class
    Class,
    /// An interface
    Interface,
    /// One of the nine primitive singletons
    Primitive(PrimitiveKind),
    /// An array class; the payload is the component class handle
    Array(ClassHandle),
}

/// The identity an interface declares for one of its methods: the opaque id plus
/// its precomputed hash, constant across all implementers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfaceIdent {
    /// The compile-time-assigned identity (never zero when populated)
    pub id: IfaceMethodId,
    /// Precomputed hash of `id`, used for dispatch table placement
    pub hash: i32,
}

/// One instance field of a class.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Byte offset within an instance
    pub offset: i32,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Lazily materialized class object for the field's type
    pub type_info: Arc<TypeInfo>,
    /// JNI-style type signature
    pub sig: String,
}

impl FieldDescriptor {
    fn from_raw(raw: &FieldInfo) -> Self {
        FieldDescriptor {
            name: raw.name.clone(),
            offset: raw.offset,
            modifiers: raw.modifiers,
            type_info: raw.type_info.clone(),
            sig: raw.sig.clone(),
        }
    }
}

/// One static field of a class, backed by process-wide storage.
#[derive(Debug, Clone)]
pub struct StaticFieldDescriptor {
    /// Field name
    pub name: String,
    /// JNI-style type signature
    pub sig: String,
    /// Address of the backing storage
    pub storage: StaticSlot,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Lazily materialized class object for the field's type
    pub type_info: Arc<TypeInfo>,
}

impl StaticFieldDescriptor {
    fn from_raw(raw: &StaticFieldInfo) -> Self {
        StaticFieldDescriptor {
            name: raw.name.clone(),
            sig: raw.sig.clone(),
            storage: raw.storage,
            modifiers: raw.modifiers,
            type_info: raw.type_info.clone(),
        }
    }
}

/// One method slot of a class.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// JNI-style signature
    pub sig: String,
    /// Decoded role (static / constructor / instance slot)
    pub role: MethodRole,
    /// Entry point for non-virtual and static calls
    pub fn_ptr: CodePtr,
    /// Trampoline for casting `fn_ptr` to the correct type
    pub trampoline: CodePtr,
    /// Interface-declared identity; `None` for ordinary methods
    pub iface_ident: Option<IfaceIdent>,
    /// Access modifiers
    pub modifiers: Modifiers,
    /// Handle of the return type's class; null for `void`
    pub return_type: ClassHandle,
    /// Handles of the argument types, in declaration order
    pub arg_types: Vec<ClassHandle>,
}

impl MethodDescriptor {
    /// Build a descriptor from the raw ABI record, decoding the role sentinel and
    /// the interface identity.
    ///
    /// # Errors
    /// Returns [`InvalidOperation`] if the offset sentinel is malformed.
    pub fn from_raw(raw: &MethodInfo) -> Result<Self> {
        let iface_ident = if raw.iface_id == 0 {
            None
        } else {
            Some(IfaceIdent {
                id: IfaceMethodId::new(raw.iface_id),
                hash: raw.iface_id_hash,
            })
        };

        Ok(MethodDescriptor {
            name: raw.name.clone(),
            sig: raw.sig.clone(),
            role: MethodRole::from_offset(raw.offset)?,
            fn_ptr: raw.fn_ptr,
            trampoline: raw.trampoline,
            iface_ident,
            modifiers: raw.modifiers,
            return_type: raw.return_type,
            arg_types: raw.arg_types.clone(),
        })
    }

    /// True if this method carries an interface-declared identity.
    ///
    /// A method is interface-declared exactly when its identity is populated and
    /// non-zero; the hash alone is not authoritative (zero is a legal hash value
    /// only for the absent identity).
    #[must_use]
    pub fn is_interface_declared(&self) -> bool {
        self.iface_ident.is_some()
    }

    /// Exact identity match: name and signature must both be equal.
    #[must_use]
    pub fn matches(&self, name: &str, sig: &str) -> bool {
        self.name == name && self.sig == sig
    }
}

/// One loaded class or interface.
///
/// Built once from the raw [`ClassInfo`] at registration (or minted directly by the
/// runtime for primitives and arrays) and never mutated afterwards, except for the
/// lazily attached interface dispatch table.
pub struct ClassDescriptor {
    /// The handle this class was registered under
    pub handle: ClassHandle,
    /// Canonical dotted name
    pub name: String,
    /// Superclass handle; `None` for root classes, interfaces and primitives
    pub super_class: Option<ClassHandle>,
    /// The compiler-generated dispatch vector (opaque)
    pub dispatch_vector: DispatchVectorPtr,
    /// Instance size in bytes
    pub obj_size: u32,
    /// Class / interface / primitive / array classification
    pub kind: ClassKind,
    /// Handles of the directly implemented interfaces
    pub interfaces: Vec<ClassHandle>,
    /// Instance field table
    pub fields: Vec<FieldRc>,
    /// Static field table
    pub static_fields: Vec<StaticFieldRc>,
    /// Method table
    pub methods: Vec<MethodRc>,
    /// Interface dispatch table, built on first interface resolution
    pub(crate) iface_dispatch: OnceLock<InterfaceDispatchTable>,
}

impl ClassDescriptor {
    /// Build a descriptor from the compiler-emitted record.
    ///
    /// The class name is canonicalized to the dotted spelling so both external
    /// spellings resolve to one registry key.
    ///
    /// # Errors
    /// Returns [`InvalidOperation`] if any method record carries a malformed role
    /// sentinel.
    pub fn from_raw(handle: ClassHandle, raw: &ClassInfo) -> Result<Self> {
        let methods = raw
            .methods
            .iter()
            .map(|m| MethodDescriptor::from_raw(m).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassDescriptor {
            handle,
            name: raw.name.replace('/', "."),
            super_class: raw.super_class,
            dispatch_vector: raw.dispatch_vector,
            obj_size: raw.obj_size,
            kind: if raw.is_interface {
                ClassKind::Interface
            } else {
                ClassKind::Class
            },
            interfaces: raw.interfaces.clone(),
            fields: raw.fields.iter().map(|f| Arc::new(FieldDescriptor::from_raw(f))).collect(),
            static_fields: raw
                .static_fields
                .iter()
                .map(|f| Arc::new(StaticFieldDescriptor::from_raw(f)))
                .collect(),
            methods,
            iface_dispatch: OnceLock::new(),
        })
    }

    /// True if this descriptor describes an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface)
    }

    /// True if this descriptor describes an array class.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ClassKind::Array(_))
    }

    /// True if this descriptor describes a primitive singleton.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, ClassKind::Primitive(_))
    }

    /// Find a method declared directly on this class by exact (name, signature),
    /// returning its index in the method table.
    #[must_use]
    pub fn find_method_local(&self, name: &str, sig: &str) -> Option<(usize, &MethodRc)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| m.matches(name, sig))
    }

    /// Find an instance field declared directly on this class by name.
    #[must_use]
    pub fn find_field_local(&self, name: &str) -> Option<&FieldRc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a static field declared directly on this class by (name, signature).
    #[must_use]
    pub fn find_static_field_local(&self, name: &str, sig: &str) -> Option<&StaticFieldRc> {
        self.static_fields
            .iter()
            .find(|f| f.name == name && f.sig == sig)
    }
}

impl std::fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("super_class", &self.super_class)
            .field("fields", &self.fields.len())
            .field("static_fields", &self.static_fields.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}
