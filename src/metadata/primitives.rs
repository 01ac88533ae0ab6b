//! Primitive and array type singletons.
//!
//! The runtime owns nine well-known primitive descriptors (the integral widths,
//! the floating widths, `char`, `boolean` and `void`), each with a fixed
//! process-wide [`ClassHandle`] and a lazily materialized class object exposed as
//! a fixed [`TypeInfo`] symbol for the code generator to reference directly.
//!
//! Array classes are not emitted by the compiler; they are minted on demand by the
//! [`ArrayPrimitiveCatalog`] when first requested for a component type, and then
//! registered like any other class under the canonical name `Component[]`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use strum::IntoEnumIterator;

use crate::{
    metadata::{
        descriptor::{ClassDescriptor, ClassDescriptorRc, ClassKind},
        handle::{ClassHandle, DispatchVectorPtr},
        raw::TypeInfo,
        registry::ClassRegistry,
    },
    Error::{ClassNotFound, DuplicateRegistration, InvalidOperation},
    Result,
};

/// First handle value used for on-demand array classes. Primitive handles sit
/// below this, at [`ClassHandle::RUNTIME_RESERVED_BASE`] plus the kind ordinal.
const ARRAY_HANDLE_BASE: usize = ClassHandle::RUNTIME_RESERVED_BASE + 0x100;

/// The nine primitive types of the language.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    /// 32-bit signed integer
    Int,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 64-bit signed integer
    Long,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// UTF-16 code unit
    Char,
    /// true/false value
    Boolean,
    /// No value
    Void,
}

impl PrimitiveKind {
    /// Canonical source-level name (`int`, `boolean`, ...), which doubles as the
    /// registry key for the singleton descriptor.
    #[must_use]
    pub fn canonical_name(&self) -> &'static str {
        (*self).into()
    }

    /// JNI signature character for this primitive (`I`, `B`, `S`, `J`, `F`, `D`,
    /// `C`, `Z`, `V`).
    #[must_use]
    pub fn descriptor_char(&self) -> char {
        match self {
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Void => 'V',
        }
    }

    /// Native storage width in bytes; zero for `void`.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            PrimitiveKind::Byte | PrimitiveKind::Boolean => 1,
            PrimitiveKind::Short | PrimitiveKind::Char => 2,
            PrimitiveKind::Int | PrimitiveKind::Float => 4,
            PrimitiveKind::Long | PrimitiveKind::Double => 8,
            PrimitiveKind::Void => 0,
        }
    }

    fn ordinal(&self) -> usize {
        match self {
            PrimitiveKind::Int => 0,
            PrimitiveKind::Byte => 1,
            PrimitiveKind::Short => 2,
            PrimitiveKind::Long => 3,
            PrimitiveKind::Float => 4,
            PrimitiveKind::Double => 5,
            PrimitiveKind::Char => 6,
            PrimitiveKind::Boolean => 7,
            PrimitiveKind::Void => 8,
        }
    }

    /// The fixed process-wide class handle of this primitive's singleton
    /// descriptor.
    #[must_use]
    pub fn class_handle(&self) -> ClassHandle {
        ClassHandle::new(ClassHandle::RUNTIME_RESERVED_BASE + self.ordinal())
    }
}

/// Lazily materialized class object for `int`, referenced directly by generated code.
pub static INT_TYPE_INFO: TypeInfo = TypeInfo::new(init_int);
/// Lazily materialized class object for `byte`, referenced directly by generated code.
pub static BYTE_TYPE_INFO: TypeInfo = TypeInfo::new(init_byte);
/// Lazily materialized class object for `short`, referenced directly by generated code.
pub static SHORT_TYPE_INFO: TypeInfo = TypeInfo::new(init_short);
/// Lazily materialized class object for `long`, referenced directly by generated code.
pub static LONG_TYPE_INFO: TypeInfo = TypeInfo::new(init_long);
/// Lazily materialized class object for `float`, referenced directly by generated code.
pub static FLOAT_TYPE_INFO: TypeInfo = TypeInfo::new(init_float);
/// Lazily materialized class object for `double`, referenced directly by generated code.
pub static DOUBLE_TYPE_INFO: TypeInfo = TypeInfo::new(init_double);
/// Lazily materialized class object for `char`, referenced directly by generated code.
pub static CHAR_TYPE_INFO: TypeInfo = TypeInfo::new(init_char);
/// Lazily materialized class object for `boolean`, referenced directly by generated code.
pub static BOOLEAN_TYPE_INFO: TypeInfo = TypeInfo::new(init_boolean);
/// Lazily materialized class object for `void`, referenced directly by generated code.
pub static VOID_TYPE_INFO: TypeInfo = TypeInfo::new(init_void);

fn init_int() -> ClassHandle {
    PrimitiveKind::Int.class_handle()
}
fn init_byte() -> ClassHandle {
    PrimitiveKind::Byte.class_handle()
}
fn init_short() -> ClassHandle {
    PrimitiveKind::Short.class_handle()
}
fn init_long() -> ClassHandle {
    PrimitiveKind::Long.class_handle()
}
fn init_float() -> ClassHandle {
    PrimitiveKind::Float.class_handle()
}
fn init_double() -> ClassHandle {
    PrimitiveKind::Double.class_handle()
}
fn init_char() -> ClassHandle {
    PrimitiveKind::Char.class_handle()
}
fn init_boolean() -> ClassHandle {
    PrimitiveKind::Boolean.class_handle()
}
fn init_void() -> ClassHandle {
    PrimitiveKind::Void.class_handle()
}

/// The fixed [`TypeInfo`] symbol for a primitive kind.
#[must_use]
pub fn type_info(kind: PrimitiveKind) -> &'static TypeInfo {
    match kind {
        PrimitiveKind::Int => &INT_TYPE_INFO,
        PrimitiveKind::Byte => &BYTE_TYPE_INFO,
        PrimitiveKind::Short => &SHORT_TYPE_INFO,
        PrimitiveKind::Long => &LONG_TYPE_INFO,
        PrimitiveKind::Float => &FLOAT_TYPE_INFO,
        PrimitiveKind::Double => &DOUBLE_TYPE_INFO,
        PrimitiveKind::Char => &CHAR_TYPE_INFO,
        PrimitiveKind::Boolean => &BOOLEAN_TYPE_INFO,
        PrimitiveKind::Void => &VOID_TYPE_INFO,
    }
}

/// Singleton descriptors for primitive types and on-demand array class typing.
///
/// The catalog seeds the nine primitive descriptors into the registry at runtime
/// construction, mints array classes for arbitrary registered component types,
/// and answers the O(1) classification queries (`is_array_class`,
/// `is_primitive_class`) plus component/element-width queries.
pub struct ArrayPrimitiveCatalog {
    /// Counter for handles of runtime-minted array classes
    next_array_handle: AtomicUsize,
}

impl ArrayPrimitiveCatalog {
    /// Create a catalog with an empty array-handle range.
    #[must_use]
    pub fn new() -> Self {
        ArrayPrimitiveCatalog {
            next_array_handle: AtomicUsize::new(ARRAY_HANDLE_BASE),
        }
    }

    /// Register the nine primitive singleton descriptors.
    ///
    /// Called once at runtime construction, before any user class registers.
    ///
    /// # Errors
    /// Returns [`DuplicateRegistration`] if a primitive handle is already taken,
    /// which can only happen if seeding runs twice without a reset.
    pub fn seed_primitives(&self, registry: &ClassRegistry) -> Result<()> {
        for kind in PrimitiveKind::iter() {
            registry.register(ClassDescriptor {
                handle: kind.class_handle(),
                name: kind.canonical_name().to_string(),
                super_class: None,
                dispatch_vector: DispatchVectorPtr::null(),
                obj_size: kind.width(),
                kind: ClassKind::Primitive(kind),
                interfaces: vec![],
                fields: vec![],
                static_fields: vec![],
                methods: vec![],
                iface_dispatch: OnceLock::new(),
            })?;
        }
        Ok(())
    }

    /// The singleton descriptor for a primitive kind.
    ///
    /// # Errors
    /// Returns [`ClassNotFound`] if the catalog has not been seeded.
    pub fn primitive_class(
        &self,
        registry: &ClassRegistry,
        kind: PrimitiveKind,
    ) -> Result<ClassDescriptorRc> {
        registry.by_handle(kind.class_handle())
    }

    /// The lazily materialized class-object handle for a primitive kind.
    ///
    /// First access runs the initializer exactly once, even under concurrent
    /// first access; every caller observes the same published handle.
    #[must_use]
    pub fn primitive_type_handle(&self, kind: PrimitiveKind) -> ClassHandle {
        type_info(kind).get()
    }

    /// The array class with the given component, minting and registering it on
    /// first request.
    ///
    /// Two threads racing to mint the same array class both build a candidate;
    /// the registry's name map picks one winner and the loser re-reads it.
    ///
    /// # Errors
    /// Returns [`ClassNotFound`]/[`crate::Error::HandleNotFound`] if the component
    /// class is not registered.
    pub fn array_class_of(
        &self,
        registry: &ClassRegistry,
        component: ClassHandle,
    ) -> Result<ClassDescriptorRc> {
        let component_desc = registry.by_handle(component)?;
        let name = format!("{}[]", component_desc.name);

        if let Some(existing) = registry.lookup_loaded(&name) {
            return Ok(existing);
        }

        let handle = ClassHandle::new(self.next_array_handle.fetch_add(1, Ordering::Relaxed));
        let candidate = ClassDescriptor {
            handle,
            name: name.clone(),
            super_class: None,
            dispatch_vector: DispatchVectorPtr::null(),
            obj_size: 0,
            kind: ClassKind::Array(component),
            interfaces: vec![],
            fields: vec![],
            static_fields: vec![],
            methods: vec![],
            iface_dispatch: OnceLock::new(),
        };

        match registry.register(candidate) {
            Ok(descriptor) => Ok(descriptor),
            // Lost the minting race; the winner's descriptor is now registered.
            Err(DuplicateRegistration(_)) => {
                registry.lookup_loaded(&name).ok_or(ClassNotFound(name))
            }
            Err(e) => Err(e),
        }
    }

    /// O(1): true if the descriptor describes an array class.
    #[must_use]
    pub fn is_array_class(&self, descriptor: &ClassDescriptor) -> bool {
        descriptor.is_array()
    }

    /// O(1): true if the descriptor describes a primitive singleton.
    #[must_use]
    pub fn is_primitive_class(&self, descriptor: &ClassDescriptor) -> bool {
        descriptor.is_primitive()
    }

    /// The component class of an array descriptor.
    ///
    /// # Errors
    /// Returns [`InvalidOperation`] if the descriptor is not an array class.
    pub fn component_class(
        &self,
        registry: &ClassRegistry,
        descriptor: &ClassDescriptor,
    ) -> Result<ClassDescriptorRc> {
        match descriptor.kind {
            ClassKind::Array(component) => registry.by_handle(component),
            _ => Err(InvalidOperation(format!(
                "component class query on non-array class {}",
                descriptor.name
            ))),
        }
    }

    /// Per-element storage width of an array class: the native width for primitive
    /// components, the platform reference width for object-typed components.
    ///
    /// # Errors
    /// Returns [`InvalidOperation`] if the descriptor is not an array class.
    pub fn array_rep_size(
        &self,
        registry: &ClassRegistry,
        descriptor: &ClassDescriptor,
    ) -> Result<u32> {
        match descriptor.kind {
            ClassKind::Array(component) => {
                let component_desc = registry.by_handle(component)?;
                match component_desc.kind {
                    ClassKind::Primitive(kind) => Ok(kind.width()),
                    #[allow(clippy::cast_possible_truncation)]
                    _ => Ok(std::mem::size_of::<usize>() as u32),
                }
            }
            _ => Err(InvalidOperation(format!(
                "element size query on non-array class {}",
                descriptor.name
            ))),
        }
    }

    /// Rewind the array-handle range. Test isolation only, paired with
    /// [`ClassRegistry::reset`].
    pub(crate) fn reset(&self) {
        self.next_array_handle
            .store(ARRAY_HANDLE_BASE, Ordering::Relaxed);
    }
}

impl Default for ArrayPrimitiveCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeded() -> (ClassRegistry, ArrayPrimitiveCatalog) {
        let registry = ClassRegistry::new(None);
        let catalog = ArrayPrimitiveCatalog::new();
        catalog.seed_primitives(&registry).unwrap();
        (registry, catalog)
    }

    #[test]
    fn test_nine_kinds_with_distinct_handles() {
        let kinds: Vec<_> = PrimitiveKind::iter().collect();
        assert_eq!(kinds.len(), 9);

        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a.class_handle(), b.class_handle());
            }
        }
    }

    #[test]
    fn test_canonical_names_and_sig_chars() {
        assert_eq!(PrimitiveKind::Int.canonical_name(), "int");
        assert_eq!(PrimitiveKind::Boolean.canonical_name(), "boolean");
        assert_eq!(PrimitiveKind::Void.canonical_name(), "void");
        assert_eq!(PrimitiveKind::Long.descriptor_char(), 'J');
        assert_eq!(PrimitiveKind::Boolean.descriptor_char(), 'Z');
    }

    #[test]
    fn test_widths() {
        assert_eq!(PrimitiveKind::Int.width(), 4);
        assert_eq!(PrimitiveKind::Byte.width(), 1);
        assert_eq!(PrimitiveKind::Short.width(), 2);
        assert_eq!(PrimitiveKind::Long.width(), 8);
        assert_eq!(PrimitiveKind::Float.width(), 4);
        assert_eq!(PrimitiveKind::Double.width(), 8);
        assert_eq!(PrimitiveKind::Char.width(), 2);
        assert_eq!(PrimitiveKind::Boolean.width(), 1);
        assert_eq!(PrimitiveKind::Void.width(), 0);
    }

    #[test]
    fn test_seeded_singletons_resolve_by_name_and_handle() {
        let (registry, catalog) = seeded();

        let int_class = catalog
            .primitive_class(&registry, PrimitiveKind::Int)
            .unwrap();
        assert_eq!(int_class.name, "int");
        assert!(catalog.is_primitive_class(&int_class));
        assert!(!catalog.is_array_class(&int_class));

        let by_name = registry.lookup_loaded("int").unwrap();
        assert!(Arc::ptr_eq(&int_class, &by_name));
    }

    #[test]
    fn test_type_handle_initializer_runs_once_concurrently() {
        let catalog = Arc::new(ArrayPrimitiveCatalog::new());

        let mut threads = Vec::new();
        for _ in 0..8 {
            let catalog = catalog.clone();
            threads.push(std::thread::spawn(move || {
                catalog.primitive_type_handle(PrimitiveKind::Char)
            }));
        }

        let expected = PrimitiveKind::Char.class_handle();
        for t in threads {
            assert_eq!(t.join().unwrap(), expected);
        }
        assert_eq!(CHAR_TYPE_INFO.peek(), Some(expected));
    }

    #[test]
    fn test_array_class_minting_and_reuse() {
        let (registry, catalog) = seeded();

        let int_handle = PrimitiveKind::Int.class_handle();
        let int_array = catalog.array_class_of(&registry, int_handle).unwrap();
        assert_eq!(int_array.name, "int[]");
        assert!(catalog.is_array_class(&int_array));

        // Second request reuses the registered class.
        let again = catalog.array_class_of(&registry, int_handle).unwrap();
        assert!(Arc::ptr_eq(&int_array, &again));

        let component = catalog.component_class(&registry, &int_array).unwrap();
        assert_eq!(component.name, "int");
    }

    #[test]
    fn test_component_class_rejects_non_array() {
        let (registry, catalog) = seeded();
        let int_class = catalog
            .primitive_class(&registry, PrimitiveKind::Int)
            .unwrap();
        assert!(catalog.component_class(&registry, &int_class).is_err());
    }

    #[test]
    fn test_array_rep_size() {
        let (registry, catalog) = seeded();

        let int_array = catalog
            .array_class_of(&registry, PrimitiveKind::Int.class_handle())
            .unwrap();
        assert_eq!(catalog.array_rep_size(&registry, &int_array).unwrap(), 4);

        let byte_array = catalog
            .array_class_of(&registry, PrimitiveKind::Byte.class_handle())
            .unwrap();
        assert_eq!(catalog.array_rep_size(&registry, &byte_array).unwrap(), 1);

        // Arrays of arrays are object-typed: reference width.
        let int_array_array = catalog
            .array_class_of(&registry, int_array.handle)
            .unwrap();
        assert_eq!(int_array_array.name, "int[][]");
        assert_eq!(
            catalog.array_rep_size(&registry, &int_array_array).unwrap(),
            std::mem::size_of::<usize>() as u32
        );

        let int_class = catalog
            .primitive_class(&registry, PrimitiveKind::Int)
            .unwrap();
        assert!(catalog.array_rep_size(&registry, &int_class).is_err());
    }
}
