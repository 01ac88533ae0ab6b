//! The process-wide runtime facade.
//!
//! [`Runtime`] ties the registry, the resolution engine, the intern pool and the
//! primitive/array catalog together behind the query surface generated code and
//! native callers link against. Every query is a pure read over immutable
//! descriptors; the only mutations are class registration, string interning and
//! the first-use builds of lazily cached values.

use std::sync::Arc;

use crate::{
    metadata::{
        descriptor::{ClassDescriptor, ClassDescriptorRc, FieldRc, MethodRc, StaticFieldRc},
        handle::{ClassHandle, CodePtr, IfaceMethodId},
        intern::{InternPool, InternedString},
        interfaces,
        primitives::{ArrayPrimitiveCatalog, PrimitiveKind},
        raw::{ClassInfo, TypeInfo},
        registry::ClassRegistry,
        resolver::ResolutionEngine,
    },
    Result,
};

pub use crate::metadata::registry::ClassLoader;

/// The process-wide reflection runtime.
///
/// One instance serves a whole process image. Construction seeds the nine
/// primitive singletons; generated code then registers each compiled class once
/// at load time, and all introspection queries go through this facade.
///
/// The runtime is `Send + Sync`; queries and registrations may run from any
/// thread without external locking.
pub struct Runtime {
    registry: ClassRegistry,
    interned: InternPool,
    catalog: ArrayPrimitiveCatalog,
}

impl Runtime {
    /// Create a runtime without an on-demand class loader.
    ///
    /// Name lookups of unregistered classes fail [`crate::Error::ClassNotFound`]
    /// immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a runtime that invokes `loader` on a name-lookup miss.
    #[must_use]
    pub fn with_loader(loader: Arc<dyn ClassLoader>) -> Self {
        Self::build(Some(loader))
    }

    fn build(loader: Option<Arc<dyn ClassLoader>>) -> Self {
        let registry = ClassRegistry::new(loader);
        let catalog = ArrayPrimitiveCatalog::new();
        // A fresh registry cannot collide with the reserved primitive handles.
        let seeded = catalog.seed_primitives(&registry);
        debug_assert!(seeded.is_ok());

        Runtime {
            registry,
            interned: InternPool::new(),
            catalog,
        }
    }

    /// Register a compiled class under its handle.
    ///
    /// Called once per class by generated load-time code (or by a
    /// [`ClassLoader`] servicing an on-demand load).
    ///
    /// # Errors
    /// - [`crate::Error::InvalidOperation`] - a method record carries a
    ///   malformed role sentinel
    /// - [`crate::Error::DuplicateRegistration`] - the handle or canonical name
    ///   is already registered
    pub fn register_class(&self, handle: ClassHandle, info: ClassInfo) -> Result<ClassDescriptorRc> {
        self.registry.register(ClassDescriptor::from_raw(handle, &info)?)
    }

    /// The descriptor registered under `handle`.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] for an unregistered handle.
    pub fn class_info(&self, handle: ClassHandle) -> Result<ClassDescriptorRc> {
        self.registry.by_handle(handle)
    }

    /// The class with the given dotted canonical name (`java.lang.String`),
    /// loading it on demand when a loader is configured.
    ///
    /// # Errors
    /// See [`ClassRegistry::by_name`](crate::metadata::registry::ClassRegistry::by_name)
    /// for the full set of lookup and load failures.
    pub fn class_from_name(&self, name: &str) -> Result<ClassDescriptorRc> {
        self.registry.by_name(name)
    }

    /// The class with the given path-separated name (`java/lang/String`).
    ///
    /// Identical to [`Runtime::class_from_name`] after canonicalization; both
    /// spellings share one registry entry.
    ///
    /// # Errors
    /// Same as [`Runtime::class_from_name`].
    pub fn class_from_path_name(&self, name: &str) -> Result<ClassDescriptorRc> {
        self.registry.by_name(name)
    }

    /// Resolve an instance field by name, starting at `class` and walking the
    /// superclass chain.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::FieldNotFound`] when no class on the chain declares the
    /// field.
    pub fn field_info(&self, class: ClassHandle, name: &str) -> Result<FieldRc> {
        let descriptor = self.registry.by_handle(class)?;
        ResolutionEngine::new(&self.registry).field(&descriptor, name)
    }

    /// Resolve a static field by name and type signature along the superclass
    /// chain.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::StaticFieldNotFound`] when no class on the chain declares
    /// a static field with both the name and the signature.
    pub fn static_field_info(
        &self,
        class: ClassHandle,
        name: &str,
        sig: &str,
    ) -> Result<StaticFieldRc> {
        let descriptor = self.registry.by_handle(class)?;
        ResolutionEngine::new(&self.registry).static_field(&descriptor, name, sig)
    }

    /// Resolve an instance or constructor method by name and full signature,
    /// walking the superclass chain and falling back to default interface
    /// methods. Returns the method and its index in the declaring class's
    /// method table.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::MethodNotFound`] when nothing matches.
    pub fn method_info(
        &self,
        class: ClassHandle,
        name: &str,
        sig: &str,
    ) -> Result<(MethodRc, usize)> {
        let descriptor = self.registry.by_handle(class)?;
        ResolutionEngine::new(&self.registry).method(&descriptor, name, sig)
    }

    /// Resolve a static method by name and full signature along the superclass
    /// chain.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::MethodNotFound`] when nothing matches.
    pub fn static_method_info(
        &self,
        class: ClassHandle,
        name: &str,
        sig: &str,
    ) -> Result<(MethodRc, usize)> {
        let descriptor = self.registry.by_handle(class)?;
        ResolutionEngine::new(&self.registry).static_method(&descriptor, name, sig)
    }

    /// Resolve an interface call on `class` to the implementing code pointer,
    /// building the class's dispatch table on first use.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::InterfaceMethodResolutionFailure`] when the class does
    /// not implement the identified method.
    pub fn resolve_interface_method(
        &self,
        class: ClassHandle,
        id: IfaceMethodId,
        hash: i32,
    ) -> Result<CodePtr> {
        let descriptor = self.registry.by_handle(class)?;
        interfaces::resolve_interface_method(&self.registry, &descriptor, id, hash)
    }

    /// Intern a string literal, returning the canonical shared instance for its
    /// content.
    ///
    /// Every call with equal content returns the same instance, so interned
    /// literals compare by pointer identity.
    #[must_use]
    pub fn intern_string_lit(&self, content: &str) -> InternedString {
        self.interned.intern(content)
    }

    /// The singleton descriptor for a primitive kind.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] only if the runtime's seeding
    /// was undone by [`Runtime::reset`].
    pub fn primitive_class(&self, kind: PrimitiveKind) -> Result<ClassDescriptorRc> {
        self.catalog.primitive_class(&self.registry, kind)
    }

    /// The lazily materialized class-object handle for a primitive kind.
    #[must_use]
    pub fn primitive_type_handle(&self, kind: PrimitiveKind) -> ClassHandle {
        self.catalog.primitive_type_handle(kind)
    }

    /// The fixed [`TypeInfo`] symbol for a primitive kind, as referenced by
    /// generated code.
    #[must_use]
    pub fn primitive_type_info(&self, kind: PrimitiveKind) -> &'static TypeInfo {
        crate::metadata::primitives::type_info(kind)
    }

    /// The array class with the given component, minting it on first request.
    ///
    /// # Errors
    /// Returns [`crate::Error::HandleNotFound`] if the component class is not
    /// registered.
    pub fn array_class_of(&self, component: ClassHandle) -> Result<ClassDescriptorRc> {
        self.catalog.array_class_of(&self.registry, component)
    }

    /// O(1): true if `class` is a registered array class.
    #[must_use]
    pub fn is_array_class(&self, class: ClassHandle) -> bool {
        self.registry
            .by_handle(class)
            .map(|descriptor| descriptor.is_array())
            .unwrap_or(false)
    }

    /// O(1): true if `class` is one of the nine primitive singletons.
    #[must_use]
    pub fn is_primitive_class(&self, class: ClassHandle) -> bool {
        self.registry
            .by_handle(class)
            .map(|descriptor| descriptor.is_primitive())
            .unwrap_or(false)
    }

    /// The component class of an array class.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::InvalidOperation`] when `class` is not an array class.
    pub fn component_class(&self, class: ClassHandle) -> Result<ClassDescriptorRc> {
        let descriptor = self.registry.by_handle(class)?;
        self.catalog.component_class(&self.registry, &descriptor)
    }

    /// Per-element storage width of an array class in bytes.
    ///
    /// # Errors
    /// [`crate::Error::HandleNotFound`] for an unregistered class,
    /// [`crate::Error::InvalidOperation`] when `class` is not an array class.
    pub fn array_rep_size(&self, class: ClassHandle) -> Result<u32> {
        let descriptor = self.registry.by_handle(class)?;
        self.catalog.array_rep_size(&self.registry, &descriptor)
    }

    /// Direct access to the underlying registry, for loaders that need to
    /// register classes through their own raw descriptors.
    #[must_use]
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Drop every registration, interned string and minted array handle, then
    /// reseed the primitives. Test isolation only; class metadata is permanent
    /// in production.
    pub fn reset(&self) {
        self.registry.reset();
        self.interned.clear();
        self.catalog.reset();
        let seeded = self.catalog.seed_primitives(&self.registry);
        debug_assert!(seeded.is_ok());
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::raw::METHOD_OFFSET_STATIC;
    use crate::test::{class_info, field_info, method_info, static_field_info};
    use crate::Error;
    use std::sync::Arc;

    fn sample_runtime() -> Runtime {
        let runtime = Runtime::new();
        let mut base = class_info(
            "pkg.Base",
            None,
            vec![field_info("value", 8)],
            vec![
                method_info("compute", "(I)I", 0),
                method_info("create", "()V", crate::metadata::raw::METHOD_OFFSET_CONSTRUCTOR),
            ],
        );
        base.static_fields = vec![static_field_info("instances", "I", 0x2000)];
        runtime.register_class(ClassHandle::new(0x100), base).unwrap();

        runtime
            .register_class(
                ClassHandle::new(0x200),
                class_info(
                    "pkg.Derived",
                    Some(ClassHandle::new(0x100)),
                    vec![field_info("extra", 16)],
                    vec![method_info("helper", "()V", METHOD_OFFSET_STATIC)],
                ),
            )
            .unwrap();
        runtime
    }

    #[test]
    fn test_registration_and_name_lookup() {
        let runtime = sample_runtime();

        let base = runtime.class_from_name("pkg.Base").unwrap();
        assert_eq!(base.handle, ClassHandle::new(0x100));
        assert!(Arc::ptr_eq(
            &base,
            &runtime.class_from_path_name("pkg/Base").unwrap()
        ));
        assert!(Arc::ptr_eq(
            &base,
            &runtime.class_info(ClassHandle::new(0x100)).unwrap()
        ));
    }

    #[test]
    fn test_member_queries_walk_hierarchy() {
        let runtime = sample_runtime();
        let derived = ClassHandle::new(0x200);

        assert_eq!(runtime.field_info(derived, "extra").unwrap().offset, 16);
        assert_eq!(runtime.field_info(derived, "value").unwrap().offset, 8);
        assert!(runtime
            .static_field_info(derived, "instances", "I")
            .is_ok());
        assert!(runtime.method_info(derived, "compute", "(I)I").is_ok());
        assert!(runtime.static_method_info(derived, "helper", "()V").is_ok());
        // Constructors resolve through the instance path.
        assert!(runtime.method_info(derived, "create", "()V").is_ok());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let runtime = sample_runtime();
        let err = runtime
            .register_class(
                ClassHandle::new(0x100),
                class_info("pkg.Other", None, vec![], vec![]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration(_)));
    }

    #[test]
    fn test_interning_canonical_identity() {
        let runtime = Runtime::new();
        let a = runtime.intern_string_lit("hello");
        let b = runtime.intern_string_lit("hello");
        let c = runtime.intern_string_lit("world");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_primitives_seeded_at_construction() {
        let runtime = Runtime::new();

        let int_class = runtime.primitive_class(PrimitiveKind::Int).unwrap();
        assert!(runtime.is_primitive_class(int_class.handle));
        assert!(Arc::ptr_eq(
            &int_class,
            &runtime.class_from_name("int").unwrap()
        ));
    }

    #[test]
    fn test_array_queries() {
        let runtime = sample_runtime();
        let base_handle = ClassHandle::new(0x100);

        let array = runtime.array_class_of(base_handle).unwrap();
        assert_eq!(array.name, "pkg.Base[]");
        assert!(runtime.is_array_class(array.handle));
        assert!(!runtime.is_array_class(base_handle));
        assert_eq!(
            runtime.component_class(array.handle).unwrap().handle,
            base_handle
        );
        assert_eq!(
            runtime.array_rep_size(array.handle).unwrap(),
            std::mem::size_of::<usize>() as u32
        );
    }

    #[test]
    fn test_reset_restores_pristine_state() {
        let runtime = sample_runtime();
        runtime.intern_string_lit("sticky");
        runtime.reset();

        assert!(runtime.class_from_name("pkg.Base").is_err());
        // Primitives are reseeded.
        assert!(runtime.primitive_class(PrimitiveKind::Boolean).is_ok());
        // Interning starts over: fresh canonical instance.
        let fresh = runtime.intern_string_lit("sticky");
        assert!(Arc::ptr_eq(&fresh, &runtime.intern_string_lit("sticky")));
    }

    #[test]
    fn test_loader_driven_lookup() {
        struct OnDemand;
        impl ClassLoader for OnDemand {
            fn load(&self, registry: &ClassRegistry, name: &str) -> crate::Result<()> {
                if name == "pkg.Lazy" {
                    registry.register(
                        crate::metadata::descriptor::ClassDescriptor::from_raw(
                            ClassHandle::new(0x900),
                            &class_info(name, None, vec![], vec![]),
                        )?,
                    )?;
                    Ok(())
                } else {
                    Err(Error::ClassNotFound(name.to_string()))
                }
            }
        }

        let runtime = Runtime::with_loader(Arc::new(OnDemand));
        let lazy = runtime.class_from_name("pkg.Lazy").unwrap();
        assert_eq!(lazy.handle, ClassHandle::new(0x900));
        assert!(matches!(
            runtime.class_from_name("pkg.Missing").unwrap_err(),
            Error::ClassNotFound(_)
        ));
    }
}
