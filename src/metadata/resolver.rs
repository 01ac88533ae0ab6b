//! Member resolution along the inheritance chain.
//!
//! Field, static-field and method lookups start at a class and walk toward the
//! root of the hierarchy, returning the first match. Subclass members therefore
//! shadow superclass members of the same name (and signature, where the member
//! kind is signature-qualified). Instance-method resolution additionally falls
//! back to default methods declared on the class's transitive interfaces, after
//! the superclass chain is exhausted.
//!
//! The engine borrows the registry and holds no state of its own; resolution
//! never mutates anything.

use crate::{
    metadata::{
        descriptor::{ClassDescriptorRc, FieldRc, MethodRc, StaticFieldRc},
        handle::ClassHandle,
        registry::ClassRegistry,
    },
    Error::{FieldNotFound, MethodNotFound, StaticFieldNotFound},
    Result,
};

/// Stateless member-resolution engine over a class registry.
pub struct ResolutionEngine<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> ResolutionEngine<'a> {
    /// Create an engine over `registry`.
    #[must_use]
    pub fn new(registry: &'a ClassRegistry) -> Self {
        ResolutionEngine { registry }
    }

    /// Resolve an instance field by name, walking the superclass chain.
    ///
    /// # Errors
    /// Returns [`FieldNotFound`] if no class on the chain declares the field. A
    /// superclass handle with no registration ends the walk the same way.
    pub fn field(&self, class: &ClassDescriptorRc, name: &str) -> Result<FieldRc> {
        let mut current = Some(class.clone());
        while let Some(descriptor) = current {
            if let Some(field) = descriptor.find_field_local(name) {
                return Ok(field.clone());
            }
            current = self.super_of(&descriptor);
        }
        Err(FieldNotFound {
            class: class.name.clone(),
            name: name.to_string(),
        })
    }

    /// Resolve a static field by name and type signature, walking the superclass
    /// chain.
    ///
    /// # Errors
    /// Returns [`StaticFieldNotFound`] if no class on the chain declares a static
    /// field with both the name and the signature.
    pub fn static_field(
        &self,
        class: &ClassDescriptorRc,
        name: &str,
        sig: &str,
    ) -> Result<StaticFieldRc> {
        let mut current = Some(class.clone());
        while let Some(descriptor) = current {
            if let Some(field) = descriptor.find_static_field_local(name, sig) {
                return Ok(field.clone());
            }
            current = self.super_of(&descriptor);
        }
        Err(StaticFieldNotFound {
            class: class.name.clone(),
            name: name.to_string(),
            sig: sig.to_string(),
        })
    }

    /// Resolve an instance (or constructor) method by name and full signature.
    ///
    /// Walks the superclass chain first; if no class declares the method, falls
    /// back to default methods on the class's transitive interfaces. Returns the
    /// resolved method together with its index in the declaring class's method
    /// table.
    ///
    /// # Errors
    /// Returns [`MethodNotFound`] if neither the chain nor the interfaces declare
    /// a matching non-static method.
    pub fn method(
        &self,
        class: &ClassDescriptorRc,
        name: &str,
        sig: &str,
    ) -> Result<(MethodRc, usize)> {
        if let Some(found) = self.method_on_chain(class, name, sig, false) {
            return Ok(found);
        }
        // Default methods: the interfaces carry the implementation.
        for interface in self.transitive_interfaces(class) {
            if let Some((index, method)) = interface.find_method_local(name, sig) {
                if !method.role.is_static() {
                    return Ok((method.clone(), index));
                }
            }
        }
        Err(MethodNotFound {
            class: class.name.clone(),
            name: name.to_string(),
            sig: sig.to_string(),
        })
    }

    /// Resolve a static method by name and full signature along the superclass
    /// chain. Interfaces are not consulted; static interface methods are not
    /// inherited.
    ///
    /// # Errors
    /// Returns [`MethodNotFound`] if no class on the chain declares a matching
    /// static method.
    pub fn static_method(
        &self,
        class: &ClassDescriptorRc,
        name: &str,
        sig: &str,
    ) -> Result<(MethodRc, usize)> {
        self.method_on_chain(class, name, sig, true)
            .ok_or_else(|| MethodNotFound {
                class: class.name.clone(),
                name: name.to_string(),
                sig: sig.to_string(),
            })
    }

    /// First method on the superclass chain matching name, signature and
    /// staticness, with its index in the declaring class's method table.
    fn method_on_chain(
        &self,
        class: &ClassDescriptorRc,
        name: &str,
        sig: &str,
        want_static: bool,
    ) -> Option<(MethodRc, usize)> {
        let mut current = Some(class.clone());
        while let Some(descriptor) = current {
            if let Some((index, method)) = descriptor.find_method_local(name, sig) {
                if method.role.is_static() == want_static {
                    return Some((method.clone(), index));
                }
            }
            current = self.super_of(&descriptor);
        }
        None
    }

    /// All interfaces a class transitively implements, deduplicated, in
    /// breadth-first order starting from the class's own chain. Interfaces with
    /// no registration are skipped.
    pub(crate) fn transitive_interfaces(
        &self,
        class: &ClassDescriptorRc,
    ) -> Vec<ClassDescriptorRc> {
        let mut seen: Vec<ClassHandle> = Vec::new();
        let mut queue: Vec<ClassHandle> = Vec::new();
        let mut result = Vec::new();

        let mut current = Some(class.clone());
        while let Some(descriptor) = current {
            queue.extend(descriptor.interfaces.iter().copied());
            current = self.super_of(&descriptor);
        }

        let mut cursor = 0;
        while cursor < queue.len() {
            let handle = queue[cursor];
            cursor += 1;
            if seen.contains(&handle) {
                continue;
            }
            seen.push(handle);
            if let Ok(interface) = self.registry.by_handle(handle) {
                queue.extend(interface.interfaces.iter().copied());
                result.push(interface);
            }
        }
        result
    }

    /// The registered superclass, or `None` at the root or when the superclass
    /// handle has no registration.
    fn super_of(&self, descriptor: &ClassDescriptorRc) -> Option<ClassDescriptorRc> {
        descriptor
            .super_class
            .and_then(|handle| self.registry.by_handle(handle).ok())
    }
}
