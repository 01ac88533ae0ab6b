//! Hash-based interface method dispatch.
//!
//! Interface calls do not go through the class dispatch vector; they resolve
//! through a per-class open-addressed table keyed by the interface method's
//! global identity and its precomputed hash. The table is built lazily on the
//! first interface call against a class and cached on the descriptor, so
//! classes that never receive interface calls never pay for one.
//!
//! The table size equals the number of interface-declared methods visible on
//! the class's transitive interfaces, so occupancy is total and a linear probe
//! is bounded by the table length. Hashes come from the compiled image and may
//! be negative; placement uses the Euclidean remainder so a negative hash still
//! lands in range.

use crate::{
    metadata::{
        descriptor::{ClassDescriptorRc, IfaceIdent, MethodRc},
        handle::{CodePtr, IfaceMethodId},
        registry::ClassRegistry,
        resolver::ResolutionEngine,
    },
    Error::InterfaceMethodResolutionFailure,
    Result,
};

/// One bound entry in an interface dispatch table.
#[derive(Debug, Clone)]
struct DispatchSlot {
    id: IfaceMethodId,
    hash: i32,
    target: CodePtr,
}

/// Per-class open-addressed map from interface method identity to implementing
/// code pointer.
///
/// Built once per class by [`resolve_interface_method`] and cached on the
/// descriptor; immutable afterwards.
#[derive(Debug)]
pub struct InterfaceDispatchTable {
    slots: Vec<Option<DispatchSlot>>,
}

impl InterfaceDispatchTable {
    /// Build the table for `class` by resolving every interface-declared method
    /// visible on its transitive interfaces against the class's own chain.
    ///
    /// An interface method with no implementation anywhere stays unbound; the
    /// miss surfaces at call time, not build time, matching the lazy-call
    /// semantics of the dispatch path.
    fn build(registry: &ClassRegistry, class: &ClassDescriptorRc) -> Self {
        let engine = ResolutionEngine::new(registry);

        // Every distinct interface-declared method the class must answer for.
        let mut declared: Vec<(IfaceIdent, MethodRc)> = Vec::new();
        for interface in engine.transitive_interfaces(class) {
            for method in &interface.methods {
                if let Some(identity) = method.iface_ident {
                    if !declared.iter().any(|(existing, _)| existing.id == identity.id) {
                        declared.push((identity, method.clone()));
                    }
                }
            }
        }

        let size = declared.len().max(1);
        let mut slots: Vec<Option<DispatchSlot>> = vec![None; size];

        for (identity, method) in declared {
            // Implementation on the class chain wins; the interface's own body
            // (a default method) is the fallback.
            let target = engine
                .method(class, &method.name, &method.sig)
                .map(|(implementation, _)| implementation.fn_ptr)
                .ok();
            // An abstract body (null entry point) leaves the slot unbound.
            let Some(target) = target else { continue };
            if target.is_null() {
                continue;
            }

            let mut index = identity.hash.rem_euclid(size as i32) as usize;
            while slots[index].is_some() {
                index = (index + 1) % size;
            }
            slots[index] = Some(DispatchSlot {
                id: identity.id,
                hash: identity.hash,
                target,
            });
        }

        InterfaceDispatchTable { slots }
    }

    /// Probe for the implementing code pointer of the interface method with the
    /// given identity.
    fn lookup(&self, id: IfaceMethodId, hash: i32) -> Option<CodePtr> {
        let size = self.slots.len();
        let mut index = hash.rem_euclid(size as i32) as usize;
        for _ in 0..size {
            match &self.slots[index] {
                Some(slot) if slot.id == id => return Some(slot.target),
                // An empty slot ends the probe run: the id was never inserted.
                None => return None,
                Some(_) => index = (index + 1) % size,
            }
        }
        None
    }

    /// Number of bound entries, for diagnostics.
    #[must_use]
    pub fn bound_len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Resolve an interface call on `class` to the implementing code pointer.
///
/// Builds and caches the class's dispatch table on first use; concurrent first
/// calls may both build, but exactly one table is published and the identical
/// build result makes the race benign.
///
/// # Errors
/// Returns [`InterfaceMethodResolutionFailure`] if the class does not implement
/// the identified interface method.
pub fn resolve_interface_method(
    registry: &ClassRegistry,
    class: &ClassDescriptorRc,
    id: IfaceMethodId,
    hash: i32,
) -> Result<CodePtr> {
    let table = match class.iface_dispatch.get() {
        Some(table) => table,
        None => {
            // Built outside the cell so the registry is never touched while
            // publishing.
            let built = InterfaceDispatchTable::build(registry, class);
            class.iface_dispatch.get_or_init(|| built)
        }
    };

    table
        .lookup(id, hash)
        .ok_or_else(|| InterfaceMethodResolutionFailure {
            class: class.name.clone(),
            id,
        })
}
