//! Process-wide class registry.
//!
//! The registry is the bidirectional map between canonical class names and class
//! descriptors. It is read-mostly: lookups by handle go through a lock-free
//! [`SkipMap`], lookups by name through a sharded [`DashMap`], and registration -
//! rare next to lookups - takes exclusive access only to the touched shard.
//!
//! # On-demand loading
//!
//! A name-lookup miss triggers the external [`ClassLoader`] collaborator, which is
//! expected to load the shared unit implementing the class and register it before
//! returning. The loader is never invoked while a map shard is locked; instead a
//! per-name *loading placeholder* serializes duplicate loads:
//!
//! - a second thread requesting the same name parks on the placeholder's gate
//!   until the load completes
//! - the loading thread re-entering the same name on its own call stack (a cyclic
//!   load dependency) fails with [`CircularLoad`] instead of deadlocking
//! - a failed load removes its placeholder, wakes waiters and surfaces
//!   [`ClassLoadFailure`]; no partial descriptor is ever visible
//!
//! # Name canonicalization
//!
//! The dotted (`java.lang.String`) and path-separated (`java/lang/String`)
//! spellings denote the same class; both normalize to the dotted form, which is
//! the registry's only key.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        descriptor::{ClassDescriptor, ClassDescriptorRc},
        handle::ClassHandle,
    },
    Error::{CircularLoad, ClassLoadFailure, ClassNotFound, DuplicateRegistration, HandleNotFound},
    Result,
};

/// External collaborator that loads the shared unit implementing a class.
///
/// Invoked by the registry on a name-lookup miss. A successful `load` must have
/// registered the named class (through [`ClassRegistry::register`] or the runtime
/// facade) before returning; returning `Ok` without registering is treated as a
/// load failure.
pub trait ClassLoader: Send + Sync {
    /// Load and register the class with the given canonical dotted name.
    ///
    /// # Errors
    /// Any error is surfaced to the caller that triggered the load, after the
    /// registry has been rolled back to its pre-load state.
    fn load(&self, registry: &ClassRegistry, name: &str) -> Result<()>;
}

/// Gate carried by a loading placeholder: waiters park on it, the owner thread id
/// is what detects cyclic re-entry.
struct LoadGate {
    owner: ThreadId,
    done: Mutex<bool>,
    completed: Condvar,
}

impl LoadGate {
    fn new() -> Self {
        LoadGate {
            owner: thread::current().id(),
            done: Mutex::new(false),
            completed: Condvar::new(),
        }
    }

    fn complete(&self) {
        let mut done = lock!(self.done);
        *done = true;
        self.completed.notify_all();
    }

    fn wait(&self) {
        let mut done = lock!(self.done);
        while !*done {
            done = self
                .completed
                .wait(done)
                .expect("Failed to acquire lock");
        }
    }
}

/// State of one canonical name in the registry.
#[derive(Clone)]
enum NameState {
    /// The class is registered under this handle
    Loaded(ClassHandle),
    /// A load is in flight; the gate serializes duplicate requests
    Loading(Arc<LoadGate>),
}

/// Process-wide bidirectional map between canonical names and class descriptors,
/// with on-demand loading.
///
/// All lookup paths are safe for concurrent use and never block each other on a
/// fully registered class. See the module docs for the loading protocol.
pub struct ClassRegistry {
    /// Primary descriptor store, keyed by handle
    by_handle: SkipMap<ClassHandle, ClassDescriptorRc>,
    /// Canonical-name index and loading placeholders
    by_name: DashMap<String, NameState>,
    /// External loading collaborator; `None` disables on-demand loading
    loader: Option<Arc<dyn ClassLoader>>,
}

/// Normalize a class name to the canonical dotted spelling.
pub(crate) fn canonical_name(name: &str) -> String {
    name.replace('/', ".")
}

impl ClassRegistry {
    /// Create an empty registry.
    ///
    /// With `loader` set to `None`, a name-lookup miss fails [`ClassNotFound`]
    /// immediately; otherwise the collaborator is invoked per the loading
    /// protocol.
    #[must_use]
    pub fn new(loader: Option<Arc<dyn ClassLoader>>) -> Self {
        ClassRegistry {
            by_handle: SkipMap::new(),
            by_name: DashMap::new(),
            loader,
        }
    }

    /// Register a class descriptor under its handle and canonical name.
    ///
    /// Called at most once per class by the loading path. Completes a pending
    /// loading placeholder for the name, waking any parked waiters.
    ///
    /// # Errors
    /// Returns [`DuplicateRegistration`] if the handle or the canonical name is
    /// already registered; the registry is left unchanged in that case. A second
    /// registration is an invariant violation in the loading path, never an
    /// expected runtime condition.
    pub fn register(&self, descriptor: ClassDescriptor) -> Result<ClassDescriptorRc> {
        let handle = descriptor.handle;
        let name = descriptor.name.clone();
        let descriptor = Arc::new(descriptor);

        // Atomic claim of the handle slot.
        let entry = self.by_handle.get_or_insert(handle, descriptor.clone());
        if !Arc::ptr_eq(entry.value(), &descriptor) {
            return Err(DuplicateRegistration(handle));
        }
        drop(entry);

        // Publish under the canonical name; a pending load placeholder is flipped
        // to the loaded state and its waiters woken.
        let mut pending_gate = None;
        match self.by_name.entry(name) {
            Entry::Occupied(mut occupied) => match occupied.get().clone() {
                NameState::Loaded(_) => {
                    // Name collision with a different handle: roll back the
                    // handle claim and leave the first registration visible.
                    self.by_handle.remove(&handle);
                    return Err(DuplicateRegistration(handle));
                }
                NameState::Loading(gate) => {
                    occupied.insert(NameState::Loaded(handle));
                    pending_gate = Some(gate);
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(NameState::Loaded(handle));
            }
        }
        if let Some(gate) = pending_gate {
            gate.complete();
        }

        Ok(descriptor)
    }

    /// The descriptor registered under `handle`.
    ///
    /// # Errors
    /// Returns [`HandleNotFound`] if no class is registered under the handle.
    pub fn by_handle(&self, handle: ClassHandle) -> Result<ClassDescriptorRc> {
        self.by_handle
            .get(&handle)
            .map(|entry| entry.value().clone())
            .ok_or(HandleNotFound(handle))
    }

    /// The descriptor registered under a canonical name, in either spelling,
    /// without triggering the loader.
    #[must_use]
    pub fn lookup_loaded(&self, name: &str) -> Option<ClassDescriptorRc> {
        let name = canonical_name(name);
        match self.by_name.get(&name).map(|state| state.value().clone()) {
            Some(NameState::Loaded(handle)) => self.by_handle(handle).ok(),
            _ => None,
        }
    }

    /// The descriptor for a canonical name, loading the class on demand.
    ///
    /// Accepts both the dotted and the path-separated spelling. See the module
    /// docs for the full loading protocol.
    ///
    /// # Errors
    /// - [`ClassNotFound`] - no loader configured, or the loader reported the
    ///   class as unknown; the registry is exactly as it was before the call
    /// - [`CircularLoad`] - this thread is already loading this name
    /// - [`ClassLoadFailure`] - the loader failed or returned without
    ///   registering; the placeholder has been removed
    pub fn by_name(&self, name: &str) -> Result<ClassDescriptorRc> {
        let name = canonical_name(name);

        loop {
            if let Some(state) = self.by_name.get(&name).map(|entry| entry.value().clone()) {
                match state {
                    NameState::Loaded(handle) => return self.by_handle(handle),
                    NameState::Loading(gate) => {
                        if gate.owner == thread::current().id() {
                            return Err(CircularLoad(name));
                        }
                        gate.wait();
                        continue;
                    }
                }
            }

            let Some(loader) = self.loader.clone() else {
                return Err(ClassNotFound(name));
            };

            // Install the placeholder; a raced install retries the fast path.
            let gate = Arc::new(LoadGate::new());
            match self.by_name.entry(name.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(NameState::Loading(gate.clone()));
                }
            }

            // The loader runs with no shard lock held; the placeholder, not a
            // lock, is what serializes duplicate loads of this name.
            match loader.load(self, &name) {
                Ok(()) => {
                    if let Some(descriptor) = self.lookup_loaded(&name) {
                        return Ok(descriptor);
                    }
                    // Protocol violation: success without registering.
                    self.rollback_placeholder(&name, &gate);
                    return Err(ClassLoadFailure {
                        name,
                        reason: "loader returned without registering the class".to_string(),
                    });
                }
                Err(err) => {
                    self.rollback_placeholder(&name, &gate);
                    return Err(match err {
                        passthrough @ (ClassNotFound(_) | CircularLoad(_)) => passthrough,
                        other => ClassLoadFailure {
                            name,
                            reason: other.to_string(),
                        },
                    });
                }
            }
        }
    }

    /// Remove this load's placeholder (if it is still ours) and wake waiters so
    /// they observe the miss and retry on their own.
    fn rollback_placeholder(&self, name: &str, gate: &Arc<LoadGate>) {
        if let Entry::Occupied(occupied) = self.by_name.entry(name.to_string()) {
            if let NameState::Loading(current) = occupied.get() {
                if Arc::ptr_eq(current, gate) {
                    occupied.remove();
                }
            }
        }
        gate.complete();
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// True if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Drop all registrations and placeholders. Test isolation only; class
    /// metadata is permanent in production.
    pub(crate) fn reset(&self) {
        while self.by_handle.pop_front().is_some() {}
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::handle::ClassHandle;
    use crate::test::{class_descriptor, class_info};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader that registers a fixed set of classes on demand and counts calls.
    struct StubLoader {
        known: Vec<(String, ClassHandle)>,
        calls: AtomicUsize,
        delay: Option<std::time::Duration>,
    }

    impl StubLoader {
        fn new(known: Vec<(&str, ClassHandle)>) -> Self {
            StubLoader {
                known: known
                    .into_iter()
                    .map(|(n, h)| (n.to_string(), h))
                    .collect(),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    impl ClassLoader for StubLoader {
        fn load(&self, registry: &ClassRegistry, name: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            match self.known.iter().find(|(n, _)| n == name) {
                Some((n, handle)) => {
                    registry.register(class_descriptor(*handle, &class_info(n, None, vec![], vec![])))?;
                    Ok(())
                }
                None => Err(ClassNotFound(name.to_string())),
            }
        }
    }

    #[test]
    fn test_register_and_lookup_both_spellings() {
        let registry = ClassRegistry::new(None);
        let handle = ClassHandle::new(0x10);
        registry
            .register(class_descriptor(handle, &class_info("pkg.A", None, vec![], vec![])))
            .unwrap();

        let by_dotted = registry.by_name("pkg.A").unwrap();
        let by_path = registry.by_name("pkg/A").unwrap();
        assert_eq!(by_dotted.handle, handle);
        assert_eq!(by_path.handle, handle);
        assert_eq!(registry.by_handle(handle).unwrap().name, "pkg.A");
    }

    #[test]
    fn test_duplicate_handle_registration_fails() {
        let registry = ClassRegistry::new(None);
        let handle = ClassHandle::new(0x10);
        registry
            .register(class_descriptor(handle, &class_info("pkg.A", None, vec![], vec![])))
            .unwrap();

        let err = registry
            .register(class_descriptor(handle, &class_info("pkg.B", None, vec![], vec![])))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration(h) if h == handle));

        // The first registration stays visible, the second name never appears.
        assert_eq!(registry.by_handle(handle).unwrap().name, "pkg.A");
        assert!(registry.lookup_loaded("pkg.B").is_none());
    }

    #[test]
    fn test_duplicate_name_registration_rolls_back_handle() {
        let registry = ClassRegistry::new(None);
        registry
            .register(class_descriptor(
                ClassHandle::new(0x10),
                &class_info("pkg.A", None, vec![], vec![]),
            ))
            .unwrap();

        let err = registry
            .register(class_descriptor(
                ClassHandle::new(0x20),
                &class_info("pkg.A", None, vec![], vec![]),
            ))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration(_)));

        assert_eq!(registry.len(), 1);
        assert!(registry.by_handle(ClassHandle::new(0x20)).is_err());
        assert_eq!(registry.by_name("pkg.A").unwrap().handle, ClassHandle::new(0x10));
    }

    #[test]
    fn test_miss_without_loader_leaves_registry_unchanged() {
        let registry = ClassRegistry::new(None);
        let err = registry.by_name("does.not.Exist").unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(_)));

        // No placeholder remains.
        assert!(registry.by_name.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_on_demand_load_registers_and_caches() {
        let handle = ClassHandle::new(0x42);
        let loader = Arc::new(StubLoader::new(vec![("pkg.Lazy", handle)]));
        let registry = ClassRegistry::new(Some(loader.clone()));

        let descriptor = registry.by_name("pkg.Lazy").unwrap();
        assert_eq!(descriptor.handle, handle);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        // Second lookup is served from the registry.
        registry.by_name("pkg.Lazy").unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_rolls_back_placeholder() {
        let loader = Arc::new(StubLoader::new(vec![]));
        let registry = ClassRegistry::new(Some(loader.clone()));

        let err = registry.by_name("pkg.Missing").unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(_)));
        assert!(registry.by_name.is_empty());
        assert!(registry.is_empty());

        // A retry attempts the load again rather than observing stale state.
        let _ = registry.by_name("pkg.Missing");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_loader_success_without_registration_is_a_failure() {
        struct LyingLoader;
        impl ClassLoader for LyingLoader {
            fn load(&self, _registry: &ClassRegistry, _name: &str) -> Result<()> {
                Ok(())
            }
        }

        let registry = ClassRegistry::new(Some(Arc::new(LyingLoader)));
        let err = registry.by_name("pkg.Phantom").unwrap_err();
        assert!(matches!(err, Error::ClassLoadFailure { .. }));
        assert!(registry.by_name.is_empty());
    }

    #[test]
    fn test_circular_load_detected() {
        /// Loader whose class depends on itself through the registry.
        struct CyclicLoader;
        impl ClassLoader for CyclicLoader {
            fn load(&self, registry: &ClassRegistry, name: &str) -> Result<()> {
                // Re-entering the in-flight name on the same call stack must not
                // deadlock.
                registry.by_name(name).map(|_| ())
            }
        }

        let registry = ClassRegistry::new(Some(Arc::new(CyclicLoader)));
        let err = registry.by_name("pkg.Cyclic").unwrap_err();
        assert!(matches!(err, Error::CircularLoad(_)));
        assert!(registry.by_name.is_empty());
    }

    #[test]
    fn test_concurrent_lookups_load_once() {
        let handle = ClassHandle::new(0x77);
        let mut loader = StubLoader::new(vec![("pkg.Shared", handle)]);
        loader.delay = Some(std::time::Duration::from_millis(20));
        let loader = Arc::new(loader);
        let registry = Arc::new(ClassRegistry::new(Some(loader.clone())));

        let mut threads = Vec::new();
        for _ in 0..4 {
            let registry = registry.clone();
            threads.push(std::thread::spawn(move || {
                registry.by_name("pkg.Shared").map(|d| d.handle)
            }));
        }
        for t in threads {
            assert_eq!(t.join().unwrap().unwrap(), handle);
        }

        // The placeholder serialized the load: the loader ran exactly once.
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let registry = ClassRegistry::new(None);
        registry
            .register(class_descriptor(
                ClassHandle::new(0x10),
                &class_info("pkg.A", None, vec![], vec![]),
            ))
            .unwrap();
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.lookup_loaded("pkg.A").is_none());
    }
}
