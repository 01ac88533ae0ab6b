//! Opaque handle newtypes shared across the crate.
//!
//! Every address the code generator hands the runtime - class handles, code
//! addresses, static storage slots, dispatch vectors, interface method identities -
//! is wrapped in a dedicated newtype here. The runtime stores, compares and hashes
//! these values but never dereferences or interprets them; they are data with
//! identity, nothing more.

use std::fmt;

/// An opaque handle identifying one loaded class or interface.
///
/// The code generator assigns a process-unique value per class (in the original
/// calling convention this is the address of the class object). Values at or above
/// [`ClassHandle::RUNTIME_RESERVED_BASE`] are reserved for handles the runtime
/// itself mints: the nine primitive singletons and on-demand array classes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassHandle(pub usize);

impl ClassHandle {
    /// First handle value reserved for runtime-minted classes (primitives, arrays).
    pub const RUNTIME_RESERVED_BASE: usize = 0xFFFF_0000;

    /// Creates a handle from a raw value
    #[must_use]
    pub fn new(value: usize) -> Self {
        ClassHandle(value)
    }

    /// Returns the raw handle value
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }

    /// Returns true if this is the null handle (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for ClassHandle {
    fn from(value: usize) -> Self {
        ClassHandle(value)
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassHandle(0x{:x})", self.0)
    }
}

impl fmt::Display for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// An opaque code address: a compiled function entry point or trampoline.
///
/// Used for `CallNonvirtual`/`CallStatic` style invocation by callers outside this
/// crate; the runtime only stores and returns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodePtr(pub usize);

impl CodePtr {
    /// Creates a code pointer from a raw address
    #[must_use]
    pub fn new(addr: usize) -> Self {
        CodePtr(addr)
    }

    /// The null code pointer
    #[must_use]
    pub fn null() -> Self {
        CodePtr(0)
    }

    /// Returns true if this is the null address
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for CodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodePtr(0x{:x})", self.0)
    }
}

/// The address of a static field's process-wide storage.
///
/// Static fields are implemented as globals by the code generator; the descriptor
/// records where the storage lives so JNI-style callers can read and write it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticSlot(pub usize);

impl StaticSlot {
    /// Creates a static storage slot from a raw address
    #[must_use]
    pub fn new(addr: usize) -> Self {
        StaticSlot(addr)
    }
}

impl fmt::Debug for StaticSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticSlot(0x{:x})", self.0)
    }
}

/// The address of a class's compiler-generated dispatch vector.
///
/// Instance method descriptors carry an index into this table; the table contents
/// are owned by generated code and are opaque to the runtime beyond that index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchVectorPtr(pub usize);

impl DispatchVectorPtr {
    /// Creates a dispatch vector pointer from a raw address
    #[must_use]
    pub fn new(addr: usize) -> Self {
        DispatchVectorPtr(addr)
    }

    /// The null dispatch vector (interfaces and primitives have none)
    #[must_use]
    pub fn null() -> Self {
        DispatchVectorPtr(0)
    }

    /// Returns true if this is the null address
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for DispatchVectorPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DispatchVectorPtr(0x{:x})", self.0)
    }
}

/// A compile-time-assigned identity for one interface-declared method signature.
///
/// The identity is stable across every class implementing the declaring interface,
/// which is what makes it usable as a dispatch key where no uniform vtable layout
/// exists. The value is opaque; zero means "not an interface method" and never
/// appears on a populated identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IfaceMethodId(pub usize);

impl IfaceMethodId {
    /// Creates an identity from a raw value
    #[must_use]
    pub fn new(value: usize) -> Self {
        IfaceMethodId(value)
    }

    /// Returns the raw identity value
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }

    /// Returns true if this is the absent identity (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for IfaceMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IfaceMethodId(0x{:x})", self.0)
    }
}

impl fmt::Display for IfaceMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_class_handle_basics() {
        let handle = ClassHandle::new(0x1000);
        assert_eq!(handle.value(), 0x1000);
        assert!(!handle.is_null());
        assert!(ClassHandle::new(0).is_null());
        assert_eq!(handle, ClassHandle::from(0x1000));
    }

    #[test]
    fn test_class_handle_ordering() {
        let a = ClassHandle::new(1);
        let b = ClassHandle::new(2);
        assert!(a < b);
    }

    #[test]
    fn test_class_handle_as_map_key() {
        let mut map = HashMap::new();
        map.insert(ClassHandle::new(42), "pkg.A");
        assert_eq!(map.get(&ClassHandle::new(42)), Some(&"pkg.A"));
        assert_eq!(map.get(&ClassHandle::new(43)), None);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(format!("{}", ClassHandle::new(0xff)), "0xff");
        assert_eq!(format!("{}", IfaceMethodId::new(0x10)), "0x10");
        assert_eq!(format!("{:?}", CodePtr::new(0xbeef)), "CodePtr(0xbeef)");
    }

    #[test]
    fn test_null_sentinels() {
        assert!(CodePtr::null().is_null());
        assert!(DispatchVectorPtr::null().is_null());
        assert!(IfaceMethodId::new(0).is_null());
        assert!(!IfaceMethodId::new(7).is_null());
    }
}
