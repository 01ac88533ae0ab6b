//! Shared helpers for unit tests: builders for the raw ABI records, with the
//! noise fields defaulted so test cases only spell out what they assert on.

use std::sync::Arc;

use crate::metadata::{
    descriptor::ClassDescriptor,
    handle::{ClassHandle, CodePtr, DispatchVectorPtr, StaticSlot},
    raw::{ClassInfo, FieldInfo, MethodInfo, Modifiers, StaticFieldInfo, TypeInfo},
};

fn unresolved_type() -> ClassHandle {
    ClassHandle::new(0)
}

/// A raw class record with the given declared members and everything else
/// defaulted.
pub(crate) fn class_info(
    name: &str,
    super_class: Option<ClassHandle>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
) -> ClassInfo {
    ClassInfo {
        name: name.to_string(),
        super_class,
        dispatch_vector: DispatchVectorPtr::null(),
        obj_size: 16,
        is_interface: false,
        interfaces: vec![],
        fields,
        static_fields: vec![],
        methods,
    }
}

/// A raw instance-field record at the given byte offset.
pub(crate) fn field_info(name: &str, offset: i32) -> FieldInfo {
    FieldInfo {
        name: name.to_string(),
        offset,
        modifiers: Modifiers::PUBLIC,
        type_info: Arc::new(TypeInfo::new(unresolved_type)),
        sig: "I".to_string(),
    }
}

/// A raw static-field record with the given backing storage address.
pub(crate) fn static_field_info(name: &str, sig: &str, storage: usize) -> StaticFieldInfo {
    StaticFieldInfo {
        name: name.to_string(),
        sig: sig.to_string(),
        storage: StaticSlot(storage),
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
        type_info: Arc::new(TypeInfo::new(unresolved_type)),
    }
}

/// A raw method record with the given role offset and no interface identity.
pub(crate) fn method_info(name: &str, sig: &str, offset: i32) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        sig: sig.to_string(),
        offset,
        fn_ptr: CodePtr::null(),
        trampoline: CodePtr::null(),
        iface_id: 0,
        iface_id_hash: 0,
        modifiers: Modifiers::PUBLIC,
        return_type: ClassHandle::new(0),
        arg_types: vec![],
    }
}

/// A registered-form descriptor built from a raw class record.
pub(crate) fn class_descriptor(handle: ClassHandle, info: &ClassInfo) -> ClassDescriptor {
    ClassDescriptor::from_raw(handle, info).expect("test class record is well-formed")
}
