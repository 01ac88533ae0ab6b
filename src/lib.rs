// Copyright 2026 The classmeta Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # classmeta
//!
//! Reflection and metadata runtime for ahead-of-time compiled Java programs.
//!
//! An AOT compiler for a class-based language emits static metadata tables for every
//! class it compiles: field layouts, method slots, static storage addresses, interface
//! lists and dispatch vectors. `classmeta` is the process-wide runtime that consumes
//! those tables and answers the JNI-style introspection queries generated code and
//! native callers need:
//!
//! - **Class lookup** by canonical name, with on-demand loading of classes that live
//!   in not-yet-loaded shared units
//! - **Member resolution** that walks the inheritance chain with exact signature
//!   matching and Java shadowing semantics
//! - **Interface dispatch** through per-class, collision-safe hash tables keyed by
//!   compile-time interface method identities
//! - **Singleton descriptors** for the nine primitive types and for array types
//! - **String literal interning** with canonical identity per distinct content
//!
//! The crate never executes user methods, never allocates user objects, and treats
//! every code address and dispatch vector the compiler hands it as opaque data.
//!
//! ## Quick Start
//!
//! ```rust
//! use classmeta::prelude::*;
//!
//! let runtime = Runtime::new();
//!
//! // Generated code registers each class once, at load time.
//! let handle = ClassHandle::new(0x1000);
//! runtime.register_class(handle, ClassInfo {
//!     name: "pkg.Greeter".into(),
//!     super_class: None,
//!     dispatch_vector: DispatchVectorPtr::null(),
//!     obj_size: 16,
//!     is_interface: false,
//!     interfaces: vec![],
//!     fields: vec![],
//!     static_fields: vec![],
//!     methods: vec![],
//! })?;
//!
//! // Callers resolve classes by either spelling of the canonical name.
//! let cls = runtime.class_from_name("pkg.Greeter")?;
//! assert_eq!(cls.handle, runtime.class_from_path_name("pkg/Greeter")?.handle);
//! # Ok::<(), classmeta::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::raw`] - the fixed record layout shared with the code generator
//! - [`metadata::descriptor`] - the richer in-memory descriptor model
//! - [`metadata::registry`] - the process-wide class registry with on-demand loading
//! - [`metadata::resolver`] - hierarchy-walking field/method resolution
//! - [`metadata::interfaces`] - hash-based interface method dispatch
//! - [`metadata::intern`] - the string literal intern pool
//! - [`metadata::primitives`] - primitive and array type singletons
//! - [`Runtime`] - the facade tying the components together
//!
//! ## Concurrency
//!
//! The registry is read-mostly: lookups are lock-free (`SkipMap`/`DashMap`), and
//! registration is rare. The external class loader is never invoked while a map
//! shard is locked; a per-name placeholder serializes duplicate loads and detects
//! cyclic load dependencies. All lazily materialized values (interface dispatch
//! tables, primitive class objects) publish through first-writer-wins cells.

#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use classmeta::prelude::*;
///
/// let runtime = Runtime::new();
/// assert!(runtime.class_from_name("does.not.Exist").is_err());
/// ```
pub mod prelude;

/// Metadata records, descriptors, registry, resolution and interning.
///
/// This module contains the whole reflection core:
///
/// - [`metadata::handle`] - opaque handle newtypes shared across the crate
/// - [`metadata::raw`] - compiler-emitted ABI records ([`metadata::raw::ClassInfo`] and friends)
/// - [`metadata::descriptor`] - immutable in-memory descriptors built from raw records
/// - [`metadata::registry`] - the [`metadata::registry::ClassRegistry`]
/// - [`metadata::resolver`] - the [`metadata::resolver::ResolutionEngine`]
/// - [`metadata::interfaces`] - per-class interface dispatch tables
/// - [`metadata::intern`] - the [`metadata::intern::InternPool`]
/// - [`metadata::primitives`] - the primitive/array catalog and its nine singletons
pub mod metadata;

mod runtime;

/// `classmeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. Used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `classmeta` Error type
///
/// The main error type for all operations in this crate. Lookup misses are reported
/// as explicit `Err` values; see [`Error`] for the full taxonomy.
pub use error::Error;

/// The process-wide reflection runtime facade and its loader collaborator trait.
///
/// See [`Runtime`] for the full query surface mirrored from the generated-code ABI.
pub use runtime::{ClassLoader, Runtime};
