//! Compile-time type identity for component storage.
//!
//! A [`TypeKey`] names a logical component type. It is resolved entirely at
//! compile time through monomorphization: [`TypeKey::of`] copies the `TypeId`
//! the compiler baked into the instantiation, so deriving a key involves no
//! registration, no string hashing, and no inspection of a running value.
//! Unsized types qualify, which is what lets a trait object like
//! `dyn Renderer` act as a storage key in its own right.

use std::any::{type_name, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// TypeKey
// ---------------------------------------------------------------------------

/// Stable identifier for a logical component type.
///
/// Two keys are equal iff they name the same Rust type. The captured type
/// name is display metadata only and takes no part in equality, ordering, or
/// hashing, so map operations never touch a string.
///
/// ```
/// use brume_entity::prelude::*;
///
/// trait Renderer {
///     fn layer(&self) -> u8;
/// }
///
/// assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
/// assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<u64>());
/// // A trait object is a type of its own, with its own key.
/// assert_ne!(TypeKey::of::<dyn Renderer>(), TypeKey::of::<Box<dyn Renderer>>());
/// ```
///
/// Resolution failures are build failures: a generic call site must prove
/// its parameter lives for `'static`, otherwise there is no program to run.
///
/// ```compile_fail
/// use brume_entity::prelude::*;
///
/// fn key_of<T>() -> TypeKey {
///     TypeKey::of::<T>() // missing `T: 'static` bound
/// }
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Resolve the key for `T`.
    ///
    /// `T` may be unsized (`dyn Trait`, `str`, slices), which is how an
    /// alias type becomes a key without the aliased component implementing
    /// anything.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The type name captured at resolution, for logs and snapshots.
    ///
    /// Compiler-produced and not guaranteed stable across toolchains; never
    /// treat it as an identity.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// Identity is the TypeId alone; the name takes no part in comparison or
// hashing.
impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Serializes as the type name, for debug output. A `TypeId` cannot be
/// reconstituted from data, so there is no `Deserialize` counterpart.
impl Serialize for TypeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
