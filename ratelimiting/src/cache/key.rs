//! @ai:module:intent Structured cache keys tagged with the cached value's type
//! @ai:module:layer domain
//! @ai:module:public_api CacheKey, CacheKeyBuilder
//! @ai:module:stateless true

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// @ai:intent Opaque key made of a value type tag and an ordered list of string parts
/// @ai:invariant two keys are equal iff their type ids and all parts are equal
///
/// Parts are kept separate rather than joined, so `["a1", "s"]` and
/// `["a", "1s"]` never collide.
#[derive(Clone)]
pub struct CacheKey {
    type_id: TypeId,
    type_name: &'static str,
    parts: Vec<String>,
}

impl CacheKey {
    /// @ai:intent Build a key for values of type T
    /// @ai:effects pure
    pub fn of<T, I, S>(parts: I) -> Self
    where
        T: Any,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// @ai:intent Check whether the key was built for values of type T
    /// @ai:effects pure
    pub fn is_for<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.parts == other.parts
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.parts.hash(state);
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.type_name, self.parts)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// @ai:intent Builds keys for one value type
pub struct CacheKeyBuilder<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T: Any> CacheKeyBuilder<T> {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }

    /// @ai:intent Build a key for T from the given parts
    /// @ai:effects pure
    pub fn key<I, S>(&self, parts: I) -> CacheKey
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CacheKey::of::<T, I, S>(parts)
    }
}

impl<T: Any> Default for CacheKeyBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CacheKeyBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKeyBuilder<{}>", type_name::<T>())
    }
}
