use std::marker::PhantomData;

/// Vec wrapper that uses typed indexes.
///
/// Values are only ever appended, so an id handed out by [`IdVec::push`]
/// stays valid for the lifetime of the collection.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, V> IdVec<K, V> {
    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vec: Vec::with_capacity(cap),
            _phantom: PhantomData,
        }
    }

    /// Get the current length
    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// True if len == 0
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Iterate through immutable references to values
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.vec.iter()
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Push `v` into the underlying vec, and return an id that can be used to retrieve it later.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        let id = self.vec.len().into();
        self.vec.push(v);
        id
    }

    /// Iterate through (id, value) pairs in insertion order.
    pub fn iter_ids(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.vec.iter().enumerate().map(|(i, v)| (i.into(), v))
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    /// Get the value with id `k`.
    /// Panics if `k` was not handed out by this collection.
    #[inline]
    pub fn get(&self, k: K) -> &V {
        &self.vec[k.into()]
    }

    /// Get a mutable reference to value with id `k`.
    #[inline]
    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.vec[k.into()]
    }

    /// Get the value with id `k`, or `None` if `k` is out of range
    /// (e.g. an id that came from a different collection).
    #[inline]
    pub fn try_get(&self, k: K) -> Option<&V> {
        self.vec.get(k.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Id(usize);
    impl From<usize> for Id {
        fn from(v: usize) -> Self {
            Self(v)
        }
    }
    impl From<Id> for usize {
        fn from(id: Id) -> usize {
            id.0
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut v: IdVec<Id, &str> = IdVec::default();
        let a = v.push("a");
        let b = v.push("b");
        assert_eq!(a, Id(0));
        assert_eq!(b, Id(1));
        assert_eq!(*v.get(b), "b");
        *v.get_mut(a) = "z";
        assert_eq!(*v.get(a), "z");
        assert_eq!(v.len(), 2);
        assert!(v.try_get(Id(2)).is_none());
    }

    #[test]
    fn test_iter_ids() {
        let mut v: IdVec<Id, u8> = IdVec::with_capacity(4);
        v.push(3);
        v.push(4);
        let pairs: Vec<_> = v.iter_ids().map(|(id, x)| (id.0, *x)).collect();
        assert_eq!(pairs, vec![(0, 3), (1, 4)]);
    }
}
