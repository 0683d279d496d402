//! Containers whose heap memory is charged against a [`MemoryScope`]
//!
//! Growth is charged before the buffer grows, so a refused charge leaves the
//! container untouched and the [`TerminationRequest`] can be propagated with
//! `?`. Dropping the container credits everything it charged.

use gbd_domain::{MemoryScope, TerminationRequest};
use std::mem;
use std::ops::{Deref, DerefMut};

const MIN_CAPACITY: usize = 4;

/// A `Vec<T>` that reports its capacity to a memory scope
pub struct TrackedVec<'s, T> {
    items: Vec<T>,
    charged: usize,
    scope: &'s dyn MemoryScope,
}

impl<'s, T> TrackedVec<'s, T> {
    /// Create an empty vector; nothing is charged until it grows
    pub fn new(scope: &'s dyn MemoryScope) -> Self {
        Self {
            items: Vec::new(),
            charged: 0,
            scope,
        }
    }

    /// Create a vector with room for `capacity` elements
    pub fn with_capacity(
        capacity: usize,
        scope: &'s dyn MemoryScope,
    ) -> Result<Self, TerminationRequest> {
        let mut vec = Self::new(scope);
        vec.grow_to(capacity)?;
        Ok(vec)
    }

    fn grow_to(&mut self, capacity: usize) -> Result<(), TerminationRequest> {
        let bytes = capacity.saturating_mul(mem::size_of::<T>());
        let extra = bytes.saturating_sub(self.charged);
        if extra > 0 {
            self.scope.on_alloc(extra)?;
            self.charged += extra;
        }
        self.items.reserve_exact(capacity.saturating_sub(self.items.len()));
        Ok(())
    }

    fn ensure_capacity(&mut self, needed: usize) -> Result<(), TerminationRequest> {
        if needed <= self.items.capacity() {
            return Ok(());
        }
        let doubled = self.items.capacity().saturating_mul(2);
        self.grow_to(needed.max(doubled).max(MIN_CAPACITY))
    }

    /// Append an element
    pub fn push(&mut self, value: T) -> Result<(), TerminationRequest> {
        self.ensure_capacity(self.items.len() + 1)?;
        self.items.push(value);
        Ok(())
    }

    /// Resize to `len` elements, filling with `value`
    pub fn resize(&mut self, len: usize, value: T) -> Result<(), TerminationRequest>
    where
        T: Clone,
    {
        self.ensure_capacity(len)?;
        self.items.resize(len, value);
        Ok(())
    }

    /// Remove all elements, keeping the (charged) capacity
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Bytes currently charged to the scope
    pub fn charged_bytes(&self) -> usize {
        self.charged
    }
}

impl<T> Deref for TrackedVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for TrackedVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T> Drop for TrackedVec<'_, T> {
    fn drop(&mut self) {
        if self.charged > 0 {
            self.scope.on_dealloc(self.charged);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for TrackedVec<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedVec")
            .field("items", &self.items)
            .field("charged", &self.charged)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scope with a fixed budget that records its balance
    struct Budget {
        limit: usize,
        used: Cell<usize>,
    }

    impl Budget {
        fn new(limit: usize) -> Self {
            Self { limit, used: Cell::new(0) }
        }
    }

    impl MemoryScope for Budget {
        fn on_alloc(&self, bytes: usize) -> Result<(), TerminationRequest> {
            let next = self.used.get() + bytes;
            if next > self.limit {
                return Err(TerminationRequest { requested: bytes, needed: next });
            }
            self.used.set(next);
            Ok(())
        }

        fn on_dealloc(&self, bytes: usize) {
            self.used.set(self.used.get() - bytes);
        }
    }

    #[test]
    fn test_growth_is_charged_and_credited() {
        let budget = Budget::new(1 << 20);
        {
            let mut vec = TrackedVec::<u64>::new(&budget);
            for i in 0..1000 {
                vec.push(i).unwrap();
            }
            assert_eq!(vec.len(), 1000);
            assert_eq!(vec[999], 999);
            assert_eq!(budget.used.get(), vec.charged_bytes());
            assert!(vec.charged_bytes() >= 1000 * 8);
        }
        assert_eq!(budget.used.get(), 0);
    }

    #[test]
    fn test_refused_growth_leaves_vector_intact() {
        let budget = Budget::new(64);
        let mut vec = TrackedVec::<u8>::with_capacity(32, &budget).unwrap();
        vec.resize(32, 7).unwrap();
        let err = vec.resize(100, 0).unwrap_err();
        assert_eq!(err.requested, 68);
        assert_eq!(vec.len(), 32);
        assert_eq!(budget.used.get(), 32);
        drop(vec);
        assert_eq!(budget.used.get(), 0);
    }

    #[test]
    fn test_slice_access() {
        let budget = Budget::new(1024);
        let mut vec = TrackedVec::new(&budget);
        for v in [3u32, 1, 2] {
            vec.push(v).unwrap();
        }
        vec.sort_unstable();
        assert_eq!(&vec[..], &[1, 2, 3]);
        vec.clear();
        assert!(vec.is_empty());
    }
}
