//! Lazy, random-access views over input data.
//!
//! Kernels read their inputs through `IndexedSource`, so a transformed sequence
//! (for example a stencil seen as 0/1 predicate values) is computed on the fly
//! at the index a lane asks for. Nothing is materialized in memory.

use std::marker::PhantomData;

use num_traits::{One, Zero};

/// A read-only sequence that any lane may index concurrently.
pub trait IndexedSource: Sync {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    fn at(&self, index: usize) -> Self::Item;

    /// A view applying `f` to every element on access.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Item) -> U + Sync,
    {
        Map { source: self, f }
    }
}

impl<'a, T: Sync> IndexedSource for &'a [T] {
    type Item = &'a T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn at(&self, index: usize) -> &'a T {
        &self[index]
    }
}

/// See [`IndexedSource::map`].
#[derive(Debug, Clone, Copy)]
pub struct Map<S, F> {
    source: S,
    f: F,
}

impl<S, F, U> IndexedSource for Map<S, F>
where
    S: IndexedSource,
    F: Fn(S::Item) -> U + Sync,
{
    type Item = U;

    fn len(&self) -> usize {
        self.source.len()
    }

    fn at(&self, index: usize) -> U {
        (self.f)(self.source.at(index))
    }
}

/// Views a source through a predicate as integral `1` (true) or `0` (false).
pub struct PredicateToIntegral<S, P, I> {
    source: S,
    pred: P,
    _integral: PhantomData<fn() -> I>,
}

impl<S, P, I> PredicateToIntegral<S, P, I> {
    pub fn new(source: S, pred: P) -> Self {
        Self {
            source,
            pred,
            _integral: PhantomData,
        }
    }
}

impl<S, P, I> IndexedSource for PredicateToIntegral<S, P, I>
where
    S: IndexedSource,
    P: Fn(S::Item) -> bool + Sync,
    I: Zero + One,
{
    type Item = I;

    fn len(&self) -> usize {
        self.source.len()
    }

    fn at(&self, index: usize) -> I {
        if (self.pred)(self.source.at(index)) {
            I::one()
        } else {
            I::zero()
        }
    }
}
