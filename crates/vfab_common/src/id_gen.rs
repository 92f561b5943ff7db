//! Monotonic id allocation scoped to one simulation run.

use crate::arena::ArenaId;
use std::marker::PhantomData;

/// Hands out monotonically increasing ids of type `I`.
///
/// Each coordinator owns its own generators, so two runs in the same process
/// never share counters.
#[derive(Debug, Clone)]
pub struct IdGenerator<I: ArenaId> {
    next: u32,
    _marker: PhantomData<I>,
}

impl<I: ArenaId> IdGenerator<I> {
    /// Creates a generator whose first id has the raw value `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: first,
            _marker: PhantomData,
        }
    }

    /// Returns the next id.
    pub fn next_id(&mut self) -> I {
        let id = I::from_raw(self.next);
        self.next += 1;
        id
    }

    /// Returns the raw value the next call to [`next_id`](Self::next_id) will use.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl<I: ArenaId> Default for IdGenerator<I> {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TaskId;

    #[test]
    fn ids_are_monotonic() {
        let mut gen: IdGenerator<TaskId> = IdGenerator::starting_at(1);
        assert_eq!(gen.next_id().as_raw(), 1);
        assert_eq!(gen.next_id().as_raw(), 2);
        assert_eq!(gen.peek(), 3);
    }

    #[test]
    fn generators_are_independent() {
        let mut a: IdGenerator<TaskId> = IdGenerator::default();
        let mut b: IdGenerator<TaskId> = IdGenerator::default();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id().as_raw(), 0);
    }
}
