//! Stack growth for the reader, the evaluator and every walk over nested
//! values.
//!
//! Each of them recurses once per nesting level, so a deeply nested input
//! would otherwise overflow the native stack long before any depth limit is
//! reached (test threads only get 2MB). When less than
//! [`RED_ZONE`] bytes remain, a fresh [`STACK_PER_RECURSION`] segment is
//! allocated on the heap and the closure continues there.

const RED_ZONE: usize = 100 * 1024;

const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
