//! Stack growth for the recursive passes
//!
//! Parsing, checking and evaluation recurse once per nesting level. Their
//! depth is bounded by configuration, not by the thread's stack.

const RED_ZONE: usize = 64 * 1024;
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, moving to a fresh stack segment first if the current one is
/// nearly exhausted.
pub(crate) fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}
