//! Caller-context probe deciding whether a lookup may block and retry.

use std::cell::Cell;

thread_local! {
    static EXTERNAL_REQUEST: Cell<bool> = const { Cell::new(false) };
}

/// Tells whether the current call serves an external client request.
///
/// Internal callers (bulk loading, remote event processing) must never be
/// made to wait for convergence.
pub trait RequestContextProbe: Send + Sync {
    fn is_external_request(&self) -> bool;
}

impl<F> RequestContextProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_external_request(&self) -> bool {
        self()
    }
}

/// Probe reading the flag set by [`external_request`] on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalProbe;

impl RequestContextProbe for ThreadLocalProbe {
    fn is_external_request(&self) -> bool {
        EXTERNAL_REQUEST.with(Cell::get)
    }
}

/// Marks the current thread as serving an external request until dropped.
#[must_use = "the request scope ends when the guard is dropped"]
#[derive(Debug)]
pub struct RequestScope {
    previous: bool,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        EXTERNAL_REQUEST.with(|flag| flag.set(self.previous));
    }
}

/// Enters an external request scope on the current thread.
pub fn external_request() -> RequestScope {
    let previous = EXTERNAL_REQUEST.with(|flag| flag.replace(true));
    RequestScope { previous }
}
