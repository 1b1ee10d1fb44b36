//! Request tokens and the in-flight guard.
//!
//! Every navigation takes a fresh [`RequestToken`]. A completion may touch
//! the view only while its token is still current; the in-flight marker is
//! owned by the token that set it, so a stale completion can never release
//! the marker of a newer navigation.

use std::cell::Cell;

/// Monotonic id of one navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues tokens and tracks which one has a fetch in flight.
#[derive(Debug, Default)]
pub struct RequestCoordinator {
    current: Cell<u64>,
    in_flight: Cell<Option<RequestToken>>,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The token whose results are currently accepted.
    pub fn current(&self) -> RequestToken {
        RequestToken(self.current.get())
    }

    /// Invalidate every outstanding request and return the new current token.
    pub fn supersede(&self) -> RequestToken {
        let next = self.current.get() + 1;
        self.current.set(next);
        tracing::debug!(token = next, "navigation superseded previous requests");
        RequestToken(next)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current.get()
    }

    /// A fetch for the current navigation is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.get() == Some(self.current())
    }

    /// Mark `token` as having a fetch in flight until the guard drops.
    pub fn track(&self, token: RequestToken) -> InFlight<'_> {
        self.in_flight.set(Some(token));
        InFlight {
            coordinator: self,
            token,
        }
    }
}

/// Releases the in-flight marker when dropped, if it still belongs to its token.
#[must_use = "the request is only tracked while the guard is alive"]
pub struct InFlight<'a> {
    coordinator: &'a RequestCoordinator,
    token: RequestToken,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.coordinator.in_flight.get() == Some(self.token) {
            self.coordinator.in_flight.set(None);
        }
    }
}

/// Rows that fit in the viewport, at least one.
pub fn page_size(viewport_height: f64, row_height: f64) -> u32 {
    if !(viewport_height.is_finite() && row_height.is_finite()) || row_height <= 0.0 {
        return 1;
    }
    let rows = (viewport_height / row_height).ceil();
    if rows < 1.0 { 1 } else { rows as u32 }
}
