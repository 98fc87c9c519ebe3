//! Correlation handle allocation.
//!
//! Request/reply correlation abstractly needs a table of in-flight
//! handles. This session permits exactly one outstanding command, so
//! the table degenerates to a single slot, but handles are still drawn
//! sequentially rather than pinned to a constant so the reply echo can
//! be verified and the design has room for multiple in-flight slots
//! later.

/// Hands out sequential non-zero handles, one in flight at a time.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: u64,
    in_flight: Option<u64>,
}

impl HandleAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: 1,
            in_flight: None,
        }
    }

    /// Claims the next handle, or returns the pending one if a command
    /// is already outstanding.
    pub(crate) fn acquire(&mut self) -> Result<u64, u64> {
        if let Some(pending) = self.in_flight {
            return Err(pending);
        }

        let handle = self.next;
        self.next = match self.next.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.in_flight = Some(handle);
        Ok(handle)
    }

    /// Releases the slot once the exchange finished, successfully or not.
    pub(crate) fn release(&mut self, handle: u64) {
        debug_assert_eq!(self.in_flight, Some(handle));
        self.in_flight = None;
    }
}
