//! Button input contract and an in-process edge latch.

use crate::error::ActuatorError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Digital input with a rising-edge latch.
pub trait InputSource {
    /// Report whether a rising edge arrived since the last call, clearing the latch.
    ///
    /// Read and clear happen as one step: each edge is reported exactly once.
    fn take_edge(&mut self) -> Result<bool, ActuatorError>;
}

/// Pending-edge flag shared between a producer and the control loop.
///
/// Several edges between two `take` calls collapse into one, matching a
/// hardware "event detected" flag.
#[derive(Debug, Clone, Default)]
pub struct EdgeLatch {
    pending: Arc<AtomicBool>,
}

impl EdgeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rising edge.
    pub fn trigger(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Read and clear the pending flag.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl InputSource for EdgeLatch {
    fn take_edge(&mut self) -> Result<bool, ActuatorError> {
        Ok(self.take())
    }
}

/// Consume every queued edge event, reporting whether there was at least one.
///
/// `poll` must not block. Contact bounce queues several events per press; they
/// collapse into a single edge here, like [`EdgeLatch`].
pub fn drain_edges<E, F>(mut poll: F) -> Result<bool, ActuatorError>
where
    F: FnMut() -> Result<Option<E>, ActuatorError>,
{
    let mut seen = false;
    while poll()?.is_some() {
        seen = true;
    }
    Ok(seen)
}
