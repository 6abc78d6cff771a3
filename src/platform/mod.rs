//! Platform abstraction layer
//!
//! Handles what the host environment provides:
//! - Per-refresh frame callbacks (`FrameHost`)
//! - One-shot timers driven by the host's monotonic clock (`timer`)

pub mod timer;

pub use timer::{TimerHandle, Timers};

/// Identifier of a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u32);

/// Source of per-refresh callbacks (requestAnimationFrame on the web)
pub trait FrameHost {
    /// Ask for one more callback on the next display refresh
    fn request_frame(&mut self) -> FrameRequest;
    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Host whose frames are pumped by the caller (tests, headless runs)
#[derive(Debug, Default)]
pub struct ManualHost {
    next_id: u32,
    /// The request the scheduler is waiting on, if any
    pub pending: Option<FrameRequest>,
    pub requested: u32,
    pub cancelled: u32,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending request, as a browser does right before calling back
    pub fn take_pending(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        self.requested += 1;
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
        self.cancelled += 1;
    }
}
