use std::time::Duration;

use crate::Result;
use crate::bounds::ScreenBounds;

/// A successfully opened duplication session plus what the binder resolved
/// while opening it.
pub struct OpenedSession<S> {
    pub session: S,
    /// Desktop bounds of the bound output.
    pub bounds: ScreenBounds,
    /// The screen index actually bound; differs from the requested one when
    /// the request was out of range and fell back to 0.
    pub resolved_screen: usize,
    /// Attached outputs on the bound adapter, for later clamp checks.
    pub output_count: usize,
}

/// CPU view of one acquired frame while the staging buffer is mapped.
/// `data` holds `row_pitch * height` bytes; the pitch may exceed `width * 4`.
pub struct MappedFrame<'a> {
    pub data: &'a [u8],
    pub row_pitch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStatus {
    /// New content was mapped and handed to the sink.
    Updated,
    /// The bounded wait elapsed with nothing new. Not a fault.
    TimedOut,
}

/// One live hardware duplication session. Dropping it releases the
/// duplication handle and the staging buffer.
pub trait DuplicationSession {
    /// Acquire the next frame with a bounded wait and hand the mapped pixels
    /// to `sink`. Records with zero accumulated updates are discarded and
    /// reacquired internally. Errors are hardware faults; the engine decides
    /// the recovery policy.
    fn acquire_frame(
        &mut self,
        timeout: Duration,
        sink: &mut dyn FnMut(MappedFrame<'_>),
    ) -> Result<AcquireStatus>;
}

/// Platform seam for the capture engine. The Windows implementation drives
/// DXGI output duplication; tests drive a scripted fake.
pub trait DuplicationBackend {
    type Session: DuplicationSession;

    /// Bind adapter, device, output and duplication in one step. A selected
    /// screen beyond the adapter's output count resolves to 0.
    fn open(&self, selected_screen: usize) -> Result<OpenedSession<Self::Session>>;

    /// Number of displays on the system, independent of adapter state.
    fn screen_count(&self) -> usize;

    /// Bounding rectangle spanning all displays.
    fn virtual_screen_bounds(&self) -> ScreenBounds;
}
