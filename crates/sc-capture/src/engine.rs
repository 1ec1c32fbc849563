use std::time::Duration;

use tracing::{error, info, warn};

use crate::backend::{AcquireStatus, DuplicationBackend, DuplicationSession, OpenedSession};
use crate::bounds::ScreenBounds;
use crate::frame::{Frame, FramePair, copy_pixel_rows};
use crate::{CaptureError, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(50);

/// Result of one capture tick. Faults never surface as errors here; they are
/// absorbed into `Recovering` and the next call re-initializes.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// A new frame was published; the pair holds it and the snapshot it
    /// replaced.
    Updated(FramePair),
    /// No new screen content arrived within the wait window. Prior frames
    /// are untouched.
    NoChange,
    /// A fault was logged and recovery is pending. Prior frames are kept so
    /// consumers can keep showing the last good image.
    Recovering,
}

pub type ScreenChangedHandler = Box<dyn FnMut(ScreenBounds) + Send>;

/// Pulls successive frames from one display output and recovers transparently
/// from resolution changes and driver hiccups.
///
/// Single-threaded by contract: `capture()` must be driven serially by one
/// loop, and must not race `init()` or `dispose()` on the same instance.
pub struct Capturer<B: DuplicationBackend> {
    backend: B,
    session: Option<B::Session>,
    frames: Option<FramePair>,
    bounds: ScreenBounds,
    selected_screen: usize,
    known_outputs: usize,
    needs_init: bool,
    capture_fullscreen: bool,
    on_screen_changed: Option<ScreenChangedHandler>,
}

impl<B: DuplicationBackend> Capturer<B> {
    /// Create a capturer without touching hardware. It starts in the
    /// needs-init state; the first `capture()` call acquires resources.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: None,
            frames: None,
            bounds: ScreenBounds::default(),
            selected_screen: 0,
            known_outputs: 0,
            needs_init: true,
            capture_fullscreen: true,
            on_screen_changed: None,
        }
    }

    /// (Re)acquire all hardware resources for the selected screen. The live
    /// session is released first; a failure leaves the capturer in the
    /// needs-init state with its previous frames intact.
    pub fn init(&mut self) -> Result<()> {
        self.session = None;

        let OpenedSession {
            session,
            bounds,
            resolved_screen,
            output_count,
        } = self.backend.open(self.selected_screen)?;

        if resolved_screen != self.selected_screen {
            warn!(
                "Selected screen {} is out of range, falling back to {}",
                self.selected_screen, resolved_screen
            );
        }
        self.selected_screen = resolved_screen;
        self.known_outputs = output_count;

        let changed = bounds.width != self.bounds.width || bounds.height != self.bounds.height;
        self.bounds = bounds;
        if changed || self.frames.is_none() {
            self.frames = Some(FramePair::blank(bounds.width, bounds.height));
        }
        if changed {
            info!(
                "Screen {} bound at {}x{}",
                resolved_screen, bounds.width, bounds.height
            );
            if let Some(handler) = self.on_screen_changed.as_mut() {
                handler(bounds);
            }
        }

        self.session = Some(session);
        self.capture_fullscreen = true;
        self.needs_init = false;
        Ok(())
    }

    /// Advance one frame. Timeouts are reported as `NoChange`; every other
    /// failure is logged once, flips the capturer into the needs-init state
    /// and is healed on a later call.
    pub fn capture(&mut self) -> CaptureOutcome {
        if self.needs_init {
            if let Err(e) = self.init() {
                error!("Re-initialization failed: {}", e);
                return CaptureOutcome::Recovering;
            }
        }

        match self.capture_cycle() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Capture failed: {}", e);
                self.needs_init = true;
                CaptureOutcome::Recovering
            }
        }
    }

    fn capture_cycle(&mut self) -> Result<CaptureOutcome> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CaptureError::CaptureFailed("no live duplication session".into()))?;
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| CaptureError::CaptureFailed("frame buffers not allocated".into()))?;

        let (width, height) = (self.bounds.width, self.bounds.height);
        let mut next = Frame::blank(width, height);
        let mut mapped_any = false;

        let status = session.acquire_frame(ACQUIRE_TIMEOUT, &mut |mapped| {
            let stride = next.stride();
            copy_pixel_rows(
                mapped.data,
                mapped.row_pitch,
                next.data_mut(),
                stride,
                width,
                height,
            );
            mapped_any = true;
        })?;

        match status {
            AcquireStatus::TimedOut => Ok(CaptureOutcome::NoChange),
            AcquireStatus::Updated if mapped_any => {
                frames.publish(next);
                Ok(CaptureOutcome::Updated(frames.clone()))
            }
            AcquireStatus::Updated => Err(CaptureError::CaptureFailed(
                "session reported an update without mapping a frame".into(),
            )),
        }
    }

    /// Release all owned hardware and frame resources. Safe to call more
    /// than once.
    pub fn dispose(&mut self) {
        self.session = None;
        self.frames = None;
        self.needs_init = true;
    }

    /// Request capture of a different output. A no-op when `index` is the
    /// current selection; an out-of-range index resolves to 0 but still
    /// forces re-initialization and full-frame recapture.
    pub fn set_selected_screen(&mut self, index: usize) {
        if index == self.selected_screen {
            return;
        }
        // known_outputs is 0 before the first bind; the index is resolved
        // again against live outputs during init
        self.selected_screen = if index < self.known_outputs { index } else { 0 };
        self.capture_fullscreen = true;
        self.needs_init = true;
    }

    pub fn on_screen_changed(&mut self, handler: impl FnMut(ScreenBounds) + Send + 'static) {
        self.on_screen_changed = Some(Box::new(handler));
    }

    pub fn screen_count(&self) -> usize {
        self.backend.screen_count()
    }

    pub fn virtual_screen_bounds(&self) -> ScreenBounds {
        self.backend.virtual_screen_bounds()
    }

    pub fn frames(&self) -> Option<&FramePair> {
        self.frames.as_ref()
    }

    pub fn current_frame(&self) -> Option<&std::sync::Arc<Frame>> {
        self.frames.as_ref().map(|pair| &pair.current)
    }

    pub fn previous_frame(&self) -> Option<&std::sync::Arc<Frame>> {
        self.frames.as_ref().map(|pair| &pair.previous)
    }

    pub fn current_screen_bounds(&self) -> ScreenBounds {
        self.bounds
    }

    pub fn selected_screen(&self) -> usize {
        self.selected_screen
    }

    pub fn needs_init(&self) -> bool {
        self.needs_init
    }

    /// True while the streaming layer should send a full frame instead of a
    /// delta. Set on every (re)bind; the consumer clears it once a full
    /// frame went out.
    pub fn capture_fullscreen(&self) -> bool {
        self.capture_fullscreen
    }

    pub fn set_capture_fullscreen(&mut self, value: bool) {
        self.capture_fullscreen = value;
    }
}
