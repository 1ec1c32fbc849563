#[cfg(windows)]
mod win32;

mod backend;
mod bounds;
mod engine;
mod frame;

use thiserror::Error;

pub use backend::{
    AcquireStatus, DuplicationBackend, DuplicationSession, MappedFrame, OpenedSession,
};
pub use bounds::ScreenBounds;
pub use engine::{CaptureOutcome, Capturer};
pub use frame::{BYTES_PER_PIXEL, Frame, FramePair, PixelFormat, copy_pixel_rows};

#[cfg(windows)]
pub use win32::DxgiBackend;

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No graphics adapter exposes an attached output")]
    NoAdapter,

    #[error("Initialization failed: {0}")]
    InitFailed(String),

    #[error("Duplication access lost: {0}")]
    AccessLost(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),
}

// The platform capturer for this target
#[cfg(windows)]
pub type DesktopCapturer = Capturer<win32::DxgiBackend>;
