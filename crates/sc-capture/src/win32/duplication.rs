use std::slice;
use std::time::Duration;

use tracing::{debug, info};
use windows::Win32::Graphics::Direct3D11::{D3D11_MAP_READ, D3D11_MAPPED_SUBRESOURCE, ID3D11Texture2D};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, DXGI_ERROR_ACCESS_LOST, DXGI_ERROR_NOT_FOUND, DXGI_ERROR_WAIT_TIMEOUT,
    DXGI_OUTDUPL_FRAME_INFO, IDXGIAdapter1, IDXGIFactory1, IDXGIOutput, IDXGIOutput1,
    IDXGIOutputDuplication, IDXGIResource,
};
use windows::core::Interface;

use crate::backend::{
    AcquireStatus, DuplicationBackend, DuplicationSession, MappedFrame, OpenedSession,
};
use crate::bounds::ScreenBounds;
use crate::win32::d3d11::{Device, StagingTexture};
use crate::win32::monitor;
use crate::{CaptureError, Result};

// A duplication record with zero accumulated updates carries no new content;
// discard and reacquire, but never spin indefinitely inside one tick.
const ZERO_UPDATE_ATTEMPTS: usize = 4;

pub struct DxgiBackend;

impl DuplicationBackend for DxgiBackend {
    type Session = DxgiSession;

    fn open(&self, selected_screen: usize) -> Result<OpenedSession<DxgiSession>> {
        let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1() }
            .map_err(|e| CaptureError::InitFailed(format!("DXGI factory: {e}")))?;

        let adapter = first_adapter_with_output(&factory)?;
        let output_count = count_attached_outputs(&adapter);
        // an invalid previous selection is superseded without failing
        let resolved_screen = if selected_screen < output_count {
            selected_screen
        } else {
            0
        };

        let device = Device::bind(&adapter)?;

        let output = output_at(&adapter, resolved_screen)?.ok_or_else(|| {
            CaptureError::InitFailed(format!("output {resolved_screen} disappeared during init"))
        })?;
        let desc = unsafe { output.GetDesc() }
            .map_err(|e| CaptureError::InitFailed(format!("output description: {e}")))?;
        let rect = desc.DesktopCoordinates;
        let bounds = ScreenBounds::new(
            rect.left,
            rect.top,
            (rect.right - rect.left) as u32,
            (rect.bottom - rect.top) as u32,
        );

        let staging = StagingTexture::new(device.device(), bounds.width, bounds.height)?;

        let output1: IDXGIOutput1 = output
            .cast()
            .map_err(|e| CaptureError::InitFailed(format!("IDXGIOutput1: {e}")))?;
        let duplication = unsafe { output1.DuplicateOutput(device.device()) }
            .map_err(|e| CaptureError::InitFailed(format!("DuplicateOutput: {e}")))?;

        info!(
            "Duplicating output {} at {}x{}",
            resolved_screen, bounds.width, bounds.height
        );

        Ok(OpenedSession {
            session: DxgiSession {
                device,
                duplication,
                staging,
                width: bounds.width,
                height: bounds.height,
            },
            bounds,
            resolved_screen,
            output_count,
        })
    }

    fn screen_count(&self) -> usize {
        monitor::screen_count()
    }

    fn virtual_screen_bounds(&self) -> ScreenBounds {
        monitor::virtual_screen_bounds()
    }
}

/// One live DXGI duplication session. Dropping it releases the duplication
/// handle, device and staging texture together.
pub struct DxgiSession {
    device: Device,
    duplication: IDXGIOutputDuplication,
    staging: StagingTexture,
    width: u32,
    height: u32,
}

impl DuplicationSession for DxgiSession {
    fn acquire_frame(
        &mut self,
        timeout: Duration,
        sink: &mut dyn FnMut(MappedFrame<'_>),
    ) -> Result<AcquireStatus> {
        let timeout_ms = timeout.as_millis() as u32;

        let resource = match self.acquire_updated_resource(timeout_ms)? {
            Some(resource) => resource,
            None => return Ok(AcquireStatus::TimedOut),
        };

        let copied = self.copy_to_sink(&resource, sink);
        // the frame must be handed back even when the copy fails
        unsafe { self.duplication.ReleaseFrame() }.ok();
        copied?;
        Ok(AcquireStatus::Updated)
    }
}

impl DxgiSession {
    fn acquire_updated_resource(&mut self, timeout_ms: u32) -> Result<Option<IDXGIResource>> {
        for _ in 0..ZERO_UPDATE_ATTEMPTS {
            let mut info = DXGI_OUTDUPL_FRAME_INFO::default();
            let mut resource: Option<IDXGIResource> = None;
            let acquired = unsafe {
                self.duplication
                    .AcquireNextFrame(timeout_ms, &mut info, &mut resource)
            };
            if let Err(e) = acquired {
                if e.code() == DXGI_ERROR_WAIT_TIMEOUT {
                    return Ok(None);
                }
                if e.code() == DXGI_ERROR_ACCESS_LOST {
                    return Err(CaptureError::AccessLost(e.message()));
                }
                return Err(CaptureError::CaptureFailed(format!("AcquireNextFrame: {e}")));
            }

            // zero accumulated updates is a spurious wake, not an error
            if info.AccumulatedFrames == 0 {
                unsafe { self.duplication.ReleaseFrame() }.ok();
                debug!("Discarded duplication record with no accumulated updates");
                continue;
            }

            return match resource {
                Some(resource) => Ok(Some(resource)),
                None => {
                    unsafe { self.duplication.ReleaseFrame() }.ok();
                    Err(CaptureError::CaptureFailed(
                        "AcquireNextFrame produced no resource".into(),
                    ))
                }
            };
        }

        Ok(None)
    }

    fn copy_to_sink(
        &mut self,
        resource: &IDXGIResource,
        sink: &mut dyn FnMut(MappedFrame<'_>),
    ) -> Result<()> {
        let texture: ID3D11Texture2D = resource
            .cast()
            .map_err(|e| CaptureError::CaptureFailed(format!("frame resource cast: {e}")))?;
        let ctx = self.device.ctx();

        unsafe { ctx.CopyResource(self.staging.texture(), &texture) };

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { ctx.Map(self.staging.texture(), 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }
            .map_err(|e| CaptureError::CaptureFailed(format!("staging map: {e}")))?;

        let row_pitch = mapped.RowPitch as usize;
        let row_bytes = self.width as usize * 4;
        if row_pitch < row_bytes {
            unsafe { ctx.Unmap(self.staging.texture(), 0) };
            return Err(CaptureError::CaptureFailed(format!(
                "staging pitch {row_pitch} below row size {row_bytes}"
            )));
        }

        let data = unsafe {
            slice::from_raw_parts(mapped.pData as *const u8, row_pitch * self.height as usize)
        };
        sink(MappedFrame { data, row_pitch });

        unsafe { ctx.Unmap(self.staging.texture(), 0) };
        Ok(())
    }
}

fn first_adapter_with_output(factory: &IDXGIFactory1) -> Result<IDXGIAdapter1> {
    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(CaptureError::InitFailed(format!("EnumAdapters1: {e}"))),
        };
        if count_attached_outputs(&adapter) > 0 {
            return Ok(adapter);
        }
    }
    Err(CaptureError::NoAdapter)
}

fn count_attached_outputs(adapter: &IDXGIAdapter1) -> usize {
    let mut count = 0;
    for i in 0.. {
        match unsafe { adapter.EnumOutputs(i) } {
            Ok(output) => {
                let attached = unsafe { output.GetDesc() }
                    .map(|desc| desc.AttachedToDesktop.as_bool())
                    .unwrap_or(false);
                if attached {
                    count += 1;
                }
            }
            Err(_) => break,
        }
    }
    count
}

/// Walks the adapter's desktop-attached outputs and returns the one at the
/// requested index, if it exists.
fn output_at(adapter: &IDXGIAdapter1, index: usize) -> Result<Option<IDXGIOutput>> {
    let mut current = 0;
    for i in 0.. {
        match unsafe { adapter.EnumOutputs(i) } {
            Ok(output) => {
                let desc = unsafe { output.GetDesc() }
                    .map_err(|e| CaptureError::InitFailed(format!("output description: {e}")))?;
                if desc.AttachedToDesktop.as_bool() {
                    if current == index {
                        return Ok(Some(output));
                    }
                    current += 1;
                }
            }
            Err(_) => break,
        }
    }
    Ok(None)
}
