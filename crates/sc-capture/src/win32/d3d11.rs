use tracing::debug;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::{D3D_DRIVER_TYPE_UNKNOWN, D3D_FEATURE_LEVEL_11_0};
use windows::Win32::Graphics::Direct3D11::{
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_FLAG, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC,
    D3D11_USAGE_STAGING, D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{IDXGIAdapter, IDXGIAdapter1};
use windows::core::Interface;

use crate::{CaptureError, Result};

/// Logical device bound to one adapter, used for copy and map operations.
pub struct Device {
    device: ID3D11Device,
    ctx: ID3D11DeviceContext,
}

impl Device {
    pub fn bind(adapter: &IDXGIAdapter1) -> Result<Self> {
        let adapter: IDXGIAdapter = adapter
            .cast()
            .map_err(|e| CaptureError::InitFailed(format!("IDXGIAdapter: {e}")))?;

        unsafe {
            let mut device = None;
            let mut ctx = None;

            // driver type must be UNKNOWN when an explicit adapter is given
            D3D11CreateDevice(
                &adapter,
                D3D_DRIVER_TYPE_UNKNOWN,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_FLAG(0),
                Some(&[D3D_FEATURE_LEVEL_11_0]),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut ctx),
            )
            .map_err(|e| CaptureError::InitFailed(format!("D3D11 device: {e}")))?;

            debug!("D3D11 device created");
            match (device, ctx) {
                (Some(device), Some(ctx)) => Ok(Self { device, ctx }),
                _ => Err(CaptureError::InitFailed(
                    "D3D11CreateDevice returned no device".into(),
                )),
            }
        }
    }

    pub fn device(&self) -> &ID3D11Device {
        &self.device
    }

    pub fn ctx(&self) -> &ID3D11DeviceContext {
        &self.ctx
    }
}

/// CPU-readable staging target sized to the output, fixed 32-bit BGRA.
pub struct StagingTexture {
    inner: ID3D11Texture2D,
}

impl StagingTexture {
    pub fn new(device: &ID3D11Device, width: u32, height: u32) -> Result<Self> {
        let desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_STAGING,
            BindFlags: 0,
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: 0,
        };

        let mut tex = None;
        unsafe { device.CreateTexture2D(&desc, None, Some(&mut tex)) }
            .map_err(|e| CaptureError::InitFailed(format!("staging texture: {e}")))?;

        tex.map(|inner| Self { inner }).ok_or_else(|| {
            CaptureError::InitFailed("CreateTexture2D returned no texture".into())
        })
    }

    pub fn texture(&self) -> &ID3D11Texture2D {
        &self.inner
    }
}
