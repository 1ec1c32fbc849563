use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CMONITORS, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use crate::bounds::ScreenBounds;

/// Number of displays on the system, independent of adapter state.
pub fn screen_count() -> usize {
    let count = unsafe { GetSystemMetrics(SM_CMONITORS) };
    count.max(0) as usize
}

/// Bounding rectangle spanning all displays.
pub fn virtual_screen_bounds() -> ScreenBounds {
    unsafe {
        ScreenBounds::new(
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN).max(0) as u32,
            GetSystemMetrics(SM_CYVIRTUALSCREEN).max(0) as u32,
        )
    }
}
