use std::sync::Arc;

pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra8,
}

/// A captured pixel buffer. Published frames are immutable; consumers hold
/// them through [`FramePair`] and never observe in-place mutation.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl Frame {
    pub fn blank(width: u32, height: u32) -> Self {
        let stride = width as usize * BYTES_PER_PIXEL;
        Self {
            data: vec![0; stride * height as usize],
            width,
            height,
            stride,
            format: PixelFormat::Bgra8,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// The current frame and the snapshot it replaced, for delta encoding.
/// Both always have the same dimensions.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub current: Arc<Frame>,
    pub previous: Arc<Frame>,
}

impl FramePair {
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        Self {
            current: Arc::new(Frame::blank(width, height)),
            previous: Arc::new(Frame::blank(width, height)),
        }
    }

    /// Shift the current frame into previous and publish the new one.
    pub(crate) fn publish(&mut self, frame: Frame) {
        self.previous = std::mem::replace(&mut self.current, Arc::new(frame));
    }
}

/// Row-by-row copy between buffers whose row pitch and stride may differ.
/// Exactly `width * 4` bytes move per row; source padding is never read and
/// destination padding is never written.
pub fn copy_pixel_rows(
    src: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: u32,
    height: u32,
) {
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    for y in 0..height as usize {
        let s = y * src_pitch;
        let d = y * dst_stride;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_dimensions() {
        let frame = Frame::blank(4, 3);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.stride(), 16);
        assert_eq!(frame.data().len(), 48);
        assert_eq!(frame.format(), PixelFormat::Bgra8);
    }

    #[test]
    fn test_publish_shifts_current_into_previous() {
        let mut pair = FramePair::blank(2, 2);
        let first = pair.current.clone();

        let mut frame = Frame::blank(2, 2);
        frame.data_mut().fill(0xAB);
        pair.publish(frame);

        assert!(Arc::ptr_eq(&pair.previous, &first));
        assert!(pair.current.data().iter().all(|&b| b == 0xAB));
        assert_eq!(pair.current.width(), pair.previous.width());
        assert_eq!(pair.current.height(), pair.previous.height());
    }

    #[test]
    fn test_copy_rows_with_matching_pitch() {
        let src = vec![7u8; 4 * 4 * 2];
        let mut dst = vec![0u8; 4 * 4 * 2];
        copy_pixel_rows(&src, 16, &mut dst, 16, 4, 2);
        assert_eq!(src, dst);
    }

    #[test]
    fn test_copy_rows_skips_source_padding() {
        // 2x2 frame, source pitch carries 8 bytes of padding per row
        let width = 2u32;
        let src_pitch = 16;
        let mut src = vec![0xEEu8; src_pitch * 2];
        for y in 0..2 {
            src[y * src_pitch..y * src_pitch + 8].fill(y as u8 + 1);
        }

        let mut dst = vec![0u8; 8 * 2];
        copy_pixel_rows(&src, src_pitch, &mut dst, 8, width, 2);

        assert!(dst[..8].iter().all(|&b| b == 1));
        assert!(dst[8..].iter().all(|&b| b == 2));
        assert!(!dst.contains(&0xEE));
    }

    #[test]
    fn test_copy_rows_preserves_destination_padding() {
        // destination stride wider than the row: padding bytes stay untouched
        let width = 2u32;
        let dst_stride = 12;
        let src = vec![5u8; 8 * 2];
        let mut dst = vec![0xCCu8; dst_stride * 2];

        copy_pixel_rows(&src, 8, &mut dst, dst_stride, width, 2);

        for y in 0..2 {
            let row = &dst[y * dst_stride..(y + 1) * dst_stride];
            assert!(row[..8].iter().all(|&b| b == 5));
            assert!(row[8..].iter().all(|&b| b == 0xCC));
        }
    }
}
