//! Contracts of the downstream clip host, and a heap-backed host implementation.

use crate::convert;
use crate::format::PixelType;

/// Row alignment of frames allocated by `MemoryHost`.
pub const FRAME_ALIGN: usize = 64;

/// Video properties of a clip as the host sees them.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
    pub num_frames: u32,
    pub pixel_type: PixelType,
    pub field_based: bool,
}

impl VideoInfo {
    /// Returns the `(row_size, height)` of plane `plane`, in bytes and rows.
    ///
    /// The first plane spans the whole frame, chroma planes are subsampled.
    pub fn plane_geometry(&self, plane: usize) -> (usize, usize) {
        let width = self.width as usize;
        let height = self.height as usize;

        if plane == 0 {
            (width * self.pixel_type.bytes_per_pixel(), height)
        } else {
            (
                width >> self.pixel_type.sub_sampling_w(),
                height >> self.pixel_type.sub_sampling_h(),
            )
        }
    }
}

/// A writable view of one plane of a host frame.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    /// Plane samples, addressed as `data[row * pitch + column]`.
    pub data: &'a mut [u8],
    /// Distance in bytes between two consecutive rows.
    pub pitch: usize,
    /// Bytes of a row that carry samples.
    pub row_size: usize,
    /// Number of rows.
    pub height: usize,
}

/// A frame allocated by the host.
pub trait HostFrame {
    /// Returns plane `plane` for writing.
    ///
    /// # Panics
    /// May panic if `plane` is not a plane of the frame's pixel type.
    fn plane_mut(&mut self, plane: usize) -> PlaneMut<'_>;
}

/// The downstream engine.
pub trait Host {
    type Frame: HostFrame;

    /// Allocates a frame. Its contents are unspecified.
    fn new_video_frame(&self, vi: &VideoInfo) -> Self::Frame;

    /// Copies `height` rows of `row_size` bytes between pitched buffers.
    #[inline]
    fn bit_blt(
        &self,
        dst: &mut [u8],
        dst_pitch: usize,
        src: &[u8],
        src_pitch: usize,
        row_size: usize,
        height: usize,
    ) {
        convert::bit_blt(dst, dst_pitch, src, src_pitch, row_size, height);
    }
}

/// A clip the host pulls frames from.
pub trait Clip<H: Host> {
    fn video_info(&self) -> VideoInfo;

    /// Produces frame `n`.
    fn get_frame(&self, n: usize, host: &H) -> H::Frame;

    /// Returns whether frame `n` is the top field.
    fn get_parity(&self, _n: usize) -> bool {
        false
    }

    /// Lets the host tune the clip's caching. Returns 0 when the hint is ignored.
    fn set_cache_hints(&self, _hints: i32, _frame_range: i32) -> i32 {
        0
    }
}

/// One heap-allocated plane.
#[derive(Debug, Clone)]
struct PlaneBuffer {
    data: Vec<u8>,
    pitch: usize,
    row_size: usize,
    height: usize,
}

/// A frame allocated by `MemoryHost`.
#[derive(Debug, Clone)]
pub struct MemoryFrame {
    planes: Vec<PlaneBuffer>,
}

impl MemoryFrame {
    /// Gets the number of planes of this frame.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Returns the distance in bytes between two consecutive rows of a plane.
    #[inline]
    pub fn pitch(&self, plane: usize) -> usize {
        self.planes[plane].pitch
    }

    /// Returns the number of bytes of a row of a plane that carry samples.
    #[inline]
    pub fn row_size(&self, plane: usize) -> usize {
        self.planes[plane].row_size
    }

    /// Returns the number of rows of a plane.
    #[inline]
    pub fn height(&self, plane: usize) -> usize {
        self.planes[plane].height
    }

    /// Returns the samples of row `row` of plane `plane`, without the padding.
    #[inline]
    pub fn data_row(&self, plane: usize, row: usize) -> &[u8] {
        let plane = &self.planes[plane];
        assert!(row < plane.height);
        let start = row * plane.pitch;
        &plane.data[start..start + plane.row_size]
    }
}

impl HostFrame for MemoryFrame {
    #[inline]
    fn plane_mut(&mut self, plane: usize) -> PlaneMut<'_> {
        let plane = &mut self.planes[plane];
        PlaneMut {
            data: &mut plane.data,
            pitch: plane.pitch,
            row_size: plane.row_size,
            height: plane.height,
        }
    }
}

/// A host that allocates zeroed frames on the heap, with every row padded to `FRAME_ALIGN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryHost;

impl Host for MemoryHost {
    type Frame = MemoryFrame;

    fn new_video_frame(&self, vi: &VideoInfo) -> MemoryFrame {
        let planes = (0..vi.pixel_type.plane_count())
            .map(|plane| {
                let (row_size, height) = vi.plane_geometry(plane);
                let pitch = row_size.next_multiple_of(FRAME_ALIGN);
                PlaneBuffer {
                    data: vec![0; pitch * height],
                    pitch,
                    row_size,
                    height,
                }
            })
            .collect();

        MemoryFrame { planes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vi(width: u32, height: u32, pixel_type: PixelType) -> VideoInfo {
        VideoInfo {
            width,
            height,
            fps_numerator: 24,
            fps_denominator: 1,
            num_frames: 1,
            pixel_type,
            field_based: false,
        }
    }

    #[test]
    fn planar_geometry() {
        let frame = MemoryHost.new_video_frame(&vi(100, 50, PixelType::I420));
        assert_eq!(frame.plane_count(), 3);
        assert_eq!((frame.row_size(0), frame.height(0)), (100, 50));
        assert_eq!((frame.row_size(1), frame.height(1)), (50, 25));
        assert_eq!((frame.row_size(2), frame.height(2)), (50, 25));
        assert_eq!(frame.pitch(0), 128);
        assert_eq!(frame.pitch(1), 64);

        let frame = MemoryHost.new_video_frame(&vi(100, 50, PixelType::YV411));
        assert_eq!((frame.row_size(1), frame.height(1)), (25, 50));
    }

    #[test]
    fn packed_geometry() {
        let frame = MemoryHost.new_video_frame(&vi(33, 2, PixelType::BGR32));
        assert_eq!(frame.plane_count(), 1);
        assert_eq!((frame.row_size(0), frame.height(0)), (132, 2));
        assert_eq!(frame.pitch(0), 192);

        let frame = MemoryHost.new_video_frame(&vi(16, 2, PixelType::YUY2));
        assert_eq!((frame.row_size(0), frame.height(0)), (32, 2));
    }
}
