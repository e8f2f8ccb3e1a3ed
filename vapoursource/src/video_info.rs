//! Clip properties: what the upstream node reports and what the host gets to see.

use crate::errors::{Error, Result};
use crate::format::{self, PixelType};
use crate::host::VideoInfo;

/// Properties of an upstream format.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FormatInfo {
    /// Upstream format identifier.
    pub id: i32,
    pub plane_count: usize,
    pub bytes_per_sample: usize,
}

/// Properties of an upstream node, as reported by the engine.
///
/// Zero in `width`, `height` or `fps_num`, or a missing `format`, means the property varies
/// between frames. Zero `num_frames` means the clip is infinite.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NodeInfo {
    pub format: Option<FormatInfo>,
    pub fps_num: i64,
    pub fps_den: i64,
    pub width: i32,
    pub height: i32,
    pub num_frames: i32,
}

/// Validated, constant description of the clip a session serves.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ClipDescriptor {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub frame_count: u32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
    pub pixel_type: PixelType,
    /// Whether high and low bytes of each sample are stacked vertically.
    pub is_stacked_layout: bool,
    /// Planes of the upstream format.
    pub plane_count: usize,
}

impl ClipDescriptor {
    /// Validates the upstream properties and derives the output geometry.
    ///
    /// Samples wider than one byte are either laid out side by side (doubling the width) or,
    /// with `stacked`, split into a high-byte image over a low-byte image (doubling the
    /// height). 8-bit and packed formats keep their geometry.
    pub fn new(info: &NodeInfo, stacked: bool) -> Result<Self> {
        if info.num_frames <= 0 {
            return Err(Error::InfiniteLength);
        }

        let format = match info.format {
            Some(format) if info.width > 0 && info.height > 0 => format,
            _ => return Err(Error::VariableFormat),
        };

        if info.fps_num == 0 {
            return Err(Error::VariableFramerate);
        }
        let fps_numerator = u32::try_from(info.fps_num).map_err(|_| Error::FpsNumOverflow)?;
        let fps_denominator = u32::try_from(info.fps_den).map_err(|_| Error::FpsDenOverflow)?;

        let pixel_type = format::map_format(format.id);
        if pixel_type == PixelType::Unknown {
            return Err(Error::UnsupportedFormat);
        }

        let over_8bit = pixel_type.is_planar() && format.bytes_per_sample > 1;
        let (width_shift, height_shift) = match (over_8bit, stacked) {
            (true, false) => (1, 0),
            (true, true) => (0, 1),
            (false, _) => (0, 0),
        };

        Ok(Self {
            width: (info.width as u32) << width_shift,
            height: (info.height as u32) << height_shift,
            frame_count: info.num_frames as u32,
            fps_numerator,
            fps_denominator,
            pixel_type,
            is_stacked_layout: over_8bit && stacked,
            plane_count: format.plane_count,
        })
    }

    /// Returns the video info the host allocates frames from.
    #[inline]
    pub fn video_info(&self) -> VideoInfo {
        VideoInfo {
            width: self.width,
            height: self.height,
            fps_numerator: self.fps_numerator,
            fps_denominator: self.fps_denominator,
            num_frames: self.frame_count,
            pixel_type: self.pixel_type,
            field_based: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PresetFormat;

    fn info(format: PresetFormat, bytes_per_sample: usize) -> NodeInfo {
        NodeInfo {
            format: Some(FormatInfo {
                id: format.id(),
                plane_count: 3,
                bytes_per_sample,
            }),
            fps_num: 30000,
            fps_den: 1001,
            width: 640,
            height: 480,
            num_frames: 100,
        }
    }

    fn geometry(info: &NodeInfo, stacked: bool) -> (u32, u32, bool) {
        let descriptor = ClipDescriptor::new(info, stacked).unwrap();
        (
            descriptor.width,
            descriptor.height,
            descriptor.is_stacked_layout,
        )
    }

    #[test]
    fn eight_bit_geometry_ignores_stacked() {
        let info = info(PresetFormat::YUV420P8, 1);
        assert_eq!(geometry(&info, false), (640, 480, false));
        assert_eq!(geometry(&info, true), (640, 480, false));
    }

    #[test]
    fn deep_interleaved_doubles_width() {
        let info = info(PresetFormat::YUV420P10, 2);
        assert_eq!(geometry(&info, false), (1280, 480, false));
    }

    #[test]
    fn deep_stacked_doubles_height() {
        let info = info(PresetFormat::YUV444P16, 2);
        assert_eq!(geometry(&info, true), (640, 960, true));
    }

    #[test]
    fn deep_gray_counts_as_planar() {
        let mut info = info(PresetFormat::Gray16, 2);
        info.format.as_mut().unwrap().plane_count = 1;
        assert_eq!(geometry(&info, true), (640, 960, true));
    }

    #[test]
    fn video_info_carries_timing() {
        let descriptor = ClipDescriptor::new(&info(PresetFormat::YUV422P8, 1), false).unwrap();
        let vi = descriptor.video_info();
        assert_eq!(vi.fps_numerator, 30000);
        assert_eq!(vi.fps_denominator, 1001);
        assert_eq!(vi.num_frames, 100);
        assert_eq!(vi.pixel_type, PixelType::YV16);
        assert!(!vi.field_based);
    }

    #[test]
    fn validation_order() {
        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.num_frames = 0;
        bad.fps_num = 0;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::InfiniteLength)
        ));

        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.format = None;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::VariableFormat)
        ));

        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.height = 0;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::VariableFormat)
        ));

        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.fps_num = 0;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::VariableFramerate)
        ));

        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.fps_num = i64::from(u32::MAX) + 1;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::FpsNumOverflow)
        ));

        let mut bad = info(PresetFormat::YUV420P8, 1);
        bad.fps_den = i64::from(u32::MAX) + 1;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::FpsDenOverflow)
        ));

        let mut bad = info(PresetFormat::RGB24, 1);
        bad.fps_den = 1;
        assert!(matches!(
            ClipDescriptor::new(&bad, false),
            Err(Error::UnsupportedFormat)
        ));
    }

    #[test]
    fn fps_at_u32_max_is_accepted() {
        let mut info = info(PresetFormat::YUV420P8, 1);
        info.fps_num = i64::from(u32::MAX);
        info.fps_den = i64::from(u32::MAX);
        let descriptor = ClipDescriptor::new(&info, false).unwrap();
        assert_eq!(descriptor.fps_numerator, u32::MAX);
    }
}
