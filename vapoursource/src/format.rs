//! Upstream and downstream pixel formats, and the table mapping one onto the other.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::{self, Display};

/// VSScript (API 3) preset format identifiers.
///
/// Only the presets that have a downstream counterpart are listed here; any other identifier
/// reported by the upstream engine is simply an `i32` that the mapper sends to
/// `PixelType::Unknown`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PresetFormat {
    Gray8 = ColorModel::Gray as i32 + 10,
    Gray16 = ColorModel::Gray as i32 + 11,

    YUV420P8 = ColorModel::YUV as i32 + 10,
    YUV422P8 = ColorModel::YUV as i32 + 11,
    YUV444P8 = ColorModel::YUV as i32 + 12,
    YUV410P8 = ColorModel::YUV as i32 + 13,
    YUV411P8 = ColorModel::YUV as i32 + 14,
    YUV440P8 = ColorModel::YUV as i32 + 15,

    YUV420P9 = ColorModel::YUV as i32 + 16,
    YUV420P10 = ColorModel::YUV as i32 + 17,
    YUV420P16 = ColorModel::YUV as i32 + 18,

    YUV444P9 = ColorModel::YUV as i32 + 19,
    YUV444P10 = ColorModel::YUV as i32 + 20,
    YUV444P16 = ColorModel::YUV as i32 + 21,

    YUV422P9 = ColorModel::YUV as i32 + 22,
    YUV422P10 = ColorModel::YUV as i32 + 23,
    YUV422P16 = ColorModel::YUV as i32 + 24,

    RGB24 = ColorModel::RGB as i32 + 10,

    CompatBGR32 = ColorModel::Compat as i32 + 10,
    CompatYUY2 = ColorModel::Compat as i32 + 11,
}

/// Color model bases of the VSScript (API 3) format identifiers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ColorModel {
    Gray = 1_000_000,
    RGB = 2_000_000,
    YUV = 3_000_000,
    Compat = 9_000_000,
}

impl PresetFormat {
    /// Returns the numeric upstream identifier.
    #[inline]
    pub const fn id(self) -> i32 {
        self as i32
    }
}

impl From<PresetFormat> for i32 {
    #[inline]
    fn from(x: PresetFormat) -> Self {
        x.id()
    }
}

// Downstream colorspace bits (AviSynth 2.6 layout).
const CS_BGR: u32 = 1 << 28;
const CS_YUV: u32 = 1 << 29;
const CS_INTERLEAVED: u32 = 1 << 30;
const CS_PLANAR: u32 = 1 << 31;

const CS_VPLANE_FIRST: u32 = 1 << 3;
const CS_UPLANE_FIRST: u32 = 1 << 4;

const CS_SUB_WIDTH_1: u32 = 3;
const CS_SUB_WIDTH_2: u32 = 0;
const CS_SUB_WIDTH_4: u32 = 1;
const CS_SUB_HEIGHT_1: u32 = 3 << 8;
const CS_SUB_HEIGHT_2: u32 = 0;

/// Downstream pixel types.
///
/// The host has no planar type wider than 8 bits per sample; deeper upstream formats land on
/// the 8-bit type of the same chroma layout and are widened or stacked by the session.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PixelType {
    Unknown,
    Y8,
    I420,
    YV16,
    YV24,
    YV411,
    BGR32,
    YUY2,
}

impl PixelType {
    /// Returns the raw colorspace constant understood by the host.
    pub const fn raw(self) -> u32 {
        match self {
            PixelType::Unknown => 0,
            PixelType::Y8 => CS_PLANAR | CS_INTERLEAVED | CS_YUV,
            PixelType::I420 => {
                CS_PLANAR | CS_YUV | CS_UPLANE_FIRST | CS_SUB_HEIGHT_2 | CS_SUB_WIDTH_2
            }
            PixelType::YV16 => {
                CS_PLANAR | CS_YUV | CS_VPLANE_FIRST | CS_SUB_HEIGHT_1 | CS_SUB_WIDTH_2
            }
            PixelType::YV24 => {
                CS_PLANAR | CS_YUV | CS_VPLANE_FIRST | CS_SUB_HEIGHT_1 | CS_SUB_WIDTH_1
            }
            PixelType::YV411 => {
                CS_PLANAR | CS_YUV | CS_VPLANE_FIRST | CS_SUB_HEIGHT_1 | CS_SUB_WIDTH_4
            }
            PixelType::BGR32 => 1 << 1 | CS_BGR | CS_INTERLEAVED,
            PixelType::YUY2 => 1 << 2 | CS_YUV | CS_INTERLEAVED,
        }
    }

    /// Whether samples are stored in separate planes.
    ///
    /// `Y8` counts as planar even though the host also flags it as interleaved.
    #[inline]
    pub fn is_planar(self) -> bool {
        self.raw() & CS_PLANAR != 0
    }

    /// Gets the number of planes of this pixel type.
    #[inline]
    pub fn plane_count(self) -> usize {
        match self {
            PixelType::Unknown => 0,
            PixelType::Y8 | PixelType::BGR32 | PixelType::YUY2 => 1,
            PixelType::I420 | PixelType::YV16 | PixelType::YV24 | PixelType::YV411 => 3,
        }
    }

    /// Bytes one pixel takes in the first plane.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::BGR32 => 4,
            PixelType::YUY2 => 2,
            PixelType::Unknown => 0,
            _ => 1,
        }
    }

    /// log2 horizontal subsampling of the chroma planes.
    #[inline]
    pub fn sub_sampling_w(self) -> u8 {
        match self {
            PixelType::I420 | PixelType::YV16 => 1,
            PixelType::YV411 => 2,
            _ => 0,
        }
    }

    /// log2 vertical subsampling of the chroma planes.
    #[inline]
    pub fn sub_sampling_h(self) -> u8 {
        match self {
            PixelType::I420 => 1,
            _ => 0,
        }
    }
}

impl Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}",
            match *self {
                PixelType::Unknown => "Unknown",
                PixelType::Y8 => "Y8",
                PixelType::I420 => "I420",
                PixelType::YV16 => "YV16",
                PixelType::YV24 => "YV24",
                PixelType::YV411 => "YV411",
                PixelType::BGR32 => "BGR32",
                PixelType::YUY2 => "YUY2",
            }
        )
    }
}

/// Upstream presets and the downstream type each of them lands on.
///
/// Keys are unique, so looking them up in a map gives the same answer as scanning the list.
pub const FORMAT_TABLE: &[(PresetFormat, PixelType)] = &[
    (PresetFormat::Gray8, PixelType::Y8),
    (PresetFormat::Gray16, PixelType::Y8),
    (PresetFormat::YUV420P8, PixelType::I420),
    (PresetFormat::YUV420P9, PixelType::I420),
    (PresetFormat::YUV420P10, PixelType::I420),
    (PresetFormat::YUV420P16, PixelType::I420),
    (PresetFormat::YUV422P8, PixelType::YV16),
    (PresetFormat::YUV422P9, PixelType::YV16),
    (PresetFormat::YUV422P10, PixelType::YV16),
    (PresetFormat::YUV422P16, PixelType::YV16),
    (PresetFormat::YUV444P8, PixelType::YV24),
    (PresetFormat::YUV444P9, PixelType::YV24),
    (PresetFormat::YUV444P10, PixelType::YV24),
    (PresetFormat::YUV444P16, PixelType::YV24),
    (PresetFormat::YUV411P8, PixelType::YV411),
    (PresetFormat::CompatBGR32, PixelType::BGR32),
    (PresetFormat::CompatYUY2, PixelType::YUY2),
];

static FORMAT_MAP: Lazy<HashMap<i32, PixelType>> = Lazy::new(|| {
    FORMAT_TABLE
        .iter()
        .map(|&(upstream, downstream)| (i32::from(upstream), downstream))
        .collect()
});

/// Maps an upstream format identifier onto the downstream pixel type.
///
/// Never fails: identifiers missing from the table map to `PixelType::Unknown`.
#[inline]
pub fn map_format(upstream_id: i32) -> PixelType {
    FORMAT_MAP
        .get(&upstream_id)
        .copied()
        .unwrap_or(PixelType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_entries_map_as_listed() {
        for &(upstream, downstream) in FORMAT_TABLE {
            assert_eq!(map_format(upstream.id()), downstream, "{:?}", upstream);
        }
    }

    #[test]
    fn table_keys_are_unique() {
        assert_eq!(FORMAT_MAP.len(), FORMAT_TABLE.len());
    }

    #[test]
    fn unlisted_formats_are_unknown() {
        for id in [
            0,
            -1,
            i32::MAX,
            PresetFormat::RGB24.id(),
            PresetFormat::YUV410P8.id(),
            PresetFormat::YUV440P8.id(),
            // YUV444PH, YUV444PS
            3_000_025,
            3_000_026,
        ] {
            assert_eq!(map_format(id), PixelType::Unknown);
        }
    }

    #[test]
    fn preset_ids() {
        assert_eq!(PresetFormat::Gray8.id(), 1_000_010);
        assert_eq!(PresetFormat::YUV420P10.id(), 3_000_017);
        assert_eq!(PresetFormat::CompatYUY2.id(), 9_000_011);
        assert_eq!(i32::from(PresetFormat::RGB24), 2_000_010);
    }

    #[test]
    fn pixel_type_layout() {
        assert!(PixelType::Y8.is_planar());
        assert!(PixelType::YV411.is_planar());
        assert!(!PixelType::BGR32.is_planar());
        assert!(!PixelType::YUY2.is_planar());
        assert!(!PixelType::Unknown.is_planar());

        assert_eq!(PixelType::I420.plane_count(), 3);
        assert_eq!(PixelType::Y8.plane_count(), 1);
        assert_eq!(PixelType::I420.raw(), 0xA000_0010);
    }
}
