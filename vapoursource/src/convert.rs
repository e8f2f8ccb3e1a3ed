//! Per-frame plane conversion.

use cfg_if::cfg_if;

use crate::api::SourceFrame;
use crate::host::{Host, HostFrame, PlaneMut};

/// Output bytes produced per chunk by the stacked split (one 16-byte vector).
pub const CHUNK: usize = 16;

/// How upstream planes are written into host planes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Strategy {
    /// Rows are copied as they are; deep samples end up side by side in a doubled width.
    Interleaved,
    /// Deep samples are split into a most-significant-byte image stacked over a
    /// least-significant-byte image.
    Stacked,
}

impl Strategy {
    /// Converts the first `plane_count` planes of `src` into `dst`.
    pub fn write_frame<H: Host, F: SourceFrame>(
        self,
        host: &H,
        src: &F,
        dst: &mut H::Frame,
        plane_count: usize,
    ) {
        match self {
            Strategy::Interleaved => write_interleaved_frame(host, src, dst, plane_count),
            Strategy::Stacked => write_stacked_frame(src, dst, plane_count),
        }
    }
}

/// Copies every plane row by row through the host's block copy.
///
/// Row size and height are taken from the destination; the source must have at least as much.
pub fn write_interleaved_frame<H: Host, F: SourceFrame>(
    host: &H,
    src: &F,
    dst: &mut H::Frame,
    plane_count: usize,
) {
    for p in 0..plane_count {
        let src = src.plane(p);
        let dst = dst.plane_mut(p);
        host.bit_blt(
            dst.data,
            dst.pitch,
            src.data,
            src.stride,
            dst.row_size,
            dst.height,
        );
    }
}

/// Splits every plane of 16-bit samples into high bytes on top and low bytes below.
///
/// Each destination plane is twice as tall as the source plane and as wide in bytes as the
/// source plane has samples.
pub fn write_stacked_frame<F: SourceFrame, D: HostFrame>(src: &F, dst: &mut D, plane_count: usize) {
    for p in 0..plane_count {
        let src = src.plane(p);
        let PlaneMut {
            data,
            pitch,
            row_size,
            height,
        } = dst.plane_mut(p);

        let height = height / 2;
        if height == 0 || row_size == 0 {
            continue;
        }
        let (upper, lower) = data.split_at_mut(pitch * height);

        for y in 0..height {
            let start = y * pitch;
            split_row(
                src.row(y, 2 * row_size),
                &mut upper[start..start + row_size],
                &mut lower[start..start + row_size],
            );
        }
    }
}

/// Copies `height` rows of `row_size` bytes from `src` into `dst`.
///
/// # Panics
/// Panics if either buffer is too short for the rows.
pub fn bit_blt(
    dst: &mut [u8],
    dst_pitch: usize,
    src: &[u8],
    src_pitch: usize,
    row_size: usize,
    height: usize,
) {
    if height == 0 || row_size == 0 {
        return;
    }

    if dst_pitch == row_size && src_pitch == row_size {
        let len = row_size * height;
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    for y in 0..height {
        let d = y * dst_pitch;
        let s = y * src_pitch;
        dst[d..d + row_size].copy_from_slice(&src[s..s + row_size]);
    }
}

/// Splits one row of little-endian 16-bit samples into its high and low bytes.
///
/// Whole chunks go through the vectorized path, the remainder through `split_row_scalar()`.
///
/// # Panics
/// Panics if `msb` and `lsb` differ in length or `src` holds fewer than `2 * msb.len()` bytes.
pub fn split_row(src: &[u8], msb: &mut [u8], lsb: &mut [u8]) {
    let width = msb.len();
    assert_eq!(width, lsb.len());
    assert!(src.len() >= 2 * width);

    let done = split_chunks(src, msb, lsb);
    split_row_scalar(
        &src[2 * done..2 * width],
        &mut msb[done..],
        &mut lsb[done..],
    );
}

/// Byte-at-a-time reference for `split_row()`.
pub fn split_row_scalar(src: &[u8], msb: &mut [u8], lsb: &mut [u8]) {
    for ((sample, hi), lo) in src.chunks_exact(2).zip(msb.iter_mut()).zip(lsb.iter_mut()) {
        *lo = sample[0];
        *hi = sample[1];
    }
}

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        /// Splits whole chunks with SSE2. Returns the number of output bytes written per half.
        fn split_chunks(src: &[u8], msb: &mut [u8], lsb: &mut [u8]) -> usize {
            use std::arch::x86_64::*;

            let chunks = msb.len() / CHUNK;
            debug_assert!(src.len() >= chunks * 2 * CHUNK && lsb.len() >= chunks * CHUNK);

            unsafe {
                let mask = _mm_set1_epi16(0x00FF);

                for i in 0..chunks {
                    let s = src.as_ptr().add(i * 2 * CHUNK);
                    let x0 = _mm_loadu_si128(s as *const __m128i);
                    let x1 = _mm_loadu_si128(s.add(CHUNK) as *const __m128i);

                    let lo = _mm_packus_epi16(_mm_and_si128(x0, mask), _mm_and_si128(x1, mask));
                    let hi = _mm_packus_epi16(_mm_srli_epi16(x0, 8), _mm_srli_epi16(x1, 8));

                    _mm_storeu_si128(msb.as_mut_ptr().add(i * CHUNK) as *mut __m128i, hi);
                    _mm_storeu_si128(lsb.as_mut_ptr().add(i * CHUNK) as *mut __m128i, lo);
                }
            }

            chunks * CHUNK
        }
    } else {
        /// Splits whole chunks in fixed-width blocks. Returns the number of output bytes written
        /// per half.
        fn split_chunks(src: &[u8], msb: &mut [u8], lsb: &mut [u8]) -> usize {
            let mut done = 0;
            for ((s, hi), lo) in src
                .chunks_exact(2 * CHUNK)
                .zip(msb.chunks_exact_mut(CHUNK))
                .zip(lsb.chunks_exact_mut(CHUNK))
            {
                for i in 0..CHUNK {
                    lo[i] = s[2 * i];
                    hi[i] = s[2 * i + 1];
                }
                done += CHUNK;
            }
            done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_split() {
        let src = [0x01, 0xA0, 0x02, 0xB0, 0x03, 0xC0];
        let mut msb = [0; 3];
        let mut lsb = [0; 3];
        split_row_scalar(&src, &mut msb, &mut lsb);
        assert_eq!(msb, [0xA0, 0xB0, 0xC0]);
        assert_eq!(lsb, [0x01, 0x02, 0x03]);
    }

    #[test]
    fn chunked_split_matches_scalar() {
        for width in [0, 1, 15, 16, 17, 31, 32, 33, 100] {
            let src = (0..2 * width).map(|x| (x * 7 + 3) as u8).collect::<Vec<_>>();

            let mut msb = vec![0; width];
            let mut lsb = vec![0; width];
            split_row(&src, &mut msb, &mut lsb);

            let mut expected_msb = vec![0; width];
            let mut expected_lsb = vec![0; width];
            split_row_scalar(&src, &mut expected_msb, &mut expected_lsb);

            assert_eq!(msb, expected_msb, "width {}", width);
            assert_eq!(lsb, expected_lsb, "width {}", width);
        }
    }

    #[test]
    fn split_ignores_trailing_source_bytes() {
        let src = [1, 2, 3, 4, 0xEE, 0xFF];
        let mut msb = [0; 2];
        let mut lsb = [0; 2];
        split_row(&src, &mut msb, &mut lsb);
        assert_eq!(msb, [2, 4]);
        assert_eq!(lsb, [1, 3]);
    }

    #[test]
    fn bit_blt_respects_pitches() {
        let src = [1, 2, 3, 9, 4, 5, 6, 9];
        let mut dst = [0; 10];
        bit_blt(&mut dst, 5, &src, 4, 3, 2);
        assert_eq!(dst, [1, 2, 3, 0, 0, 4, 5, 6, 0, 0]);
    }

    #[test]
    fn bit_blt_contiguous() {
        let src = [1, 2, 3, 4];
        let mut dst = [0; 4];
        bit_blt(&mut dst, 2, &src, 2, 2, 2);
        assert_eq!(dst, src);
    }
}
