//! Copying packed 1bpp rows at arbitrary pixel offsets.
//!
//! Rows are stored most significant bit first and padded to whole bytes. Every copy
//! ORs into the destination and never writes pixels past `src_width`, so the padding
//! of a re-rendered row is always clear.

/// Mask of the pixels used in the last byte of a `width` pixel row.
pub fn last_byte_mask(width: usize) -> u8 {
    match width % 8 {
        0 => 0xFF,
        used => 0xFF << (8 - used),
    }
}

/// Returns `true` if no bit past `width` is set in `row`.
pub fn padding_is_clear(row: &[u8], width: usize) -> bool {
    let used = (width + 7) / 8;

    match row.get(..used) {
        Some(pixels) => {
            pixels.last().map_or(true, |&b| b & !last_byte_mask(width) == 0)
                && row[used..].iter().all(|&b| b == 0)
        }
        None => true,
    }
}

/// Copies `src_width` pixels of `src` into `dst` starting at pixel `dst_bit_offset`.
///
/// The source is walked one byte at a time: each byte lands shifted right by
/// `dst_bit_offset % 8` and the bits pushed out of it are carried into the next
/// destination byte. With a byte aligned offset this produces exactly what
/// [`copy_aligned`] does.
pub fn shift_copy_bits(src: &[u8], src_width: usize, dst: &mut [u8], dst_bit_offset: usize) {
    let used = (src_width + 7) / 8;
    let base = dst_bit_offset / 8;
    let shift = dst_bit_offset % 8;

    for (i, &byte) in src[..used].iter().enumerate() {
        let byte = if i + 1 == used {
            byte & last_byte_mask(src_width)
        } else {
            byte
        };

        dst[base + i] |= byte >> shift;

        if shift != 0 {
            let carry = byte << (8 - shift);
            if carry != 0 {
                dst[base + i + 1] |= carry;
            }
        }
    }
}

/// Copies `src_width` pixels of `src` into `dst` starting at byte `dst_byte_offset`.
pub fn copy_aligned(src: &[u8], src_width: usize, dst: &mut [u8], dst_byte_offset: usize) {
    let used = (src_width + 7) / 8;
    if used == 0 {
        return;
    }

    let dst = &mut dst[dst_byte_offset..dst_byte_offset + used];
    for (d, &s) in dst.iter_mut().zip(&src[..used - 1]) {
        *d |= s;
    }
    dst[used - 1] |= src[used - 1] & last_byte_mask(src_width);
}

/// Copies a row to pixel offset `dst_xoff`, byte-wise when the offset allows it.
pub fn blit_row(src: &[u8], src_width: usize, dst: &mut [u8], dst_xoff: usize) {
    if dst_xoff % 8 == 0 {
        copy_aligned(src, src_width, dst, dst_xoff / 8);
    } else {
        shift_copy_bits(src, src_width, dst, dst_xoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pixel by pixel reference implementation.
    fn reference(src: &[u8], src_width: usize, dst: &mut [u8], offset: usize) {
        for x in 0..src_width {
            if src[x / 8] & (0x80 >> (x % 8)) != 0 {
                let bit = x + offset;
                dst[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
    }

    /// Deterministic noise, including bits in the padding.
    fn pattern(seed: u32, len: usize) -> Vec<u8> {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }

    #[test]
    fn shift_matches_reference_for_every_offset() {
        for offset in 0..8 {
            for width in 1..=24 {
                for seed in 0..16 {
                    let src = pattern(seed, (width + 7) / 8);
                    let len = (width + offset + 7) / 8;

                    let mut expected = vec![0; len];
                    reference(&src, width, &mut expected, offset);

                    let mut actual = vec![0; len];
                    shift_copy_bits(&src, width, &mut actual, offset);

                    assert_eq!(actual, expected, "offset {offset}, width {width}, seed {seed}");
                }
            }
        }
    }

    #[test]
    fn shift_handles_offsets_past_the_first_byte() {
        for offset in [8, 9, 13, 16, 23] {
            let src = [0b1011_0111, 0b1100_0000];
            let mut expected = vec![0; 5];
            reference(&src, 10, &mut expected, offset);

            let mut actual = vec![0; 5];
            shift_copy_bits(&src, 10, &mut actual, offset);

            assert_eq!(actual, expected, "offset {offset}");
        }
    }

    #[test]
    fn unshifted_copy_is_pixel_identical_to_aligned_copy() {
        for width in 1..=24 {
            for seed in 0..16 {
                let src = pattern(seed, (width + 7) / 8);
                let len = (width + 7) / 8 + 1;

                let mut shifted = vec![0; len];
                shift_copy_bits(&src, width, &mut shifted, 0);

                let mut aligned = vec![0; len];
                copy_aligned(&src, width, &mut aligned, 0);

                assert_eq!(shifted, aligned, "width {width}, seed {seed}");
            }
        }
    }

    #[test]
    fn blit_keeps_existing_pixels() {
        let mut dst = [0b1000_0000, 0b0000_0001];
        blit_row(&[0xFF], 4, &mut dst, 2);

        assert_eq!(dst, [0b1011_1100, 0b0000_0001]);
    }

    #[test_case(&[0xF0], 4 => true; "clear")]
    #[test_case(&[0xF8], 4 => false; "bit past width")]
    #[test_case(&[0xFF, 0x80], 9 => true; "second byte")]
    #[test_case(&[0xFF, 0xC0], 9 => false; "second byte dirty")]
    #[test_case(&[0xFF], 8 => true; "full byte")]
    fn padding_is_clear(row: &[u8], width: usize) -> bool {
        super::padding_is_clear(row, width)
    }

    #[test_case(1 => 0x80)]
    #[test_case(6 => 0xFC)]
    #[test_case(8 => 0xFF)]
    #[test_case(9 => 0x80)]
    fn last_byte_mask(width: usize) -> u8 {
        super::last_byte_mask(width)
    }
}
