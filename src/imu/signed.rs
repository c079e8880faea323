//! # Signed Value Normalizer
//!
//! The accelerometer and gyroscope channels are stored as the raw unsigned
//! register value. These helpers decode them as two's-complement integers.

/// Decode `value` as a two's-complement integer `bits` wide
///
/// With `bits == None` the value is returned unchanged (bit pattern
/// reinterpreted as `i64`). Otherwise the low `bits` bits are kept and sign
/// extended, i.e. `masked - 2^bits` when bit `bits - 1` is set. Widths above
/// 64 are treated as 64; a zero width yields 0.
///
/// # Examples
///
/// ```
/// use gps_imu_monitor::imu::signed::to_signed;
///
/// assert_eq!(to_signed(0xFFFF, Some(16)), -1);
/// assert_eq!(to_signed(0x7FFF, Some(16)), 32767);
/// assert_eq!(to_signed(0x1_8000, Some(16)), -32768);
/// assert_eq!(to_signed(0xFFFF, None), 65535);
/// ```
pub fn to_signed(value: u64, bits: Option<u8>) -> i64 {
    let Some(bits) = bits else {
        return value as i64;
    };

    let width = u32::from(bits.min(64));
    if width == 0 {
        return 0;
    }

    // Shift the sign bit to bit 63, then an arithmetic shift back sign-extends.
    let shift = 64 - width;
    ((value << shift) as i64) >> shift
}

/// Decode a record value as delivered by the store
///
/// The store hands raw register values over as non-negative integral numbers.
/// Anything else (fractional, negative, non-finite, out of `u64` range) cannot
/// be a register magnitude and yields `None` when a width is given. Without a
/// width the value passes through unchanged.
pub fn normalize(value: f64, bits: Option<u8>) -> Option<f64> {
    if bits.is_none() {
        return Some(value);
    }

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
        return None;
    }

    Some(to_signed(value as u64, bits) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two's-complement encode `value` into `bits` bits
    fn encode(value: i64, bits: u32) -> u64 {
        if bits == 64 {
            value as u64
        } else {
            (value as u64) & ((1u64 << bits) - 1)
        }
    }

    #[test]
    fn test_round_trip_all_widths() {
        for bits in 1u32..=64 {
            let min = if bits == 64 { i64::MIN } else { -(1i64 << (bits - 1)) };
            let max = if bits == 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };

            for value in [min, max, -1, 0, 1, min / 2, max / 2] {
                if value < min || value > max {
                    continue;
                }
                let encoded = encode(value, bits);
                assert_eq!(
                    to_signed(encoded, Some(bits as u8)),
                    value,
                    "bits={} value={} encoded={:#x}",
                    bits,
                    value,
                    encoded
                );
            }
        }
    }

    #[test]
    fn test_high_bits_are_masked() {
        assert_eq!(to_signed(0xABCD_0001, Some(16)), 1);
        assert_eq!(to_signed(0xFFFF_FFFF_FFFF_FF80, Some(8)), -128);
    }

    #[test]
    fn test_no_width_passes_through() {
        assert_eq!(to_signed(12345, None), 12345);
        assert_eq!(to_signed(u64::MAX, None), -1);
    }

    #[test]
    fn test_one_bit_width() {
        assert_eq!(to_signed(0, Some(1)), 0);
        assert_eq!(to_signed(1, Some(1)), -1);
    }

    #[test]
    fn test_degenerate_widths() {
        assert_eq!(to_signed(0xFF, Some(0)), 0);
        assert_eq!(to_signed(u64::MAX, Some(200)), -1);
    }

    #[test]
    fn test_normalize_raw_register_values() {
        assert_eq!(normalize(65535.0, Some(16)), Some(-1.0));
        assert_eq!(normalize(32768.0, Some(16)), Some(-32768.0));
        assert_eq!(normalize(100.0, Some(16)), Some(100.0));
    }

    #[test]
    fn test_normalize_rejects_non_register_values() {
        assert_eq!(normalize(1.5, Some(16)), None);
        assert_eq!(normalize(-3.0, Some(16)), None);
        assert_eq!(normalize(f64::NAN, Some(16)), None);
        assert_eq!(normalize(f64::INFINITY, Some(16)), None);
    }

    #[test]
    fn test_normalize_without_width_is_identity() {
        assert_eq!(normalize(0.7071, None), Some(0.7071));
        assert_eq!(normalize(-0.5, None), Some(-0.5));
    }
}
