//! BCD temperature codec.
//!
//! Temperatures travel as two bytes of binary-coded decimal with one tenth
//! of a degree resolution:
//!
//! - Byte 0, bit 7: sign (set = negative)
//! - Byte 0, bits 4-6: hundreds digit
//! - Byte 0, bits 0-3: tens digit
//! - Byte 1, bits 4-7: ones digit
//! - Byte 1, bits 0-3: tenths digit
//!
//! `FF FF` marks an absent probe or reading.
//!
//! The hundreds nibble shares its top bit with the sign, so only hundreds
//! digits 0-7 survive a round trip. A hundreds digit of 8 or 9 is still
//! written as-is and reads back as a negative value.

/// Encoded form of an absent temperature.
pub const ABSENT_TEMPERATURE: [u8; 2] = [0xFF, 0xFF];

/// Sign bit in the first byte.
const SIGN_BIT: u8 = 0x80;

/// Decode a 2-byte BCD temperature.
///
/// Returns `None` for the absent marker.
///
/// # Example
///
/// ```
/// use tp90x::protocol::decode_temperature;
///
/// assert_eq!(decode_temperature([0x02, 0x35]), Some(23.5));
/// assert_eq!(decode_temperature([0x80, 0x52]), Some(-5.2));
/// assert_eq!(decode_temperature([0xFF, 0xFF]), None);
/// ```
pub fn decode_temperature(raw: [u8; 2]) -> Option<f64> {
    if raw == ABSENT_TEMPERATURE {
        return None;
    }

    let negative = raw[0] & SIGN_BIT != 0;
    let high = raw[0] & !SIGN_BIT;

    let hundreds = u32::from(high >> 4);
    let tens = u32::from(high & 0x0F);
    let ones = u32::from(raw[1] >> 4);
    let tenths = u32::from(raw[1] & 0x0F);

    let value = f64::from(hundreds * 1000 + tens * 100 + ones * 10 + tenths) / 10.0;
    Some(if negative { -value } else { value })
}

/// Decode the BCD temperature starting at `offset` in `data`.
///
/// Callers check the payload length first.
pub(crate) fn decode_temperature_at(data: &[u8], offset: usize) -> Option<f64> {
    decode_temperature([data[offset], data[offset + 1]])
}

/// Encode a temperature as 2-byte BCD.
///
/// The magnitude is rounded half-up to the nearest tenth. Each decimal digit
/// is taken modulo 10, so magnitudes above 999.9 wrap digit by digit instead
/// of saturating.
///
/// # Example
///
/// ```
/// use tp90x::protocol::encode_temperature;
///
/// assert_eq!(encode_temperature(23.5), [0x02, 0x35]);
/// assert_eq!(encode_temperature(-5.2), [0x80, 0x52]);
/// assert_eq!(encode_temperature(74.04), [0x07, 0x40]);
/// ```
pub fn encode_temperature(value: f64) -> [u8; 2] {
    let negative = value < 0.0;
    let tenths_total = (value.abs() * 10.0 + 0.5) as u64;

    let tenths = (tenths_total % 10) as u8;
    let whole = tenths_total / 10;
    let ones = (whole % 10) as u8;
    let tens = ((whole / 10) % 10) as u8;
    let hundreds = ((whole / 100) % 10) as u8;

    let mut high = (hundreds << 4) | tens;
    if negative {
        high |= SIGN_BIT;
    }

    [high, (ones << 4) | tenths]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_absent() {
        assert_eq!(decode_temperature(ABSENT_TEMPERATURE), None);
    }

    #[test]
    fn test_decode_digits() {
        assert_eq!(decode_temperature([0x00, 0x00]), Some(0.0));
        assert_eq!(decode_temperature([0x79, 0x99]), Some(799.9));
        assert_eq!(decode_temperature([0x12, 0x34]), Some(123.4));
        assert_eq!(decode_temperature([0x81, 0x00]), Some(-10.0));
    }

    #[test]
    fn test_encode_rounds_half_up() {
        assert_eq!(encode_temperature(0.05), [0x00, 0x01]);
        assert_eq!(encode_temperature(0.04), [0x00, 0x00]);
        assert_eq!(encode_temperature(99.96), [0x10, 0x00]);
    }

    #[test]
    fn test_encode_negative() {
        assert_eq!(encode_temperature(-40.0), [0x84, 0x00]);
        assert_eq!(encode_temperature(-999.9), [0x99, 0x99]);
    }

    #[test]
    fn test_hundreds_above_seven_collide_with_sign() {
        assert_eq!(encode_temperature(850.0), [0x85, 0x00]);
        assert_eq!(decode_temperature([0x85, 0x00]), Some(-50.0));
    }

    #[test]
    fn test_encode_out_of_range_wraps() {
        // 1234.5 keeps only the low three integer digits
        assert_eq!(encode_temperature(1234.5), [0x23, 0x45]);
        assert_eq!(decode_temperature(encode_temperature(1000.0)), Some(0.0));
    }

    proptest! {
        #[test]
        fn prop_round_trip(tenths in -7999i32..=7999) {
            let value = f64::from(tenths) / 10.0;
            prop_assert_eq!(decode_temperature(encode_temperature(value)), Some(value));
        }
    }
}
