//! Scalar encodings used inside command payloads.
//!
//! Every multi-byte element on the wire is little-endian.

/// One fixed16 unit is `1 / FIXED16_SCALE`; the format has 11 fractional bits.
pub const FIXED16_SCALE: f64 = 2048.0;

/// Full-scale value of an integer lens position (iris value, focus position).
/// Integer positions are divided by this before being sent as fixed16.
pub const LENS_POSITION_RANGE: f64 = 65435.0;

/// Aperture value the camera reports when no lens is attached.
pub const NO_LENS_APERTURE: i16 = i16::MIN;

/// Converts a float into fixed16, truncating toward zero and saturating at the i16 range.
pub fn fixed_from_float(value: f64) -> i16 {
    // `as` saturates out-of-range floats and maps NaN to 0
    (value * FIXED16_SCALE) as i16
}

pub fn fixed_to_float(fixed: i16) -> f64 {
    fixed as f64 / FIXED16_SCALE
}

/// Fixed16 value as a whole percentage, e.g. 1024 -> 50.
pub fn fixed_to_percent(fixed: i16) -> i32 {
    fixed as i32 * 100 / FIXED16_SCALE as i32
}

/// Normalises an integer lens position into fixed16.
pub fn fixed_from_lens_position(position: i32) -> i16 {
    fixed_from_float(position as f64 / LENS_POSITION_RANGE)
}

/// Aperture number for an f-stop: `log2(f) * 2` in fixed16.
pub fn fstop_to_aperture(fstop: f64) -> i16 {
    fixed_from_float(fstop.log2() * 2.0)
}

pub fn aperture_to_fstop(aperture: i16) -> f64 {
    2f64.powf(fixed_to_float(aperture) / 2.0)
}

pub fn read_i8s(bytes: &[u8]) -> Vec<i8> {
    bytes.iter().map(|b| *b as i8).collect()
}

pub fn read_i16s(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

pub fn read_i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn write_i16s(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Strings arrive as raw UTF-8 without a terminator; trailing NULs are dropped.
pub fn read_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn bcd(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0f)
}

/// Length of a timecode characteristic notification.
pub const TIMECODE_NOTIFICATION_SIZE: usize = 12;

/// Renders a timecode notification as `HH:MM:SS:FF`.
///
/// The timecode sits in the last four bytes as BCD frames, seconds, minutes
/// and hours. Returns `None` for notifications of the wrong size.
pub fn timecode_from_notification(data: &[u8]) -> Option<String> {
    if data.len() != TIMECODE_NOTIFICATION_SIZE {
        return None;
    }
    let tc = &data[TIMECODE_NOTIFICATION_SIZE - 4..];
    // the top bits of the hours byte carry the drop frame flag
    Some(format!(
        "{:02}:{:02}:{:02}:{:02}",
        bcd(tc[3] & 0x3f),
        bcd(tc[2]),
        bcd(tc[1]),
        bcd(tc[0])
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_known_values() {
        assert_eq!(fixed_from_float(1.0), 2048);
        assert_eq!(fixed_from_float(0.5), 1024);
        assert_eq!(fixed_from_float(-1.0), -2048);
        assert_eq!(fixed_from_float(100.0), i16::MAX);
        assert_eq!(fixed_from_float(-100.0), i16::MIN);
        assert_eq!(fixed_to_percent(1024), 50);
        assert_eq!(fixed_to_percent(2048), 100);
    }

    #[test]
    fn iris_position_constant() {
        // 512 / 65435 * 2048 = 16.02
        assert_eq!(fixed_from_lens_position(512), 16);
        assert_eq!(fixed_from_lens_position(65435), 2048);
        assert_eq!(fixed_from_lens_position(0), 0);
    }

    #[test]
    fn aperture_numbers() {
        // f/2.0 and f/4.0 are exact in the lookup table the camera uses
        assert_eq!(fstop_to_aperture(2.0), 4096);
        assert_eq!(fstop_to_aperture(4.0), 8192);
        assert!((aperture_to_fstop(6084) - 2.8).abs() < 0.01);
    }

    #[test]
    fn little_endian_readers() {
        assert_eq!(read_i16s(&[0x88, 0x13, 0xf6, 0xff]), vec![5000, -10]);
        assert_eq!(read_i32s(&[0x20, 0x03, 0x00, 0x00]), vec![800]);
        assert_eq!(write_i16s(&[5600, 10]), vec![0xe0, 0x15, 0x0a, 0x00]);
        assert_eq!(read_string(b"65mm\0"), "65mm");
    }

    #[test]
    fn timecode() {
        let data = [0, 0, 0, 0, 0, 0, 0, 0, 0x24, 0x59, 0x07, 0x01];
        assert_eq!(
            timecode_from_notification(&data).as_deref(),
            Some("01:07:59:24")
        );
        assert_eq!(timecode_from_notification(&data[1..]), None);
    }

    proptest! {
        #[test]
        fn fixed_round_trip_within_one_unit(f in 0.0f64..=1.0) {
            let back = fixed_to_float(fixed_from_float(f));
            prop_assert!((back - f).abs() <= 1.0 / FIXED16_SCALE);
        }
    }
}
