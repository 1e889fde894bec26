//! Row geometry and naming for decoded JPEG output.

use turbojpeg::Subsamp;

/// Conventional J:a:b name of a chroma subsampling level.
pub fn subsamp_name(subsamp: Subsamp) -> &'static str {
    match subsamp {
        Subsamp::None => "4:4:4",
        Subsamp::Sub2x1 => "4:2:2",
        Subsamp::Sub2x2 => "4:2:0",
        Subsamp::Gray => "gray",
        Subsamp::Sub1x2 => "4:4:0",
        Subsamp::Sub4x1 => "4:1:1",
        Subsamp::Sub1x4 => "4:4:1",
        _ => "unknown",
    }
}

/// Rounds `value` up to the next multiple of 4.
pub fn pad4(value: usize) -> usize {
    (value + 3) & !3
}

/// Bytes per row for `width` pixels of `pixel_size` bytes, padded to 4 bytes.
pub fn padded_pitch(width: usize, pixel_size: usize) -> usize {
    pad4(width * pixel_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsamp_names() {
        assert_eq!(subsamp_name(Subsamp::Sub2x2), "4:2:0");
        assert_eq!(subsamp_name(Subsamp::Sub1x4), "4:4:1");
        assert_eq!(subsamp_name(Subsamp::Unknown), "unknown");
    }

    #[test]
    fn test_pad4() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 4);
        assert_eq!(pad4(4), 4);
        assert_eq!(pad4(13), 16);
    }

    #[test]
    fn test_padded_pitch() {
        assert_eq!(padded_pitch(5, 3), 16);
        assert_eq!(padded_pitch(640, 3), 1920);
    }
}
