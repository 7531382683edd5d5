//! Data segments of a QR symbol.
//!
//! A payload is split into segments, each encoded in the most compact mode its characters
//! allow. Text payloads in this crate always become a single segment: numeric if every
//! character is a digit, alphanumeric if every character is in [`ALPHANUMERIC_CHARSET`], and
//! byte mode over the UTF-8 bytes otherwise.

use crate::qrcode::Version;

/// Characters encodable in alphanumeric mode, in code value order.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Encoding mode of a [`QrSegment`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl QrSegmentMode {
    /// The 4-bit mode indicator.
    fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
        }
    }

    /// Width of the character count field, which grows with the version.
    fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
        })[usize::from((ver.value() + 7) / 17)]
    }
}

/// A growable sequence of bits, most significant bit first.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct BitBuffer(pub Vec<bool>);

impl BitBuffer {
    /// Appends the low `len` bits of `val`, high bit first.
    ///
    /// # Panics
    ///
    /// Panics if `len > 31` or `val` has bits set above `len`.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0, "Value out of range");
        self.0.extend((0..len).rev().map(|i| ((val >> i) & 1) != 0));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Packs the bits into bytes, zero-filling the last partial byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = vec![0u8; self.0.len().div_ceil(8)];
        for (i, &bit) in self.0.iter().enumerate() {
            result[i >> 3] |= u8::from(bit) << (7 - (i & 7));
        }
        result
    }
}

/// A segment of encoded payload data.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: Vec<bool>,
}

impl QrSegment {
    /// Creates a byte-mode segment for arbitrary binary data.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(data.len() * 8));
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        QrSegment::new(QrSegmentMode::Byte, data.len(), bb.0)
    }

    /// Creates a numeric-mode segment for a string of decimal digits.
    ///
    /// # Panics
    ///
    /// Panics if `text` contains non-digit characters.
    pub fn make_numeric(text: &str) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 3 + (text.len() + 2) / 3));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            assert!(b.is_ascii_digit(), "String contains non-numeric characters");
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 or 2 leftover digits take 4 or 7 bits
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        QrSegment::new(QrSegmentMode::Numeric, text.len(), bb.0)
    }

    /// Creates an alphanumeric-mode segment.
    ///
    /// # Panics
    ///
    /// Panics if `text` contains a character outside [`ALPHANUMERIC_CHARSET`].
    pub fn make_alphanumeric(text: &str) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 5 + (text.len() + 1) / 2));
        let mut accumdata: u32 = 0;
        let mut accumcount: u32 = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET
                .find(c)
                .expect("String contains unencodable characters in alphanumeric mode");
            accumdata = accumdata * 45 + i as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        QrSegment::new(QrSegmentMode::Alphanumeric, text.len(), bb.0)
    }

    /// Picks the most compact single mode for `text`. The empty string yields no segments.
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            Vec::new()
        } else if QrSegment::is_numeric(text) {
            vec![QrSegment::make_numeric(text)]
        } else if QrSegment::is_alphanumeric(text) {
            vec![QrSegment::make_alphanumeric(text)]
        } else {
            vec![QrSegment::make_bytes(text.as_bytes())]
        }
    }

    pub fn new(mode: QrSegmentMode, numchars: usize, data: Vec<bool>) -> Self {
        Self {
            mode,
            numchars,
            data,
        }
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Appends the mode indicator, character count and data bits to `bb`.
    ///
    /// The caller must have checked the segment against [`QrSegment::get_total_bits`] for
    /// `version`, which guarantees the count fits its field.
    pub(crate) fn write_to(&self, bb: &mut BitBuffer, version: Version) {
        bb.append_bits(self.mode.mode_bits(), 4);
        bb.append_bits(self.numchars as u32, self.mode.num_char_count_bits(version));
        bb.0.extend_from_slice(&self.data);
    }

    /// Number of bits needed to encode `segs` at `version`, or `None` if a segment's character
    /// count overflows its count field or the total overflows `usize`.
    pub(crate) fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if seg.numchars >= 1usize << ccbits {
                return None;
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(QrSegment::is_numeric("1234567890"));
        assert!(!QrSegment::is_numeric("1234abc"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(QrSegment::is_alphanumeric("HELLO WORLD"));
        assert!(!QrSegment::is_alphanumeric("Hello World"));
    }

    #[test]
    fn test_mode_selection() {
        assert!(QrSegment::make_segments("").is_empty());
        assert_eq!(QrSegment::make_segments("0123")[0].mode(), QrSegmentMode::Numeric);
        assert_eq!(
            QrSegment::make_segments("HTTPS://EXAMPLE.COM/")[0].mode(),
            QrSegmentMode::Alphanumeric
        );
        assert_eq!(
            QrSegment::make_segments("file:///tmp/message.html")[0].mode(),
            QrSegmentMode::Byte
        );
    }

    #[test]
    fn test_byte_segment_counts_utf8_bytes() {
        let seg = QrSegment::make_segments("héllo").remove(0);
        assert_eq!(seg.num_chars(), 6);
        assert_eq!(seg.data().len(), 48);
    }

    #[test]
    fn test_numeric_packing() {
        // "01234567" -> 012 (10 bits), 345 (10 bits), 67 (7 bits)
        let seg = QrSegment::make_numeric("01234567");
        assert_eq!(seg.data().len(), 27);
        let mut expected = BitBuffer::default();
        expected.append_bits(12, 10);
        expected.append_bits(345, 10);
        expected.append_bits(67, 7);
        assert_eq!(seg.data(), &expected.0[..]);
    }

    #[test]
    fn test_alphanumeric_packing() {
        // "AC-42": (10*45+12), (41*45+4), 2 in 6 bits
        let seg = QrSegment::make_alphanumeric("AC-42");
        let mut expected = BitBuffer::default();
        expected.append_bits(10 * 45 + 12, 11);
        expected.append_bits(41 * 45 + 4, 11);
        expected.append_bits(2, 6);
        assert_eq!(seg.data(), &expected.0[..]);
    }

    #[test]
    fn test_bit_buffer_to_bytes() {
        let mut bb = BitBuffer::default();
        assert!(bb.is_empty());
        assert!(bb.to_bytes().is_empty());
        bb.append_bits(0b1010, 4);
        assert!(!bb.is_empty());
        bb.append_bits(0xff, 8);
        assert_eq!(bb.len(), 12);
        assert_eq!(bb.to_bytes(), vec![0b1010_1111, 0b1111_0000]);
    }

    #[test]
    fn test_total_bits_rejects_count_overflow() {
        let seg = QrSegment::make_bytes(&[0u8; 256]);
        // Versions 1-9 have an 8-bit count field for byte mode.
        assert_eq!(QrSegment::get_total_bits(&[seg.clone()], Version::new(9)), None);
        assert_eq!(
            QrSegment::get_total_bits(&[seg], Version::new(10)),
            Some(4 + 16 + 256 * 8)
        );
    }
}
