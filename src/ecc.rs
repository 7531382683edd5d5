//! Error correction for QR symbols.
//!
//! Holds the per-version block layout tables from the QR Code Model 2 standard and the
//! Reed-Solomon generator used to compute the error correction codewords of each block.

use crate::qrcode::Version;

/// Error correction level of a QR symbol.
///
/// Higher levels survive more damage to the printed symbol but leave fewer codewords for the
/// payload, so the same payload needs a larger version.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Row of this level in the block layout tables.
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The 2-bit value stored in the format information area.
    pub(crate) fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

impl core::fmt::Display for QrCodeEcc {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let name = match self {
            QrCodeEcc::Low => "low",
            QrCodeEcc::Medium => "medium",
            QrCodeEcc::Quartile => "quartile",
            QrCodeEcc::High => "high",
        };
        f.write_str(name)
    }
}

/// Number of modules available for data and error correction codewords, including remainder
/// bits. Ranges from 208 (version 1) to 29648 (version 40).
pub(crate) fn raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result: usize = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign: usize = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

/// Number of 8-bit data codewords (payload plus padding, excluding error correction) that a
/// symbol of this version and level holds.
pub(crate) fn data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    let (numblocks, blockecclen) = block_layout(ver, ecl);
    raw_data_modules(ver) / 8 - numblocks * blockecclen
}

/// Returns `(number of blocks, ecc codewords per block)`.
pub(crate) fn block_layout(ver: Version, ecl: QrCodeEcc) -> (usize, usize) {
    (
        table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl),
        table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl),
    )
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

// Index 0 is padding so that the table can be indexed by version number.
static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    // Low
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28,
        28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    // Medium
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26,
        26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ],
    // Quartile
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30,
        28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    // High
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28,
        30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    // Low
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8,
        8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ],
    // Medium
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16,
        17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ],
    // Quartile
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20,
        23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ],
    // High
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25,
        25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ],
];

/// Reed-Solomon generator over GF(2^8/0x11D) for one block's error correction codewords.
pub(crate) struct ReedSolomonGenerator {
    /// Coefficients of the divisor polynomial, highest to lowest power, excluding the leading
    /// term which is always 1.
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    pub(crate) fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree - 1];
        divisor.push(1);

        // Multiply (x - r^0)(x - r^1)...(x - r^{degree-1}), dropping the leading term.
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Self::multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Self::multiply(root, 0x02);
        }
        Self { divisor }
    }

    /// Remainder of `data` (as a polynomial) divided by the generator polynomial.
    pub(crate) fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        for &b in data {
            let factor: u8 = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (x, &y) in result.iter_mut().zip(&self.divisor) {
                *x ^= Self::multiply(y, factor);
            }
        }
        result
    }

    /// Russian peasant multiplication in GF(2^8).
    fn multiply(x: u8, y: u8) -> u8 {
        let mut z: u8 = 0;
        for i in (0..8).rev() {
            z = (z << 1) ^ ((z >> 7) * 0x1d);
            z ^= ((y >> i) & 1) * x;
        }
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_data_modules_bounds() {
        assert_eq!(raw_data_modules(Version::MIN), 208);
        assert_eq!(raw_data_modules(Version::MAX), 29648);
    }

    #[test]
    fn test_data_codewords_at_high() {
        assert_eq!(data_codewords(Version::new(1), QrCodeEcc::High), 9);
        assert_eq!(data_codewords(Version::new(3), QrCodeEcc::High), 26);
        assert_eq!(data_codewords(Version::MAX, QrCodeEcc::High), 1276);
        assert_eq!(data_codewords(Version::MAX, QrCodeEcc::Low), 2956);
    }

    #[test]
    fn test_higher_level_leaves_less_room() {
        for v in 1..=40 {
            let ver = Version::new(v);
            let low = data_codewords(ver, QrCodeEcc::Low);
            let high = data_codewords(ver, QrCodeEcc::High);
            assert!(high < low, "version {v}");
        }
    }

    #[test]
    fn test_remainder_of_zero_data_is_zero() {
        let rs = ReedSolomonGenerator::new(10);
        assert_eq!(rs.compute_remainder(&[0u8; 16]), vec![0u8; 10]);
    }

    #[test]
    fn test_gf_multiply() {
        assert_eq!(ReedSolomonGenerator::multiply(0, 0x53), 0);
        assert_eq!(ReedSolomonGenerator::multiply(1, 0x53), 0x53);
        // 0x80 * 2 overflows and reduces by 0x11D.
        assert_eq!(ReedSolomonGenerator::multiply(0x80, 0x02), 0x1d);
    }

    #[test]
    fn test_format_bits_are_distinct() {
        let levels = [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High];
        let mut bits: Vec<u8> = levels
            .iter()
            .map(|e| e.format_bits())
            .collect();
        bits.sort_unstable();
        assert_eq!(bits, vec![0, 1, 2, 3]);
    }
}
