#![forbid(unsafe_code)]
//! QR symbol construction.
//!
//! Builds QR Code Model 2 symbols (versions 1 to 40) from data segments: picks the smallest
//! version that fits, appends error correction, places the codewords and chooses the mask with
//! the lowest penalty score. A finished [`QrCode`] is an immutable square grid of modules.

use thiserror::Error;
use tracing::debug;

use crate::ecc::{self, QrCodeEcc, ReedSolomonGenerator};
use crate::segment::{BitBuffer, QrSegment};

/// A QR symbol, a square grid of dark and light modules.
///
/// # Example
///
/// ```rust
/// use qrnote::{QrCode, QrCodeEcc, Version};
///
/// let uri = "file:///tmp/message.html";
/// let qr = QrCode::encode_text(uri, QrCodeEcc::High, Version::MIN).unwrap();
/// assert_eq!(qr.version().value(), 3);
/// assert_eq!(qr.size(), 29);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    /// Width and height in modules, `version * 4 + 17`.
    size: i32,
    ecl: QrCodeEcc,
    mask: Mask,
    /// Row-major module colors, `true` is dark.
    modules: Vec<bool>,
    /// Marks function modules (finders, timing, format...) that masking must skip.
    /// Emptied once the symbol is finished.
    isfunction: Vec<bool>,
}

impl QrCode {
    /// Encodes `text` using the smallest version in `minversion..=40` that holds it at `ecl`.
    ///
    /// The error correction level is raised when that does not grow the version.
    pub fn encode_text(
        text: &str,
        ecl: QrCodeEcc,
        minversion: Version,
    ) -> Result<Self, DataTooLong> {
        let segs = QrSegment::make_segments(text);
        QrCode::encode_segments_advanced(&segs, ecl, minversion, Version::MAX, None, true)
    }

    /// Encodes arbitrary bytes in a single byte-mode segment.
    pub fn encode_binary(
        data: &[u8],
        ecl: QrCodeEcc,
        minversion: Version,
    ) -> Result<Self, DataTooLong> {
        let segs = [QrSegment::make_bytes(data)];
        QrCode::encode_segments_advanced(&segs, ecl, minversion, Version::MAX, None, true)
    }

    /// Encodes the given segments with full control over the version range, mask and level
    /// boosting. `mask` of `None` selects the mask with the lowest penalty.
    pub fn encode_segments_advanced(
        segs: &[QrSegment],
        mut ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, DataTooLong> {
        assert!(minversion <= maxversion, "Invalid value");

        // Find the minimal version number to use
        let mut version: Version = minversion;
        let datausedbits: usize = loop {
            let datacapacitybits: usize = ecc::data_codewords(version, ecl) * 8;
            match QrSegment::get_total_bits(segs, version) {
                Some(n) if n <= datacapacitybits => break n,
                used if version >= maxversion => {
                    return Err(match used {
                        None => DataTooLong::SegmentTooLong,
                        Some(n) => DataTooLong::DataOverCapacity(n, datacapacitybits),
                    });
                }
                _ => version = Version::new(version.value() + 1),
            }
        };

        for &newecl in &[QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            let fits = datausedbits <= ecc::data_codewords(version, newecl) * 8;
            if boostecl && newecl > ecl && fits {
                ecl = newecl;
            }
        }

        let datacapacitybits: usize = ecc::data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer(Vec::with_capacity(datacapacitybits));
        for seg in segs {
            seg.write_to(&mut bb, version);
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Terminator of up to four zero bits, then pad to a byte boundary
        let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.len());
        bb.append_bits(0, numzerobits as u8);
        let numzerobits: usize = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }

        let qr = QrCode::encode_codewords(version, ecl, &bb.to_bytes(), mask);
        debug!(
            version = qr.version.value(),
            ecl = %qr.ecl,
            mask = qr.mask.value(),
            used_bits = datausedbits,
            capacity_bits = datacapacitybits,
            "encoded qr symbol"
        );
        Ok(qr)
    }

    /// Builds the symbol from complete data codewords (payload plus padding).
    ///
    /// # Panics
    ///
    /// Panics if `datacodewords` is not exactly the data capacity of `version` at `ecl`.
    pub fn encode_codewords(
        version: Version,
        ecl: QrCodeEcc,
        datacodewords: &[u8],
        mask: Option<Mask>,
    ) -> Self {
        let size = i32::from(version.value()) * 4 + 17;
        let cells = (size * size) as usize;
        let mut result = Self {
            version,
            size,
            ecl,
            mask: Mask::new(0),
            modules: vec![false; cells],
            isfunction: vec![false; cells],
        };

        result.draw_function_patterns();
        let allcodewords: Vec<u8> = result.add_ecc_and_interleave(datacodewords);
        result.draw_codewords(&allcodewords);

        let mask = mask.unwrap_or_else(|| result.choose_mask());
        result.mask = mask;
        result.apply_mask(mask);
        result.draw_format_bits(mask);

        result.isfunction = Vec::new();
        result
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Returns the error correction level actually used, which may exceed the requested one.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the
    /// symbol, such as the quiet zone, are light.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        (0..self.size).contains(&x) && (0..self.size).contains(&y) && self.module(x, y)
    }

    fn module(&self, x: i32, y: i32) -> bool {
        self.modules[(y * self.size + x) as usize]
    }

    fn module_mut(&mut self, x: i32, y: i32) -> &mut bool {
        &mut self.modules[(y * self.size + x) as usize]
    }

    fn set_function_module(&mut self, x: i32, y: i32, isdark: bool) {
        *self.module_mut(x, y) = isdark;
        self.isfunction[(y * self.size + x) as usize] = true;
    }

    /*---- Function patterns ----*/

    fn draw_function_patterns(&mut self) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns skip the three corners taken by finders
        let alignpatpos: Vec<i32> = self.get_alignment_pattern_positions();
        let last = alignpatpos.len().saturating_sub(1);
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment_pattern(pos0, pos1);
                }
            }
        }

        // Placeholder so the format area is reserved before codewords are drawn
        self.draw_format_bits(Mask::new(0));
        self.draw_version();
    }

    fn draw_format_bits(&mut self, mask: Mask) {
        let bits: u32 = {
            let data = u32::from((self.ecl.format_bits() << 3) | mask.value());
            let mut rem: u32 = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };

        // Copy around the top-left finder
        for i in 0..6 {
            self.set_function_module(8, i, get_bit(bits, i));
        }
        self.set_function_module(8, 7, get_bit(bits, 6));
        self.set_function_module(8, 8, get_bit(bits, 7));
        self.set_function_module(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function_module(14 - i, 8, get_bit(bits, i));
        }

        // Copy split between the other two finders
        let size = self.size;
        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, get_bit(bits, i));
        }
        self.set_function_module(8, size - 8, true); // always dark
    }

    fn draw_version(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = {
            let mut rem: u32 = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
            }
            (ver << 12) | rem
        };
        for i in 0..18 {
            let bit = get_bit(bits, i);
            let a: i32 = self.size - 11 + i % 3;
            let b: i32 = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    /// 9x9 finder with separator centered at (x, y), clipped to the symbol.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4..=4 {
            for dx in -4..=4 {
                let xx = x + dx;
                let yy = y + dy;
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dist: i32 = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                self.set_function_module(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    /// Ascending center coordinates of the alignment patterns, used on both axes.
    fn get_alignment_pattern_positions(&self) -> Vec<i32> {
        let ver = i32::from(self.version.value());
        if ver == 1 {
            return Vec::new();
        }
        let numalign: i32 = ver / 7 + 2;
        let step: i32 = if ver == 32 {
            26
        } else {
            ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
        };
        let mut result: Vec<i32> = (0..numalign - 1).map(|i| self.size - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }

    /*---- Codewords ----*/

    /// Splits the data into blocks, appends each block's error correction codewords and
    /// interleaves the blocks.
    fn add_ecc_and_interleave(&self, data: &[u8]) -> Vec<u8> {
        let ver = self.version;
        let ecl = self.ecl;
        assert_eq!(data.len(), ecc::data_codewords(ver, ecl), "Illegal argument");

        let (numblocks, blockecclen) = ecc::block_layout(ver, ecl);
        let rawcodewords: usize = ecc::raw_data_modules(ver) / 8;
        let numshortblocks: usize = numblocks - rawcodewords % numblocks;
        let shortblocklen: usize = rawcodewords / numblocks;

        let rs = ReedSolomonGenerator::new(blockecclen);
        let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(numblocks);
        let mut rest: &[u8] = data;
        for i in 0..numblocks {
            let datlen: usize = shortblocklen - blockecclen + usize::from(i >= numshortblocks);
            let (dat, tail) = rest.split_at(datlen);
            rest = tail;
            let mut block: Vec<u8> = dat.to_vec();
            if i < numshortblocks {
                // Keeps every block the same length; skipped when interleaving.
                block.push(0);
            }
            block.extend(rs.compute_remainder(dat));
            blocks.push(block);
        }
        debug_assert!(rest.is_empty());

        let mut result: Vec<u8> = Vec::with_capacity(rawcodewords);
        for i in 0..=shortblocklen {
            for (j, block) in blocks.iter().enumerate() {
                if i != shortblocklen - blockecclen || j >= numshortblocks {
                    result.push(block[i]);
                }
            }
        }
        result
    }

    /// Places codewords in the zig-zag column pairs, skipping function modules.
    fn draw_codewords(&mut self, data: &[u8]) {
        assert_eq!(
            data.len(),
            ecc::raw_data_modules(self.version) / 8,
            "Illegal argument"
        );
        let size: i32 = self.size;
        let totalbits: usize = data.len() * 8;
        let mut i: usize = 0;
        let mut right: i32 = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward: bool = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = right - j;
                    let index = (y * size + x) as usize;
                    if !self.isfunction[index] && i < totalbits {
                        self.modules[index] = get_bit(u32::from(data[i >> 3]), 7 - (i & 7) as i32);
                        i += 1;
                    }
                    // Remainder bits stay light.
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, totalbits);
    }

    /*---- Masking ----*/

    fn choose_mask(&mut self) -> Mask {
        let mut best = Mask::new(0);
        let mut minpenalty = i32::MAX;
        for i in 0u8..8 {
            let candidate = Mask::new(i);
            self.apply_mask(candidate);
            self.draw_format_bits(candidate);
            let penalty: i32 = self.get_penalty_score();
            if penalty < minpenalty {
                best = candidate;
                minpenalty = penalty;
            }
            self.apply_mask(candidate); // XOR undoes it
        }
        best
    }

    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let index = (y * self.size + x) as usize;
                if self.isfunction[index] {
                    continue;
                }
                let invert: bool = match mask.value() {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => (x * y) % 2 + (x * y) % 3 == 0,
                    6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
                    7 => ((x + y) % 2 + (x * y) % 3) % 2 == 0,
                    _ => unreachable!(),
                };
                self.modules[index] ^= invert;
            }
        }
    }

    fn get_penalty_score(&self) -> i32 {
        let size: i32 = self.size;
        let mut result: i32 = 0;

        // Runs and finder-like patterns in rows, then columns
        for y in 0..size {
            result += self.line_penalty(|x| self.module(x, y));
        }
        for x in 0..size {
            result += self.line_penalty(|y| self.module(x, y));
        }

        // 2x2 blocks of one color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color: bool = self.module(x, y);
                if color == self.module(x + 1, y)
                    && color == self.module(x, y + 1)
                    && color == self.module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Dark/light balance
        let dark = self.modules.iter().filter(|&&c| c).count() as i32;
        let total: i32 = size * size;
        let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }

    fn line_penalty(&self, module_at: impl Fn(i32) -> bool) -> i32 {
        let mut result: i32 = 0;
        let mut runcolor = false;
        let mut runlen: i32 = 0;
        let mut runhistory = FinderPenalty::new(self.size);
        for i in 0..self.size {
            let color = module_at(i);
            if color == runcolor {
                runlen += 1;
                if runlen == 5 {
                    result += PENALTY_N1;
                } else if runlen > 5 {
                    result += 1;
                }
            } else {
                runhistory.add_history(runlen);
                if !runcolor {
                    result += runhistory.count_patterns() * PENALTY_N3;
                }
                runcolor = color;
                runlen = 1;
            }
        }
        result + runhistory.terminate_and_count(runcolor, runlen) * PENALTY_N3
    }
}

/// Run-length history of one row or column, for spotting 1:1:3:1:1 finder-like patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size; // light border before the first run
        }
        self.run_history.rotate_right(1);
        self.run_history[0] = currentrunlength;
    }

    /// Must only be called right after a light run was added.
    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        debug_assert!(n <= self.qr_size * 3);
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size; // light border after the last run
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

fn get_bit(x: u32, i: i32) -> bool {
    ((x >> i) & 1) != 0
}

/// The payload does not fit in any allowed version at the requested error correction level.
///
/// Callers can lower the error correction level, shorten the payload, or restrict it to
/// characters of a more compact mode (digits, or upper-case alphanumerics).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataTooLong {
    /// A segment's character count does not fit its count field.
    #[error("Segment too long")]
    SegmentTooLong,
    /// Data length exceeds capacity.
    #[error("Data length = {0} bits, Max capacity = {1} bits")]
    DataOverCapacity(usize, usize),
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}
