/// QR symbol encoding, seen from the renderer's side.
///
/// The renderer never looks inside the error-correction coding; it only needs a
/// square grid of dark and light modules. This module wraps the `qrcode` crate
/// behind the [`Encoder`] trait, owns the [`BitMatrix`] the rest of the crate
/// consumes, and decides which error correction level a render actually uses.
use crate::error::{QrError, Result};

/// A square grid of modules as produced by an encoder (`true` = dark).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    /// The width and height of the symbol, measured in modules.
    size: usize,

    /// Row-major module values.
    bits: Vec<bool>,
}

impl BitMatrix {
    /// Builds a matrix from row-major bits.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::Configuration`] if `bits` does not describe a
    /// non-empty square.
    pub fn new(size: usize, bits: Vec<bool>) -> Result<Self> {
        if size == 0 || bits.len() != size * size {
            return Err(QrError::config(format!(
                "matrix must be square: {} bits for side {}",
                bits.len(),
                size
            )));
        }
        Ok(BitMatrix { size, bits })
    }

    /// Builds a matrix from rows, rejecting ragged or non-square input.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::encoder::BitMatrix;
    ///
    /// let m = BitMatrix::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
    /// assert!(m.get(1, 1));
    /// assert!(BitMatrix::from_rows(&[vec![true, false]]).is_err());
    /// ```
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let size = rows.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != size) {
            return Err(QrError::config(format!(
                "matrix must be square: {} rows but a row of {} modules",
                size,
                bad.len()
            )));
        }
        BitMatrix::new(size, rows.iter().flatten().copied().collect())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the module at the given row and column. Out-of-bounds reads are light.
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.bits[row * self.size + col]
    }

    /// The QR version implied by the side length, if it is a standard one.
    pub fn version(&self) -> Option<u8> {
        if self.size >= 21 && (self.size - 17) % 4 == 0 && self.size <= 177 {
            Some(((self.size - 17) / 4) as u8)
        } else {
            None
        }
    }
}

/// Error correction level requested for a render.
///
/// Levels are ordered, so `max` picks the stronger of two levels.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub enum ErrorCorrectionLevel {
    /// Pick Medium, escalated by logo coverage.
    #[default]
    Auto,
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    MediumHigh,
    /// Tolerates ~30% erroneous codewords.
    High,
}

/// Logo coverage above which at least [`ErrorCorrectionLevel::MediumHigh`] is used.
pub const MEDIUM_HIGH_COVERAGE: f32 = 0.2;
/// Logo coverage above which [`ErrorCorrectionLevel::High`] is used.
pub const HIGH_COVERAGE: f32 = 0.3;

impl ErrorCorrectionLevel {
    /// Resolves the level actually used for a logo covering `coverage` of the code
    /// (`logo size * (1 + logo padding)`).
    ///
    /// The result never drops below the requested level and never decreases as
    /// coverage grows.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::encoder::ErrorCorrectionLevel::*;
    ///
    /// assert_eq!(Low.resolve(0.25), MediumHigh);
    /// assert_eq!(High.resolve(0.0), High);
    /// assert_eq!(Auto.resolve(0.0), Medium);
    /// ```
    pub fn resolve(self, coverage: f32) -> ErrorCorrectionLevel {
        let base = match self {
            ErrorCorrectionLevel::Auto => ErrorCorrectionLevel::Medium,
            level => level,
        };
        let required = if coverage > HIGH_COVERAGE {
            ErrorCorrectionLevel::High
        } else if coverage > MEDIUM_HIGH_COVERAGE {
            ErrorCorrectionLevel::MediumHigh
        } else {
            ErrorCorrectionLevel::Low
        };
        base.max(required)
    }

    fn ec_level(self) -> qrcode::EcLevel {
        use ErrorCorrectionLevel::*;
        match self {
            Low => qrcode::EcLevel::L,
            Auto | Medium => qrcode::EcLevel::M,
            MediumHigh => qrcode::EcLevel::Q,
            High => qrcode::EcLevel::H,
        }
    }
}

/// Turns a payload into a module matrix.
pub trait Encoder: Send + Sync {
    /// Encodes `payload` at the given level.
    ///
    /// # Errors
    ///
    /// Fails if the payload is empty or does not fit at `level`.
    fn encode(&self, payload: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix>;
}

/// [`Encoder`] backed by the `qrcode` crate. Payloads are encoded as UTF-8 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrcodeEncoder;

impl Encoder for QrcodeEncoder {
    fn encode(&self, payload: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
        if payload.is_empty() {
            return Err(QrError::config("payload is empty"));
        }
        let code = qrcode::QrCode::with_error_correction_level(payload.as_bytes(), level.ec_level())
            .map_err(|e| QrError::config(format!("payload cannot be encoded at {:?}: {}", level, e)))?;
        let bits = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        BitMatrix::new(code.width(), bits)
    }
}

/// Encodes with the default [`QrcodeEncoder`].
pub fn encode(payload: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix> {
    QrcodeEncoder.encode(payload, level)
}

/// Returns the row/column coordinates of alignment pattern centres for a version,
/// in ascending order. Version 1 has none.
pub fn alignment_pattern_positions(version: u8) -> Vec<usize> {
    if version <= 1 {
        return Vec::new();
    }
    let size = usize::from(version) * 4 + 17;
    let numalign = usize::from(version) / 7 + 2;
    let step = if version == 32 {
        26
    } else {
        ((usize::from(version) * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
    };
    let mut result: Vec<usize> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}
