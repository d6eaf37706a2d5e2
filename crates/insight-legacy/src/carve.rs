//! Two-way decoding and fragment scoring.

use std::fmt;

/// CFB (Compound File Binary) / OLE2 magic signature
///
/// The signature is `D0 CF 11 E0 A1 B1 1A E1` - a mnemonic for "DOC FILE".
pub const CFB_MAGIC_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Score deducted per fragment; favors fewer, denser fragments.
pub const FRAGMENT_PENALTY: i64 = 3;

/// Decoding a carve was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarveEncoding {
    /// UTF-16 little endian
    Utf16Le,
    /// ISO-8859-1
    Latin1,
}

impl CarveEncoding {
    /// Label recorded in result metadata.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf16Le => "utf-16-le",
            Self::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for CarveEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Text fragments recovered from a binary buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedText {
    /// Winning decoding
    pub encoding: CarveEncoding,
    /// Trimmed, non-empty fragments in file order
    pub fragments: Vec<String>,
}

/// True when the buffer starts with the OLE2 compound file signature.
#[inline]
#[must_use]
pub fn has_cfb_signature(data: &[u8]) -> bool {
    data.starts_with(&CFB_MAGIC_SIGNATURE)
}

/// Decode as UTF-16LE, dropping unpaired surrogates and a trailing odd byte.
#[must_use]
pub fn decode_utf16le(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).filter_map(Result::ok).collect()
}

/// Decode as ISO-8859-1; every byte maps to one char.
#[must_use]
pub fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&byte| char::from(byte)).collect()
}

/// ASCII controls other than line feed separate fragments.
#[inline]
const fn is_separator(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{09}' | '\u{0b}'..='\u{1f}')
}

/// Split on control runs, trim, drop empties.
#[must_use]
pub fn split_fragments(text: &str) -> Vec<String> {
    text.split(is_separator)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Printable non-space characters minus [`FRAGMENT_PENALTY`] per fragment.
#[must_use]
pub fn readability_score(fragments: &[String]) -> i64 {
    let printable: usize = fragments
        .iter()
        .map(|fragment| {
            fragment
                .chars()
                .filter(|c| !c.is_whitespace() && !c.is_control())
                .count()
        })
        .sum();
    let printable = i64::try_from(printable).unwrap_or(i64::MAX);
    let penalty = i64::try_from(fragments.len())
        .unwrap_or(i64::MAX)
        .saturating_mul(FRAGMENT_PENALTY);
    printable.saturating_sub(penalty)
}

/// Decode both ways and keep the more readable candidate.
///
/// An empty candidate always loses; ties go to UTF-16LE.
#[must_use]
pub fn carve_text(data: &[u8]) -> CarvedText {
    let utf16 = split_fragments(&decode_utf16le(data));
    let latin1 = split_fragments(&decode_latin1(data));

    let encoding = if utf16.is_empty() {
        CarveEncoding::Latin1
    } else if latin1.is_empty() {
        CarveEncoding::Utf16Le
    } else {
        let utf16_score = readability_score(&utf16);
        let latin1_score = readability_score(&latin1);
        log::debug!("Carve scores: utf-16-le={utf16_score}, latin-1={latin1_score}");
        if latin1_score > utf16_score {
            CarveEncoding::Latin1
        } else {
            CarveEncoding::Utf16Le
        }
    };

    let fragments = match encoding {
        CarveEncoding::Utf16Le => utf16,
        CarveEncoding::Latin1 => latin1,
    };
    CarvedText {
        encoding,
        fragments,
    }
}
