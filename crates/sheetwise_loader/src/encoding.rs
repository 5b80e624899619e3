//! Character encoding detection for delimited text.
//!
//! Order of evidence: byte-order mark, UTF-16 NUL parity, strict UTF-8
//! validity, then a byte-distribution score between UTF-8 and Windows-1252.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

const PARITY_SAMPLE: usize = 4096;
const PARITY_THRESHOLD: f64 = 0.3;

/// A detected encoding and how sure the detector is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodingGuess {
    /// The encoding to decode with.
    pub encoding: &'static Encoding,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl EncodingGuess {
    const fn new(encoding: &'static Encoding, confidence: f64) -> Self {
        Self {
            encoding,
            confidence,
        }
    }
}

/// Guesses the encoding of a byte buffer.
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> EncodingGuess {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return EncodingGuess::new(encoding, 1.0);
    }
    if let Some(guess) = utf16_parity(&bytes[..bytes.len().min(PARITY_SAMPLE)]) {
        return guess;
    }
    if UTF_8
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
    {
        let ascii = bytes.iter().all(u8::is_ascii);
        return EncodingGuess::new(UTF_8, if ascii { 1.0 } else { 0.99 });
    }

    let stats = ByteStats::scan(bytes);
    let utf8_score = stats.utf8_score();
    let latin_score = stats.windows_1252_score();
    if utf8_score > latin_score {
        EncodingGuess::new(UTF_8, utf8_score)
    } else {
        EncodingGuess::new(WINDOWS_1252, latin_score)
    }
}

/// Decodes bytes with the guessed encoding; BOMs are stripped.
///
/// Returns the text and whether malformed sequences were replaced.
#[must_use]
pub fn decode(bytes: &[u8], guess: EncodingGuess) -> (String, bool) {
    let (text, _, had_errors) = guess.encoding.decode(bytes);
    (text.into_owned(), had_errors)
}

/// Detects UTF-16 text without a BOM from the position of NUL bytes.
///
/// ASCII-heavy UTF-16LE has NULs at odd offsets, UTF-16BE at even offsets.
pub(crate) fn utf16_parity(sample: &[u8]) -> Option<EncodingGuess> {
    if sample.len() < 4 {
        return None;
    }
    let pairs = sample.len() / 2;
    let (mut even, mut odd) = (0usize, 0usize);
    for (i, &b) in sample.iter().enumerate().take(pairs * 2) {
        if b == 0 {
            if i % 2 == 0 {
                even += 1;
            } else {
                odd += 1;
            }
        }
    }
    let even_ratio = ratio(even, pairs);
    let odd_ratio = ratio(odd, pairs);
    if odd_ratio > PARITY_THRESHOLD && even_ratio < 0.05 {
        Some(EncodingGuess::new(UTF_16LE, odd_ratio.min(1.0)))
    } else if even_ratio > PARITY_THRESHOLD && odd_ratio < 0.05 {
        Some(EncodingGuess::new(UTF_16BE, even_ratio.min(1.0)))
    } else {
        None
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// High-byte counts. Bytes outside valid UTF-8 sequences that read as
/// Windows-1252 letters or punctuation count toward Windows-1252.
#[derive(Debug, Default)]
struct ByteStats {
    high: usize,
    valid_sequences: usize,
    invalid_sequences: usize,
    latin_letters: usize,
    c1_punctuation: usize,
}

impl ByteStats {
    fn scan(bytes: &[u8]) -> Self {
        let mut stats = Self::default();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b < 0x80 {
                i += 1;
                continue;
            }
            stats.high += 1;
            let len = match b {
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF4 => 4,
                _ => 0,
            };
            let valid = len > 0
                && i + len <= bytes.len()
                && bytes[i + 1..i + len].iter().all(|c| (0x80..=0xBF).contains(c));
            if valid {
                stats.valid_sequences += 1;
                i += len;
            } else {
                stats.invalid_sequences += 1;
                match b {
                    0xC0..=0xFF => stats.latin_letters += 1,
                    0x82..=0x8C | 0x91..=0x9C | 0x9E | 0x9F => stats.c1_punctuation += 1,
                    _ => {}
                }
                i += 1;
            }
        }
        stats
    }

    fn utf8_score(&self) -> f64 {
        ratio(
            self.valid_sequences,
            self.valid_sequences + self.invalid_sequences,
        )
    }

    fn windows_1252_score(&self) -> f64 {
        ratio(self.latin_letters + self.c1_punctuation, self.high)
    }
}
