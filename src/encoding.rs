//! Text decoding with an ordered list of candidate encodings.
//!
//! The input log arrives with no declared encoding. Candidates are tried in
//! priority order and the first one that decodes the entire buffer wins.
//! A single bad byte disqualifies a candidate for the whole file.

use log::debug;

/// A decoder for one text encoding.
pub trait TextDecoder {
    /// Encoding label used in logs and error messages.
    fn label(&self) -> &'static str;

    /// Decodes the whole buffer, or returns `None` on the first invalid byte.
    fn decode(&self, bytes: &[u8]) -> Option<String>;
}

/// UTF-8, with a leading byte-order mark dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextDecoder for Utf8 {
    fn label(&self) -> &'static str {
        "utf-8"
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }
}

/// ISO-8859-1. Every byte maps to the code point of the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl TextDecoder for Latin1 {
    fn label(&self) -> &'static str {
        "latin-1"
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    }
}

/// Windows-1252. Bytes 0x81, 0x8D, 0x8F, 0x90 and 0x9D are undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows1252;

/// Code points for bytes 0x80..=0x9F; `None` marks an undefined byte.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

impl TextDecoder for Windows1252 {
    fn label(&self) -> &'static str {
        "cp1252"
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        bytes
            .iter()
            .map(|&b| match b {
                0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
                _ => Some(char::from(b)),
            })
            .collect()
    }
}

/// Text decoded by the first successful candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// The default candidate order: UTF-8, then the two legacy single-byte encodings.
pub fn default_decoders() -> Vec<Box<dyn TextDecoder>> {
    vec![Box::new(Utf8), Box::new(Latin1), Box::new(Windows1252)]
}

/// Tries each decoder in order and returns the first full decode.
///
/// Returns `None` only when every candidate fails.
pub fn decode_with_fallback(bytes: &[u8], decoders: &[Box<dyn TextDecoder>]) -> Option<Decoded> {
    decoders.iter().find_map(|decoder| {
        let text = decoder.decode(bytes);
        if text.is_none() {
            debug!("Encoding {} rejected input", decoder.label());
        }
        text.map(|text| Decoded {
            text,
            encoding: decoder.label(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_wins_for_valid_utf8() {
        let decoded = decode_with_fallback("Café|ok".as_bytes(), &default_decoders()).unwrap();
        assert_eq!(decoded.encoding, "utf-8");
        assert_eq!(decoded.text, "Café|ok");
    }

    #[test]
    fn test_utf8_strips_bom() {
        let decoded = Utf8.decode(b"\xEF\xBB\xBFabc").unwrap();
        assert_eq!(decoded, "abc");
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_latin1() {
        // 0xE9 is 'é' in latin-1 but an incomplete sequence in UTF-8
        let decoded = decode_with_fallback(b"Caf\xE9", &default_decoders()).unwrap();
        assert_eq!(decoded.encoding, "latin-1");
        assert_eq!(decoded.text, "Café");
    }

    #[test]
    fn test_cp1252_maps_high_range() {
        assert_eq!(Windows1252.decode(b"\x80 \x99").unwrap(), "€ ™");
    }

    #[test]
    fn test_cp1252_rejects_undefined_bytes() {
        assert!(Windows1252.decode(b"ok\x81").is_none());
    }

    #[test]
    fn test_all_candidates_failing_returns_none() {
        let decoders: Vec<Box<dyn TextDecoder>> = vec![Box::new(Utf8), Box::new(Windows1252)];
        assert!(decode_with_fallback(b"\xFF\x81", &decoders).is_none());
    }

    #[test]
    fn test_single_bad_byte_rejects_whole_candidate() {
        let decoders: Vec<Box<dyn TextDecoder>> = vec![Box::new(Utf8), Box::new(Windows1252)];
        let decoded = decode_with_fallback(b"line one\nline \x93two\x94", &decoders).unwrap();
        assert_eq!(decoded.encoding, "cp1252");
        assert_eq!(decoded.text, "line one\nline \u{201C}two\u{201D}");
    }
}
