//! Byte-to-text decoding of model files.
//!
//! The encoding is taken from the byte order mark when there is one, then
//! from the XML declaration, and defaults to UTF-8. Supported: UTF-8,
//! UTF-16 (LE/BE), ISO-8859-1 and windows-1252.

/// Longest prefix searched for the XML declaration.
const DECLARATION_WINDOW: usize = 256;

/// windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes map to
/// the C1 control of the same value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Windows1252,
}

/// Decode a whole model file. The error is a human-readable reason.
pub fn decode_document(bytes: &[u8]) -> Result<String, String> {
    let (encoding, body) = detect(bytes)?;
    match encoding {
        Encoding::Utf8 => String::from_utf8(body.to_vec())
            .map_err(|e| format!("not valid UTF-8: {e}")),
        Encoding::Utf16Le => decode_utf16(body, u16::from_le_bytes),
        Encoding::Utf16Be => decode_utf16(body, u16::from_be_bytes),
        Encoding::Latin1 => Ok(body.iter().map(|&b| char::from(b)).collect()),
        Encoding::Windows1252 => Ok(body
            .iter()
            .map(|&b| match b {
                0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(b - 0x80)],
                _ => char::from(b),
            })
            .collect()),
    }
}

/// Encoding plus the bytes that follow any byte order mark.
fn detect(bytes: &[u8]) -> Result<(Encoding, &[u8]), String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok((Encoding::Utf8, rest)),
        [0xFF, 0xFE, rest @ ..] => Ok((Encoding::Utf16Le, rest)),
        [0xFE, 0xFF, rest @ ..] => Ok((Encoding::Utf16Be, rest)),
        // "<?" without a mark
        [0x3C, 0x00, 0x3F, 0x00, ..] => Ok((Encoding::Utf16Le, bytes)),
        [0x00, 0x3C, 0x00, 0x3F, ..] => Ok((Encoding::Utf16Be, bytes)),
        _ => match declared_encoding(bytes) {
            None => Ok((Encoding::Utf8, bytes)),
            Some(label) => match label.to_ascii_uppercase().as_str() {
                "UTF-8" | "UTF8" | "US-ASCII" | "ASCII" => Ok((Encoding::Utf8, bytes)),
                "ISO-8859-1" | "ISO_8859-1" | "LATIN1" | "LATIN-1" => {
                    Ok((Encoding::Latin1, bytes))
                }
                "WINDOWS-1252" | "CP1252" => Ok((Encoding::Windows1252, bytes)),
                _ => Err(format!("unsupported encoding '{label}'")),
            },
        },
    }
}

/// The `encoding` pseudo-attribute of a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let head = String::from_utf8_lossy(window);
    let declaration = head.strip_prefix("<?xml")?;
    let declaration = &declaration[..declaration.find("?>")?];

    let after = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    Some(value[..value.find(quote)?].to_string())
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, String> {
    if body.len() % 2 != 0 {
        return Err("truncated UTF-16 data".to_string());
    }
    let units: Vec<u16> = body.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).map_err(|e| format!("not valid UTF-16: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = if bom { vec![0xFF, 0xFE] } else { vec![] };
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
        bytes
    }

    #[test]
    fn test_plain_utf8() {
        let text = "<?xml version=\"1.0\"?><Model>Société</Model>";
        assert_eq!(decode_document(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_utf8_mark_is_dropped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<Model/>");
        assert_eq!(decode_document(&bytes).unwrap(), "<Model/>");
    }

    #[test]
    fn test_utf16_little_endian_with_and_without_mark() {
        let text = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><Model>Kunde</Model>";
        assert_eq!(decode_document(&utf16le(text, true)).unwrap(), text);
        assert_eq!(decode_document(&utf16le(text, false)).unwrap(), text);
    }

    #[test]
    fn test_utf16_big_endian_with_mark() {
        let text = "<Model>Commande</Model>";
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_be_bytes()));
        assert_eq!(decode_document(&bytes).unwrap(), text);
    }

    #[test]
    fn test_truncated_utf16_is_rejected() {
        let mut bytes = utf16le("<Model/>", true);
        bytes.pop();
        assert!(decode_document(&bytes).unwrap_err().contains("truncated"));
    }

    #[test]
    fn test_declared_latin1() {
        let mut bytes = b"<?xml version='1.0' encoding='ISO-8859-1'?><a>Soci".to_vec();
        bytes.extend_from_slice(&[0xE9, 0x74, 0xE9]);
        bytes.extend_from_slice(b"</a>");
        assert!(decode_document(&bytes).unwrap().ends_with("<a>Société</a>"));
    }

    #[test]
    fn test_declared_windows_1252_high_range() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><a>".to_vec();
        bytes.extend_from_slice(&[0x80, 0x92]);
        bytes.extend_from_slice(b"</a>");
        assert!(decode_document(&bytes).unwrap().ends_with("<a>\u{20AC}\u{2019}</a>"));
    }

    #[test]
    fn test_unsupported_declared_encoding() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"Shift_JIS\"?><a/>";
        assert_eq!(
            decode_document(bytes).unwrap_err(),
            "unsupported encoding 'Shift_JIS'"
        );
    }

    #[test]
    fn test_invalid_utf8_without_declaration() {
        let bytes = [0x3C, 0x61, 0x3E, 0xFF, 0xFE, 0x3C, 0x2F, 0x61, 0x3E];
        assert!(decode_document(&bytes).unwrap_err().starts_with("not valid UTF-8"));
    }
}
