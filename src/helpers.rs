//! Payload decoding helpers shared by the diagnostic service wrappers

/// Decodes an identification payload as UTF-8 text, trimming NUL padding and
/// surrounding whitespace. Returns None if the payload is not valid UTF-8,
/// in which case callers fall back to a hex rendering.
pub(crate) fn decode_ident_utf8(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    let trimmed = text.trim_matches('\0').trim();
    Some(trimmed.to_string())
}

/// Interprets the final two bytes of a payload as a big-endian counter.
/// Service counters on VAG ECUs report their day count this way regardless
/// of how many leading bytes the record carries.
pub(crate) fn be_counter_tail(payload: &[u8]) -> Option<u16> {
    if payload.len() < 2 {
        return None;
    }
    let tail = &payload[payload.len() - 2..];
    Some(u16::from_be_bytes([tail[0], tail[1]]))
}

/// Uppercase hex rendering of a payload for logs and reports
pub(crate) fn to_hex(payload: &[u8]) -> String {
    hex::encode_upper(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_utf8_trims_nul_padding() {
        let payload = b"04E906023AB\0\0\0";
        assert_eq!(decode_ident_utf8(payload).unwrap(), "04E906023AB");
    }

    #[test]
    fn ident_utf8_rejects_binary() {
        assert!(decode_ident_utf8(&[0x62, 0xF1, 0x90, 0xFF]).is_none());
    }

    #[test]
    fn counter_tail_is_big_endian() {
        // 0x02DA == 730 days, preceded by a record header byte
        assert_eq!(be_counter_tail(&[0x01, 0x02, 0xDA]), Some(730));
        assert_eq!(be_counter_tail(&[0x05, 0xB4]), Some(1460));
        assert_eq!(be_counter_tail(&[0x00]), None);
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(to_hex(&[0x62, 0xF1, 0x90]), "62F190");
    }
}
