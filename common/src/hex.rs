use serde::Deserialize;

/// How raw input lines are turned back into frame text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HexMode {
    /// Best-effort: a trailing odd nibble is dropped and a pair that does not
    /// start with a hex digit becomes byte `0`. Invalid UTF-8 is replaced
    /// with U+FFFD.
    #[default]
    Lossy,
    /// Any malformed input is reported as a [`DecodeError`].
    Strict,
}

impl HexMode {
    pub fn decode(self, line: &str) -> Result<String, DecodeError> {
        match self {
            HexMode::Lossy => Ok(decode_lossy(line)),
            HexMode::Strict => decode_strict(line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("hex line has odd length {0}")]
    OddLength(usize),
    #[error("invalid hex digit {byte:#04x} at offset {index}")]
    InvalidDigit { index: usize, byte: u8 },
    #[error("decoded frame is not valid UTF-8")]
    InvalidUtf8,
}

impl From<hex::FromHexError> for DecodeError {
    fn from(e: hex::FromHexError) -> Self {
        match e {
            hex::FromHexError::OddLength => DecodeError::OddLength(0),
            hex::FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidDigit {
                index,
                byte: u8::try_from(c).unwrap_or(b'?'),
            },
            // Only reachable through `decode_to_slice`, which is never used here.
            hex::FromHexError::InvalidStringLength => DecodeError::OddLength(0),
        }
    }
}

/// Decode a hex line the way the upstream middleware helper does.
///
/// The line is walked in pairs of UTF-16 code units; a dangling final unit
/// is ignored. A pair whose first unit is not a hex digit yields `0` for that
/// byte instead of an error, and the resulting bytes are read as UTF-8 with
/// replacement characters for invalid sequences. Each line is decoded on its
/// own: a multi-byte sequence cut at the end of a line is not joined with the
/// next one.
pub fn decode_lossy(line: &str) -> String {
    let units: Vec<u16> = line.encode_utf16().collect();
    let bytes: Vec<u8> = units
        .chunks_exact(2)
        .map(|pair| match (unit_nibble(pair[0]), unit_nibble(pair[1])) {
            (Some(hi), Some(lo)) => (hi << 4) | lo,
            // A leading valid digit still counts, like `parseInt("4g", 16)`.
            (Some(hi), None) => hi,
            _ => 0,
        })
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decode a hex line, rejecting anything that is not well-formed hex of a
/// UTF-8 string.
pub fn decode_strict(line: &str) -> Result<String, DecodeError> {
    if line.len() % 2 != 0 {
        return Err(DecodeError::OddLength(line.len()));
    }
    let bytes = hex::decode(line)?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
}

/// Lowercase hex of the UTF-8 bytes of `text`.
pub fn encode(text: &str) -> String {
    hex::encode(text.as_bytes())
}

fn unit_nibble(unit: u16) -> Option<u8> {
    u8::try_from(unit).ok().and_then(nibble)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
