/// Message kind carried in the first header token.
///
/// The numeric values match the payload types emitted by the traffic-replay
/// middleware: `1` original request, `2` original response, `3` response
/// received while replaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
    ReplayedResponse,
    Other(u32),
}

impl MessageKind {
    pub const REQUEST: u32 = 1;
    pub const RESPONSE: u32 = 2;
    pub const REPLAYED_RESPONSE: u32 = 3;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::REQUEST => MessageKind::Request,
            Self::RESPONSE => MessageKind::Response,
            Self::REPLAYED_RESPONSE => MessageKind::ReplayedResponse,
            other => MessageKind::Other(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            MessageKind::Request => Self::REQUEST,
            MessageKind::Response => Self::RESPONSE,
            MessageKind::ReplayedResponse => Self::REPLAYED_RESPONSE,
            MessageKind::Other(code) => code,
        }
    }
}

/// First line of a frame: `<type> <tag> [<timing> [<latency>]] ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageKind,
    pub tag: String,
    /// Request start time or round-trip time, depending on the kind.
    pub timing: Option<i64>,
    pub latency: Option<i64>,
}

impl Header {
    pub fn parse(line: &str) -> Result<Self, MalformedFrameError> {
        let mut tokens = line.split_whitespace();
        let type_token = tokens.next().ok_or(MalformedFrameError::MissingType)?;
        let code = leading_integer(type_token)
            .ok_or_else(|| MalformedFrameError::InvalidType(type_token.to_string()))?;
        let tag = tokens.next().ok_or(MalformedFrameError::MissingTag)?;
        let timing = tokens.next().and_then(|t| t.parse().ok());
        let latency = tokens.next().and_then(|t| t.parse().ok());

        Ok(Self {
            kind: MessageKind::from_code(code),
            tag: tag.to_string(),
            timing,
            latency,
        })
    }
}

/// A decoded frame, borrowed from its text.
///
/// Components are the newline-separated lines of the frame. Only the header
/// is parsed eagerly; the request endpoint is looked up on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub header: Header,
    text: &'a str,
}

impl<'a> Frame<'a> {
    pub fn parse(text: &'a str) -> Result<Self, MalformedFrameError> {
        let header_line = text.split('\n').next().unwrap_or_default();
        let header = Header::parse(header_line)?;
        Ok(Self { header, text })
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Line `index` of the frame, the header being line `0`.
    pub fn component(&self, index: usize) -> Option<&'a str> {
        self.text.split('\n').nth(index)
    }

    /// Path targeted by a request frame.
    ///
    /// This is the second token of the request line. When that token is not
    /// a path but a later one is (a request line carrying a label before the
    /// method), the first path-shaped token after it is used instead.
    pub fn endpoint(&self) -> Result<&'a str, MalformedFrameError> {
        let request_line = self
            .component(1)
            .ok_or(MalformedFrameError::MissingRequestLine)?;
        let mut tokens = request_line.split_whitespace().skip(1);
        let second = tokens.next().ok_or(MalformedFrameError::MissingEndpoint)?;
        if second.starts_with('/') {
            return Ok(second);
        }
        Ok(tokens.find(|t| t.starts_with('/')).unwrap_or(second))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedFrameError {
    #[error("frame header is empty")]
    MissingType,
    #[error("frame type {0:?} is not a number")]
    InvalidType(String),
    #[error("frame header has no tag")]
    MissingTag,
    #[error("request frame has no request line")]
    MissingRequestLine,
    #[error("request line has no endpoint")]
    MissingEndpoint,
}

/// Integer value of the leading decimal digits of `token` (`"1"`, `"2abc"`).
fn leading_integer(token: &str) -> Option<u32> {
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token[..end].parse().ok()
}
