use std::collections::HashSet;

use frame_tap_common::frame::{Frame, MalformedFrameError, MessageKind};
use tracing::debug;

use super::traits::FrameFilter;

/// Outcome of classifying one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Show(ShowReason),
    Hide(HideReason),
}

impl Verdict {
    pub fn is_shown(&self) -> bool {
        matches!(self, Verdict::Show(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowReason {
    Replayed,
    AllowedEndpoint,
    UncorrelatedResponse,
    OtherKind(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HideReason {
    /// Request to an endpoint outside the allowed prefix; its tag is now
    /// suppressed.
    DisallowedEndpoint,
    /// First response to a suppressed request; its tag has been released.
    SuppressedResponse,
}

/// Hides request/response pairs whose request targets an endpoint outside
/// the allowed path prefix.
///
/// A request to a disallowed endpoint is hidden and its tag is remembered.
/// The first response carrying a remembered tag is hidden too and releases
/// the tag, so later responses with the same tag are shown again. Replayed
/// responses, unknown kinds and requests to allowed endpoints always pass.
///
/// Tags of requests that never see a response are kept forever; the set
/// grows with every unanswered disallowed request.
pub struct SuppressionFilter {
    allowed_prefix: String,
    suppressed: HashSet<String>,
}

impl SuppressionFilter {
    pub fn new(allowed_prefix: impl Into<String>) -> Self {
        Self {
            allowed_prefix: allowed_prefix.into(),
            suppressed: HashSet::new(),
        }
    }

    /// Typed decision for one decoded frame.
    ///
    /// Errors only on frames that cannot be classified; the suppression set
    /// is left untouched in that case.
    pub fn classify(&mut self, text: &str) -> Result<Verdict, MalformedFrameError> {
        let frame = Frame::parse(text)?;
        let tag = &frame.header.tag;
        let timing = frame.header.timing;
        let latency = frame.header.latency;

        let verdict = match frame.header.kind {
            MessageKind::ReplayedResponse => Verdict::Show(ShowReason::Replayed),
            MessageKind::Request => {
                let endpoint = frame.endpoint()?;
                if endpoint.starts_with(&self.allowed_prefix) {
                    Verdict::Show(ShowReason::AllowedEndpoint)
                } else {
                    debug!(tag = %tag, endpoint, ?timing, "suppressing request");
                    self.suppressed.insert(tag.clone());
                    Verdict::Hide(HideReason::DisallowedEndpoint)
                }
            }
            MessageKind::Response => {
                if self.suppressed.remove(tag) {
                    debug!(tag = %tag, ?timing, ?latency, "releasing suppressed tag");
                    Verdict::Hide(HideReason::SuppressedResponse)
                } else {
                    Verdict::Show(ShowReason::UncorrelatedResponse)
                }
            }
            MessageKind::Other(code) => Verdict::Show(ShowReason::OtherKind(code)),
        };
        Ok(verdict)
    }

    /// `true` if the frame should reach the diagnostic stream.
    ///
    /// Frames that cannot be classified are shown.
    pub fn should_output_line(&mut self, text: &str) -> bool {
        match self.classify(text) {
            Ok(verdict) => verdict.is_shown(),
            Err(e) => {
                debug!(error = %e, "malformed frame, showing it");
                true
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_suppressed(&self, tag: &str) -> bool {
        self.suppressed.contains(tag)
    }

    /// Number of tags waiting for their response.
    pub fn suppressed_len(&self) -> usize {
        self.suppressed.len()
    }
}

impl FrameFilter for SuppressionFilter {
    fn should_output(&mut self, frame: &str) -> bool {
        self.should_output_line(frame)
    }

    fn name(&self) -> &str {
        "suppression"
    }
}
