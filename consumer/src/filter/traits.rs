/// Stateful decision on whether a decoded frame reaches the diagnostic stream.
///
/// Implementations see every frame in arrival order and may keep state
/// across calls (e.g. to correlate a response with an earlier request).
pub trait FrameFilter {
    /// Returns `true` if the frame should be shown.
    /// Returns `false` to hide it.
    fn should_output(&mut self, frame: &str) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
