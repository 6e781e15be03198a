//! Line-level parser for the upstream provider's SSE framing.
//!
//! The provider emits newline-delimited frames of the form `event: <label>` /
//! `data: <payload>`, terminated by a literal `data: [DONE]` sentinel. A
//! network read can end anywhere inside a line, so the parser keeps the
//! trailing partial line as carry-over between feeds and only ever hands back
//! complete lines.

/// Payload of the sentinel data line that ends a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A complete `data:` line, tagged with the preceding `event:` label if one
/// was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// Whether this frame is the end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_SENTINEL
    }
}

/// Incremental SSE line parser with carry-over across reads.
#[derive(Debug, Default)]
pub struct SseParser {
    remainder: String,
    event: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read, returning every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.remainder.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(pos) = self.remainder.find('\n') {
            let line: String = self.remainder.drain(..=pos).collect();
            if let Some(frame) = self.classify(line.trim_end_matches(['\n', '\r'])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush the carry-over once the connection is closed.
    ///
    /// Handles a final data line that arrived without its trailing newline,
    /// e.g. after a network interruption.
    pub fn finish(mut self) -> Option<SseFrame> {
        let tail = std::mem::take(&mut self.remainder);
        self.classify(tail.trim_end_matches('\r'))
    }

    /// Classify one complete line. `event:` lines set the label used for the
    /// following data line; anything that is neither an event label nor a
    /// data line (comments, blanks) is ignored.
    fn classify(&mut self, line: &str) -> Option<SseFrame> {
        if let Some(label) = line.strip_prefix("event: ") {
            self.event = Some(label.trim().to_string());
            return None;
        }
        if let Some(data) = line.strip_prefix("data: ") {
            return Some(SseFrame {
                event: self.event.take(),
                data: data.to_string(),
            });
        }
        None
    }
}
