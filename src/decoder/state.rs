//! The buffered decoder state machine.
//!
//! # States
//! ```text
//! Streaming ──sentinel──▶ Terminated
//!     │ ──close()───────▶ Terminated
//!     │ ──fail()────────▶ Terminated
//! ```
//! There are no transitions out of `Terminated`.

use crate::decoder::frame::{find_separator, frame_payload, is_end_sentinel, FRAME_SEPARATOR};

/// Decoder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Accepting chunks.
    Streaming,
    /// Sentinel seen, transport closed, or transport failed.
    Terminated,
}

/// Why a stream ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A frame carried the end sentinel.
    Sentinel,
    /// The transport closed before any sentinel.
    TransportClosed,
}

/// One decoded event, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A frame payload, exactly as sent after the tag.
    Data(String),
    /// Normal end of stream.
    End(EndReason),
    /// The transport failed mid-stream.
    Error(String),
}

impl Event {
    /// True for `End` and `Error`; nothing follows a terminal event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::Data(_))
    }

    /// The payload of a data event.
    pub fn as_data(&self) -> Option<&str> {
        match self {
            Event::Data(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Incremental decoder for one stream.
///
/// Chunks may split frames anywhere, including inside the separator, the tag,
/// or a multi-byte character. The buffer always holds exactly the text not yet
/// resolved into frames.
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence from `feed_bytes`.
    pending: Vec<u8>,
    /// Buffer offset before which no separator can start.
    scan_from: usize,
    state: DecoderState,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pending: Vec::new(),
            scan_from: 0,
            state: DecoderState::Streaming,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == DecoderState::Terminated
    }

    /// Text buffered but not yet part of a complete frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Feed a text chunk. A no-op once terminated.
    pub fn feed(&mut self, chunk: &str) -> Vec<Event> {
        if self.is_terminated() {
            return Vec::new();
        }
        if !self.pending.is_empty() {
            // A str chunk starts on a char boundary, so the held bytes can
            // never be completed.
            self.pending.clear();
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
        self.buffer.push_str(chunk);
        self.drain_frames()
    }

    /// Feed a raw transport chunk. Incomplete trailing UTF-8 is held back until
    /// the next chunk; invalid sequences become U+FFFD.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<Event> {
        if self.is_terminated() {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);
        decode_utf8(&mut self.pending, &mut self.buffer);
        self.drain_frames()
    }

    /// The transport ended. Any unterminated tail is discarded.
    pub fn close(&mut self) -> Vec<Event> {
        if self.is_terminated() {
            return Vec::new();
        }
        let dropped = self.buffer.len() + self.pending.len();
        if dropped > 0 {
            tracing::debug!(dropped_bytes = dropped, "Stream closed with an incomplete frame");
        }
        self.terminate();
        vec![Event::End(EndReason::TransportClosed)]
    }

    /// The transport failed. Emits one error event and terminates.
    pub fn fail(&mut self, reason: impl Into<String>) -> Vec<Event> {
        if self.is_terminated() {
            return Vec::new();
        }
        let reason = reason.into();
        tracing::warn!(reason = %reason, "Stream aborted");
        self.terminate();
        vec![Event::Error(reason)]
    }

    fn terminate(&mut self) {
        self.state = DecoderState::Terminated;
        self.buffer = String::new();
        self.pending = Vec::new();
        self.scan_from = 0;
    }

    fn drain_frames(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        let mut frame_start = 0;
        let mut search_from = self.scan_from;

        while let Some(offset) = find_separator(&self.buffer.as_bytes()[search_from..]) {
            let separator = search_from + offset;
            let payload = frame_payload(&self.buffer[frame_start..separator]);
            frame_start = separator + FRAME_SEPARATOR.len();
            search_from = frame_start;

            let Some(payload) = payload else {
                continue;
            };
            if is_end_sentinel(&payload) {
                self.terminate();
                events.push(Event::End(EndReason::Sentinel));
                return events;
            }
            events.push(Event::Data(payload));
        }

        self.buffer.drain(..frame_start);
        // A separator may still start on the last buffered byte.
        self.scan_from = self.buffer.len().saturating_sub(FRAME_SEPARATOR.len() - 1);
        events
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Move the decodable prefix of `pending` into `out`.
fn decode_utf8(pending: &mut Vec<u8>, out: &mut String) {
    let mut offset = 0;
    while offset < pending.len() {
        match std::str::from_utf8(&pending[offset..]) {
            Ok(valid) => {
                out.push_str(valid);
                offset = pending.len();
            }
            Err(e) => {
                let valid_end = offset + e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[offset..valid_end]));
                match e.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        offset = valid_end + len;
                    }
                    None => {
                        offset = valid_end;
                        break;
                    }
                }
            }
        }
    }
    pending.drain(..offset);
}
