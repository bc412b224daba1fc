//! Frame-level parsing.
//!
//! A frame is everything between two separators:
//! ```text
//! data: Hello
//!
//! data:  padded payload
//!
//! data: [END]
//!
//! ```

/// Separator between frames: two consecutive line terminators.
pub const FRAME_SEPARATOR: &[u8; 2] = b"\n\n";

/// The only field tag that carries a payload.
pub const DATA_TAG: &str = "data:";

/// Payload value that ends the logical stream.
pub const END_SENTINEL: &str = "[END]";

/// Byte offset of the first separator in `haystack`.
pub fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FRAME_SEPARATOR.len())
        .position(|window| window == FRAME_SEPARATOR)
}

/// Strip the `data:` tag and one following space from a line.
///
/// The rest of the line is returned verbatim. Lines without the tag yield
/// `None` and are ignored by the decoder.
pub fn parse_data_line(line: &str) -> Option<&str> {
    let value = line.strip_prefix(DATA_TAG)?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Extract the payload of one frame.
///
/// Multiple `data:` lines are joined with `\n`. A frame without any `data:`
/// line has no payload.
pub fn frame_payload(frame: &str) -> Option<String> {
    let mut payload: Option<String> = None;
    for value in frame.split('\n').filter_map(parse_data_line) {
        match payload.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => payload = Some(value.to_string()),
        }
    }
    payload
}

/// True if a payload is the end-of-stream sentinel. Surrounding whitespace is
/// ignored for this comparison only.
pub fn is_end_sentinel(payload: &str) -> bool {
    payload.trim() == END_SENTINEL
}
