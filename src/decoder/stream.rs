//! Async adapter from a byte stream to decoded events.

use std::collections::VecDeque;
use std::fmt::Display;

use futures_util::stream::{self, Stream, StreamExt};

use crate::decoder::state::{Event, StreamDecoder};

/// Decode a transport byte stream into events.
///
/// The returned stream yields data events in arrival order and ends right
/// after exactly one terminal event (`End` or `Error`). The source is dropped
/// as soon as the terminal event is produced, releasing the connection even if
/// the transport would have sent more bytes.
///
/// # Example
/// ```ignore
/// let response = client.post(url).json(&body).send().await?;
/// let mut events = std::pin::pin!(decode_stream(response.bytes_stream()));
/// while let Some(event) = events.next().await {
///     println!("{event:?}");
/// }
/// ```
pub fn decode_stream<S, B, E>(source: S) -> impl Stream<Item = Event>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let initial = Some((Box::pin(source), StreamDecoder::new(), VecDeque::<Event>::new()));

    stream::unfold(initial, |state| async move {
        let (mut source, mut decoder, mut queue) = state?;
        loop {
            if let Some(event) = queue.pop_front() {
                if event.is_terminal() {
                    return Some((event, None));
                }
                return Some((event, Some((source, decoder, queue))));
            }

            let events = match source.next().await {
                Some(Ok(chunk)) => decoder.feed_bytes(chunk.as_ref()),
                Some(Err(e)) => decoder.fail(e.to_string()),
                None => decoder.close(),
            };
            queue.extend(events);
        }
    })
}
