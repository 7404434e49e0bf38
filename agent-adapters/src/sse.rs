//! `text/event-stream` decoding on top of `eventsource-stream`.

use std::convert::Infallible;
use std::fmt::Display;

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, stream};

use crate::traits::{AdapterError, AdapterResult};

pub use eventsource_stream::Event as SseEvent;

/// Event type assumed when a frame carries no `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// Returns `true` for events dispatched under the default type.
#[must_use]
pub fn is_message(event: &SseEvent) -> bool {
    event.event.is_empty() || event.event == DEFAULT_EVENT
}

/// Decodes a chunked body into events as the chunks arrive.
pub fn decode<S, B, E>(body: S) -> impl Stream<Item = AdapterResult<SseEvent>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    body.eventsource().map(|event| {
        event.map_err(|err| AdapterError::transport(format!("event stream failed: {err}")))
    })
}

/// Decodes a fully buffered body, including a final frame missing its blank line.
///
/// # Errors
///
/// Returns [`AdapterError::Transport`] when the body is not a valid event stream.
pub async fn decode_buffered(body: &Bytes) -> AdapterResult<Vec<SseEvent>> {
    let chunks = [
        Ok::<_, Infallible>(body.clone()),
        Ok(Bytes::from_static(b"\n\n")),
    ];
    decode(stream::iter(chunks)).collect::<Vec<_>>().await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode_chunks(chunks: &[&'static [u8]]) -> Vec<SseEvent> {
        let chunks: Vec<Result<&[u8], Infallible>> = chunks.iter().copied().map(Ok).collect();
        decode(stream::iter(chunks))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<AdapterResult<_>>()
            .unwrap()
    }

    #[tokio::test]
    async fn events_split_across_chunks() {
        let events = decode_chunks(&[
            &b"event: endpoint\nda"[..],
            &b"ta: /messages?session=1\n\ndata: {\"a\":1}\n\n"[..],
        ])
        .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "endpoint");
        assert_eq!(events[0].data, "/messages?session=1");
        assert!(is_message(&events[1]));
        assert_eq!(events[1].data, "{\"a\":1}");
    }

    #[tokio::test]
    async fn comments_crlf_and_multiline_data() {
        let events =
            decode_chunks(&[&b": keep-alive\r\n\r\nid: 7\r\ndata: one\r\ndata: two\r\n\r\n"[..]]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
        assert_eq!(events[0].id, "7");
    }

    #[tokio::test]
    async fn codepoint_split_between_chunks() {
        let payload: &'static [u8] = "data: héllo\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let events = decode_chunks(&[&payload[..split], &payload[split..]]).await;
        assert_eq!(events[0].data, "héllo");
    }

    #[tokio::test]
    async fn buffered_body_handles_bare_cr_and_missing_terminator() {
        let events = decode_buffered(&Bytes::from_static(b"data: first\r\rdata: tail"))
            .await
            .unwrap();
        let data: Vec<&str> = events.iter().map(|event| event.data.as_str()).collect();
        assert_eq!(data, ["first", "tail"]);
    }
}
