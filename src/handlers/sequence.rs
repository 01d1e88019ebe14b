//! Responses for list endpoints.
//!
//! A list is sent as a JSON array unless the client asks for
//! `text/event-stream`, in which case every item becomes one SSE event
//! carrying its JSON representation.

use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::error::Result;

/// Whether the `Accept` header asks for an event stream
pub fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| {
            accept
                .split(',')
                .any(|range| range.trim().starts_with("text/event-stream"))
        })
}

/// Render a lazy sequence according to the request's `Accept` header
pub async fn respond<S, T>(headers: &HeaderMap, items: S) -> Result<Response>
where
    S: Stream<Item = Result<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    if wants_event_stream(headers) {
        let events = items.map(|item| {
            let value = item.map_err(axum::Error::new)?;
            Event::default().json_data(value)
        });
        return Ok(Sse::new(events)
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let collected: Vec<T> = items.try_collect().await?;
    Ok(Json(collected).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_event_stream_detection() {
        let mut headers = HeaderMap::new();
        assert!(!wants_event_stream(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!wants_event_stream(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        assert!(wants_event_stream(&headers));
    }
}
