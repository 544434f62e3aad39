// Export route modules
pub mod agents;
pub mod chat;
pub mod compare;

use crate::state::AppState;
use axum::{http, response::IntoResponse, Router};
use bytes::Bytes;
use futures::Stream;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(compare::routes(state.clone()))
        .merge(agents::routes(state))
}

/// Response body that relays newline-delimited JSON records from a channel.
pub struct StreamResponse {
    rx: ReceiverStream<String>,
}

impl StreamResponse {
    /// Creates a bounded channel whose receiving half is the response body.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            tx,
            Self {
                rx: ReceiverStream::new(rx),
            },
        )
    }
}

impl Stream for StreamResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for StreamResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Cache-Control", "no-cache")
            .body(body)
            .unwrap()
    }
}
