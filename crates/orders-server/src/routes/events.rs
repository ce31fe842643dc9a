use axum::extract::State;
use axum::http::header::{HeaderName, CACHE_CONTROL};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::StreamExt as _;

use crate::hub::{OrderHub, Payload, Subscriber};
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// A hub subscription tied to one response body. Dropping it, for whatever
/// reason the connection ends, deregisters the subscriber.
struct SubscriberStream {
    hub: Arc<OrderHub>,
    subscriber: Subscriber,
}

impl Stream for SubscriberStream {
    type Item = Payload;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Payload>> {
        Pin::new(&mut self.subscriber).poll_next(cx)
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.hub.disconnect(self.subscriber.id);
    }
}

/// GET /api/sse/orders: SSE stream of order snapshots.
///
/// The latest cached snapshot (if any) is the first event; each later
/// broadcast follows as its own `data: <payload>` event.
pub async fn sse_orders(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let subscriber = app.hub.connect();
    let stream = SubscriberStream {
        hub: app.hub.clone(),
        subscriber,
    }
    .map(|payload| Ok::<Event, Infallible>(Event::default().data(payload)));

    (
        [(CACHE_CONTROL, "no-cache"), (X_ACCEL_BUFFERING, "no")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}
