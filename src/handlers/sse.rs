use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::stream::{self, Stream, StreamExt};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::state::AppState;

/// One open `/mcp/sse` connection. Owns the ping timer; dropping the session
/// (which happens when the client goes away) stops it.
pub struct HeartbeatSession {
    state: Arc<AppState>,
    interval: Interval,
}

impl HeartbeatSession {
    pub fn open(state: Arc<AppState>) -> Self {
        let period = state.heartbeat_interval;
        // First ping one full period after open, not immediately.
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let live = state.session_opened();
        debug!(live, ?period, "heartbeat session opened");
        Self { state, interval }
    }

    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

impl Drop for HeartbeatSession {
    fn drop(&mut self) {
        let live = self.state.session_closed();
        debug!(live, "heartbeat session closed");
    }
}

pub fn open_event() -> Event {
    Event::default().event("open").data("connected")
}

pub fn ping_event() -> Event {
    Event::default().event("ping").data("{}")
}

/// `open` once, then `ping` on every tick for as long as the session lives.
pub fn heartbeat_stream(session: HeartbeatSession) -> impl Stream<Item = Result<Event, Infallible>> {
    let pings = stream::unfold(session, |mut session| async move {
        session.tick().await;
        Some((Ok(ping_event()), session))
    });
    stream::once(async { Ok(open_event()) }).chain(pings)
}

/// `GET /mcp/sse`: keep-warm channel, never carries relayed traffic.
pub async fn sse_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = HeartbeatSession::open(state);
    (
        [
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(heartbeat_stream(session)),
    )
}
