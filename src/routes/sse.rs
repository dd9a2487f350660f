use crate::state::RosterState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use tokio_stream::{
    StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SseEvent {
    CrudStudent,
}

impl SseEvent {
    /// Name the page listens for with `hx-trigger="sse:<name>"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CrudStudent => "crud_student",
        }
    }
}

pub async fn sse_feed(
    State(state): State<RosterState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe_to_sse_feed()).map(|msg| {
        let evt = match msg {
            Ok(evt) => evt,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                //missed some, but a refresh covers all of them
                debug!(?skipped, "SSE subscriber lagged");
                SseEvent::CrudStudent
            }
        };
        Ok(Event::default().event(evt.name()).data(""))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
