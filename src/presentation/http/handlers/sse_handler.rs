use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response, Sse, sse::Event, sse::KeepAlive},
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::time::sleep;
use uuid::Uuid;

use crate::application::use_cases::GetRunStatusUseCase;
use crate::presentation::http::dto::RunStatusDto;

pub struct SseHandler {
    get_run_status_use_case: Arc<GetRunStatusUseCase>,
}

impl SseHandler {
    pub fn new(get_run_status_use_case: Arc<GetRunStatusUseCase>) -> Self {
        Self {
            get_run_status_use_case,
        }
    }

    /// Emits `run_progress` once a second until the run reaches a terminal state.
    pub async fn run_progress_stream(
        State(handler): State<Arc<SseHandler>>,
        Path(run_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let use_case = handler.get_run_status_use_case.clone();

        let stream = stream::unfold(true, move |open| {
            let use_case = use_case.clone();
            async move {
                if !open {
                    return None;
                }

                match use_case.execute(run_id).await {
                    Ok(response) => {
                        let status = RunStatusDto::from(response);
                        let event = Event::default()
                            .event("run_progress")
                            .data(serde_json::to_string(&status).unwrap_or_default());

                        if status.is_terminal {
                            Some((Ok::<_, Infallible>(event), false))
                        } else {
                            sleep(Duration::from_secs(1)).await;
                            Some((Ok(event), true))
                        }
                    }
                    Err(e) => {
                        let event = Event::default().event("error").data(e.to_string());
                        Some((Ok(event), false))
                    }
                }
            }
        });

        Ok(create_sse_response(stream))
    }
}

pub fn create_sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}
