//! Chat API handlers

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use parley_common::{Result, ValidatedJson};
use parley_conversations::api::handlers::messages::MessageResponse;
use parley_conversations::ConversationId;
use parley_llm::LlmMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use validator::Validate;

use crate::api::middleware::ChatState;
use crate::consumer::PendingMessage;
use crate::respond::{generate_response, SystemPromptOverride};

/// Request for a raw model response
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    pub messages: Vec<LlmMessage>,

    #[serde(default)]
    pub system_prompt: Option<SystemPromptOverride>,
}

/// Request for submitting a chat message
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(length(min = 1))]
    pub content: String,
}

/// Session status DTO
#[derive(Debug, Serialize)]
pub struct ChatStatusResponse {
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    message: String,
}

#[derive(Debug, Serialize)]
struct DonePayload {
    conversation_id: ConversationId,
}

/// Events pushed to the client during a submission
#[derive(Debug)]
enum ChatEvent {
    Message(MessageResponse),
    Pending(PendingMessage),
    Error(String),
    Done(ConversationId),
}

impl ChatEvent {
    fn into_event(self) -> Event {
        let (name, data) = match self {
            ChatEvent::Message(message) => ("message", serde_json::to_string(&message)),
            ChatEvent::Pending(pending) => ("pending", serde_json::to_string(&pending)),
            ChatEvent::Error(message) => {
                ("error", serde_json::to_string(&ErrorPayload { message }))
            }
            ChatEvent::Done(conversation_id) => {
                ("done", serde_json::to_string(&DonePayload { conversation_id }))
            }
        };

        Event::default()
            .event(name)
            .data(data.unwrap_or_else(|_| "{}".to_string()))
    }
}

/// Stream a model response for the given history as newline-delimited
/// JSON events
pub async fn generate(
    State(state): State<ChatState>,
    ValidatedJson(req): ValidatedJson<GenerateRequest>,
) -> Result<Response> {
    let mut stream = generate_response(
        state.session.llm.as_ref(),
        &req.messages,
        req.system_prompt.as_ref(),
    )
    .await?;

    let body = async_stream::stream! {
        while let Some(item) = stream.next().await {
            if let Err(e) = &item {
                tracing::error!(error = %e, "Response stream failed mid-body");
            }
            yield item;
        }
    };

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(body),
    )
        .into_response())
}

/// Submit a chat message (SSE stream of pending and finalized messages)
///
/// The submission keeps running if the client disconnects.
pub async fn submit(
    State(state): State<ChatState>,
    ValidatedJson(req): ValidatedJson<SubmitRequest>,
) -> Result<Sse<impl futures_core::Stream<Item = std::result::Result<Event, Infallible>>>> {
    let submission = state.session.begin(&req.content).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _ = tx.send(ChatEvent::Message(MessageResponse::new(
        submission.conversation_id(),
        submission.user_message(),
    )));

    tokio::spawn(async move {
        let pending_tx = tx.clone();
        let outcome = submission
            .run(move |pending| {
                let _ = pending_tx.send(ChatEvent::Pending(pending.clone()));
            })
            .await;

        if let Some(message) = &outcome.assistant_message {
            let _ = tx.send(ChatEvent::Message(MessageResponse::new(
                outcome.conversation_id,
                message,
            )));
        }
        if let Some(error) = outcome.error {
            let _ = tx.send(ChatEvent::Error(error));
        }
        let _ = tx.send(ChatEvent::Done(outcome.conversation_id));
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield Ok(event.into_event());
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Get the loading flag and error banner
pub async fn get_status(State(state): State<ChatState>) -> Result<Json<ChatStatusResponse>> {
    let status = &state.session.status;

    Ok(Json(ChatStatusResponse {
        is_loading: status.is_loading(),
        error: status.error().await,
    }))
}
