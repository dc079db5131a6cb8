use axum::Json;
use maud::Markup;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::presentation;
use crate::store::{reduce, Action, QuizState};
use crate::views;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub questions: Vec<Question>,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub questions: Vec<Question>,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeset_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub state: QuizState,
    pub action: Action,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub state: QuizState,
    pub status: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeset_delay_ms: Option<u64>,
}

pub async fn render_questions(Json(payload): Json<RenderRequest>) -> Markup {
    views::question_list(&payload.questions)
}

pub async fn reorder_questions(Json(payload): Json<ReorderRequest>) -> Result<Json<ReorderResponse>> {
    let len = payload.questions.len();
    if payload.from >= len || payload.to >= len {
        return Err(Error::BadRequest(format!(
            "positions {} -> {} out of range for {} questions",
            payload.from, payload.to, len
        )));
    }

    let state = reduce(QuizState::default(), Action::ReplaceAll(payload.questions));
    let outcome = presentation::on_drag_end(state, payload.from, payload.to);
    let html = views::question_list(&outcome.state.questions).into_string();

    Ok(Json(ReorderResponse {
        questions: outcome.state.questions,
        html,
        typeset_delay_ms: outcome.typeset.map(|t| t.delay_ms()),
    }))
}

/// Run one page action through the reducer and return the next state with
/// everything the page needs to redraw.
pub async fn dispatch_action(Json(payload): Json<DispatchRequest>) -> Json<DispatchResponse> {
    tracing::debug!(action = ?payload.action, "Dispatching page action");
    let outcome = presentation::dispatch(payload.state, payload.action);

    Json(DispatchResponse {
        status: views::status_text(&outcome.state),
        html: views::question_list(&outcome.state.questions).into_string(),
        typeset_delay_ms: outcome.typeset.map(|t| t.delay_ms()),
        state: outcome.state,
    })
}
