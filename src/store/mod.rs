//! Browser-side quiz state, expressed as pure reducer functions.
//!
//! Nothing here mutates shared memory: every operation takes the current
//! [`QuizState`] by value and returns the next one.

use crate::models::question::Question;
use serde::{Deserialize, Serialize};

/// Lifecycle of a single upload: `Idle -> Loading -> {Ready, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizState {
    pub phase: UploadPhase,
    pub questions: Vec<Question>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Wire form is `{"type": "reorder", "payload": {"from": 3, "to": 0}}`;
/// unit actions omit `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    ReplaceAll(Vec<Question>),
    Reorder { from: usize, to: usize },
    SetLoading(bool),
    SetError(Option<String>),
    UploadStarted,
    UploadSucceeded(Vec<Question>),
    UploadFailed(String),
}

pub fn reduce(state: QuizState, action: Action) -> QuizState {
    match action {
        Action::ReplaceAll(questions) => QuizState { questions, ..state },
        Action::Reorder { from, to } => QuizState {
            questions: reorder(state.questions, from, to),
            ..state
        },
        Action::SetLoading(loading) => QuizState { loading, ..state },
        Action::SetError(error) => QuizState { error, ..state },
        Action::UploadStarted => QuizState {
            phase: UploadPhase::Loading,
            loading: true,
            error: None,
            ..state
        },
        Action::UploadSucceeded(questions) => QuizState {
            phase: UploadPhase::Ready,
            questions,
            loading: false,
            error: None,
        },
        Action::UploadFailed(message) => QuizState {
            phase: UploadPhase::Failed,
            questions: Vec::new(),
            loading: false,
            error: Some(message),
        },
    }
}

/// Move the element at display position `from` to display position `to`,
/// then rewrite every `index` as `position + 1`.
///
/// Out-of-range positions leave the order untouched.
pub fn reorder(mut questions: Vec<Question>, from: usize, to: usize) -> Vec<Question> {
    if from < questions.len() && to < questions.len() && from != to {
        let moved = questions.remove(from);
        questions.insert(to, moved);
    }
    reindex(&mut questions);
    questions
}

pub fn reindex(questions: &mut [Question]) {
    for (position, q) in questions.iter_mut().enumerate() {
        q.index = (position as u32) + 1;
    }
}
