use crate::store::{reduce, Action, QuizState};
use std::time::Duration;

pub const TYPESET_DELAY: Duration = Duration::from_millis(100);

/// Request to re-run math typesetting after the list changed. The page waits
/// `delay` before typesetting and ignores typeset failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypesetRefresh {
    pub delay: Duration,
}

impl TypesetRefresh {
    pub fn delay_ms(self) -> u64 {
        self.delay.as_millis() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: QuizState,
    pub typeset: Option<TypesetRefresh>,
}

/// Handle the end of a drag gesture. Dropping an item where it started is a
/// no-op and schedules nothing.
pub fn on_drag_end(state: QuizState, origin: usize, dropped: usize) -> Transition {
    if origin == dropped {
        return Transition {
            state,
            typeset: None,
        };
    }

    tracing::debug!(origin, dropped, "Reordering questions after drag");
    Transition {
        state: reduce(
            state,
            Action::Reorder {
                from: origin,
                to: dropped,
            },
        ),
        typeset: Some(TypesetRefresh {
            delay: TYPESET_DELAY,
        }),
    }
}

/// Apply a page action. A typeset refresh is scheduled whenever the rendered
/// list is non-empty and differs from before.
pub fn dispatch(state: QuizState, action: Action) -> Transition {
    if let Action::Reorder { from, to } = action {
        return on_drag_end(state, from, to);
    }

    let before = state.questions.clone();
    let next = reduce(state, action);
    let typeset = (!next.questions.is_empty() && next.questions != before).then_some(
        TypesetRefresh {
            delay: TYPESET_DELAY,
        },
    );
    Transition {
        state: next,
        typeset,
    }
}
