use maud::Markup;

use crate::store::QuizState;
use crate::views;

pub async fn index() -> Markup {
    views::page(&QuizState::default())
}
