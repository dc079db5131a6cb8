pub mod health;
pub mod index;
pub mod questions;
pub mod upload;
