mod card;
mod error;
mod game;
mod rules;
mod save_load;
mod session;
mod stack;
mod undo;

pub use card::{Card, Rank, Suit};
pub use error::EngineError;
pub use game::{Board, Move};
pub use save_load::*;
pub use session::{GameEvent, Session};
pub use stack::Stack;
