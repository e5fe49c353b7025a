//! Input state: which movement actions are held and where the cursor is.
//!
//! Platform layers translate raw key events into [`Action`]s; the movement
//! resolver only ever reads an [`InputState`].
//!
//! # Invariants
//! - Opposing actions cancel: holding both up and down yields a zero Y axis.
//! - Focus loss releases every held action.

pub mod action;

pub use action::{Action, InputState};
