//! Game engine for NotSoEasy, a patience with eight play stacks and four spare
//! stacks. Cards build down in suit; only Kings open an empty play stack.
//!
//! The engine owns the rules and the undo history. A front end reads the
//! stacks of [`history::StateManager::current_state`] and feeds moves back
//! through [`history::StateManager::play`].
pub mod action;
pub mod card;
pub mod deck;
pub mod history;
pub mod rules;
pub mod stack;
pub mod state;
