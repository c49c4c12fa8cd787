use crate::{
    action::{Action, apply_action},
    deck::shuffled_deck,
    state::GameState,
};

use anyhow::{Context, Result};
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut()>;

/// Linear undo/redo history of [`GameState`] snapshots.
///
/// The manager hands out a working copy of the snapshot under the cursor.
/// Callers mutate that copy freely; it only enters the history through
/// [`StateManager::commit`]. Committing after an undo drops every snapshot
/// past the cursor.
///
/// Listeners are called with no payload after every change and read
/// [`StateManager::current_state`] themselves.
pub struct StateManager {
    states: Vec<GameState>,
    cursor: usize,
    current: Option<GameState>,
    rng: StdRng,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl StateManager {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deals are reproducible: the same seed yields the same sequence of games.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            states: Vec::new(),
            cursor: 0,
            current: None,
            rng,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Shuffles a new deck and starts a fresh history from its deal.
    pub fn init(&mut self) -> Result<()> {
        let mut deck = shuffled_deck(&mut self.rng);
        let state = GameState::deal(&mut deck).context("Failed to deal a new game")?;
        info!("new game dealt");
        self.start(state);
        Ok(())
    }

    /// Abandons the game in progress and deals the next one.
    pub fn new_game(&mut self) -> Result<()> {
        if self.can_undo() || self.can_redo() {
            debug!("discarding {} snapshots", self.states.len());
        }
        self.init()
    }

    /// Starts a fresh history from a given position.
    pub fn start(&mut self, state: GameState) {
        self.states.clear();
        self.states.push(state);
        self.cursor = 0;
        self.publish();
    }

    pub fn is_started(&self) -> bool {
        !self.states.is_empty()
    }

    /// The live working copy. `None` before the first game is started.
    pub fn current_state(&self) -> Option<&GameState> {
        self.current.as_ref()
    }

    pub fn current_state_mut(&mut self) -> Option<&mut GameState> {
        self.current.as_mut()
    }

    /// Records the working copy as the next snapshot. Returns `false` before
    /// the first game.
    pub fn commit(&mut self) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        if self.cursor + 1 < self.states.len() {
            debug!(
                "dropping {} redo snapshots",
                self.states.len() - self.cursor - 1
            );
            self.states.truncate(self.cursor + 1);
        }
        self.states.push(current.clone());
        self.cursor += 1;
        debug!("committed snapshot {}", self.cursor);
        self.notify();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        debug!("undo to snapshot {}", self.cursor);
        self.publish();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        debug!("redo to snapshot {}", self.cursor);
        self.publish();
        true
    }

    /// Goes back to the original deal, keeping the rest of the history
    /// reachable through redo.
    pub fn reset(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = 0;
        debug!("reset to the original deal");
        self.publish();
        true
    }

    /// Applies `action` to the working copy and commits it when legal.
    pub fn play(&mut self, action: &Action) -> Result<bool> {
        let current = self
            .current
            .as_mut()
            .context("No game in progress, deal one first")?;
        if !apply_action(current, action)? {
            return Ok(false);
        }
        self.commit();
        if self.current.as_ref().is_some_and(GameState::is_completed) {
            info!("game completed after {} moves", self.cursor);
        }
        Ok(true)
    }

    pub fn history_len(&self) -> usize {
        self.states.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn publish(&mut self) {
        self.current = self.states.get(self.cursor).cloned();
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::state::PLAY_STACKS;

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_undo_then_redo_restores(seed in any::<u64>(), moves in prop::collection::vec((0..PLAY_STACKS, 0..PLAY_STACKS), 1..12)) {
            let mut manager = StateManager::with_seed(seed);
            manager.init().unwrap();
            for (from, to) in moves {
                if from == to {
                    continue;
                }
                let state = manager.current_state_mut().unwrap();
                if let Ok(card) = state.play_stacks_mut()[from].pop() {
                    state.play_stacks_mut()[to].push(card);
                    manager.commit();
                }

                let before = manager.current_state().cloned();
                if manager.undo() {
                    prop_assert!(manager.redo());
                    prop_assert_eq!(manager.current_state().cloned(), before);
                }
            }
            // Moves never create or lose cards.
            prop_assert!(manager.current_state().unwrap().is_valid());
        }
    }
}
