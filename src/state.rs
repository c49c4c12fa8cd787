use crate::{
    card::{Card, DECK_SIZE},
    deck::shuffled_deck,
    rules::StackRules,
    stack::CardStack,
};

use anyhow::{Context, Result, anyhow, bail};
use rand::Rng;
use rustc_hash::FxHashSet;

use std::fmt;

pub const PLAY_STACKS: usize = 8;
pub const SPARE_STACKS: usize = 4;
pub const DEAL_SIZE: usize = 6;
pub const COVERED_PER_ODD_STACK: usize = 3;

/// Address of a stack inside a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PileId {
    Play(usize),
    Spare(usize),
}

impl PileId {
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix('P') {
            Ok(PileId::Play(parse_index(rest)?))
        } else if let Some(rest) = s.strip_prefix('S') {
            Ok(PileId::Spare(parse_index(rest)?))
        } else {
            bail!("Invalid pile identifier: {s}")
        }
    }
}

impl fmt::Display for PileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PileId::Play(idx) => write!(f, "P{}", idx + 1),
            PileId::Spare(idx) => write!(f, "S{}", idx + 1),
        }
    }
}

/// The table at one point of a game: eight play stacks and four spare stacks.
///
/// `Clone` is a deep copy; stacks keep their rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    play_stacks: [CardStack; PLAY_STACKS],
    spare_stacks: [CardStack; SPARE_STACKS],
}

impl GameState {
    /// Deals from the top of `deck`: six cards to each play stack, then one to
    /// each spare stack. The bottom three cards of the 2nd, 4th, 6th and 8th
    /// play stacks are turned over.
    pub fn deal(deck: &mut CardStack) -> Result<Self> {
        if deck.len() < DECK_SIZE {
            bail!(
                "A deal needs {DECK_SIZE} cards, the deck holds {}",
                deck.len()
            );
        }

        let mut play_stacks: [CardStack; PLAY_STACKS] =
            std::array::from_fn(|_| CardStack::new(StackRules::Play));
        for (i, stack) in play_stacks.iter_mut().enumerate() {
            let mut dealt = deck.pop_n(DEAL_SIZE)?;
            stack.push_stack(&mut dealt);
            if i % 2 != 0 {
                for card in &mut stack.cards_mut()[..COVERED_PER_ODD_STACK] {
                    card.flip();
                }
            }
        }

        let mut spare_stacks: [CardStack; SPARE_STACKS] =
            std::array::from_fn(|_| CardStack::new(StackRules::Spare));
        for stack in spare_stacks.iter_mut() {
            stack.push(deck.pop()?);
        }

        Ok(Self {
            play_stacks,
            spare_stacks,
        })
    }

    pub fn new_random<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Self::deal(&mut shuffled_deck(rng))
    }

    /// A table with every stack empty.
    pub fn empty() -> Self {
        Self {
            play_stacks: std::array::from_fn(|_| CardStack::new(StackRules::Play)),
            spare_stacks: std::array::from_fn(|_| CardStack::new(StackRules::Spare)),
        }
    }

    pub fn play_stacks(&self) -> &[CardStack; PLAY_STACKS] {
        &self.play_stacks
    }

    pub fn play_stacks_mut(&mut self) -> &mut [CardStack; PLAY_STACKS] {
        &mut self.play_stacks
    }

    pub fn spare_stacks(&self) -> &[CardStack; SPARE_STACKS] {
        &self.spare_stacks
    }

    pub fn spare_stacks_mut(&mut self) -> &mut [CardStack; SPARE_STACKS] {
        &mut self.spare_stacks
    }

    pub fn pile(&self, id: PileId) -> Option<&CardStack> {
        match id {
            PileId::Play(idx) => self.play_stacks.get(idx),
            PileId::Spare(idx) => self.spare_stacks.get(idx),
        }
    }

    pub fn pile_mut(&mut self, id: PileId) -> Option<&mut CardStack> {
        match id {
            PileId::Play(idx) => self.play_stacks.get_mut(idx),
            PileId::Spare(idx) => self.spare_stacks.get_mut(idx),
        }
    }

    /// Mutable access to two different piles at once.
    pub fn pile_pair_mut(
        &mut self,
        first: PileId,
        second: PileId,
    ) -> Option<(&mut CardStack, &mut CardStack)> {
        if first == second {
            return None;
        }
        match (first, second) {
            (PileId::Play(a), PileId::Play(b)) => pair_mut(&mut self.play_stacks, a, b),
            (PileId::Spare(a), PileId::Spare(b)) => pair_mut(&mut self.spare_stacks, a, b),
            (PileId::Play(a), PileId::Spare(b)) => Some((
                self.play_stacks.get_mut(a)?,
                self.spare_stacks.get_mut(b)?,
            )),
            (PileId::Spare(a), PileId::Play(b)) => Some((
                self.spare_stacks.get_mut(a)?,
                self.play_stacks.get_mut(b)?,
            )),
        }
    }

    pub fn card_count(&self) -> usize {
        self.stacks().map(CardStack::len).sum()
    }

    /// Every stack, play stacks first.
    pub fn stacks(&self) -> impl Iterator<Item = &CardStack> {
        self.play_stacks.iter().chain(self.spare_stacks.iter())
    }

    pub fn is_completed(&self) -> bool {
        self.stacks().all(CardStack::is_completed)
    }

    /// Checks the play stacks at even positions only; each is paired with
    /// the odd stack that follows it.
    pub fn is_playable(&self) -> bool {
        self.play_stacks.iter().step_by(2).all(CardStack::is_playable)
    }

    /// Exactly one of each card across the whole table.
    pub fn is_valid(&self) -> bool {
        let mut seen = FxHashSet::default();
        for card in self.stacks().flat_map(CardStack::iter) {
            if !seen.insert((card.suit(), card.rank())) {
                return false;
            }
        }
        seen.len() == DECK_SIZE
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut state = Self::empty();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Failed to parse at '{line}'");
            let (name, cards_str) = line
                .split_once(':')
                .ok_or_else(|| anyhow!("Missing ':'"))
                .with_context(line_context)?;
            let id = if let Some(idx) = name.strip_prefix("Play") {
                PileId::Play(parse_index(idx).with_context(line_context)?)
            } else if let Some(idx) = name.strip_prefix("Spare") {
                PileId::Spare(parse_index(idx).with_context(line_context)?)
            } else {
                bail!("Failed to parse at '{line}': unknown stack '{name}'");
            };
            let stack = state
                .pile_mut(id)
                .ok_or_else(|| anyhow!("No such stack {id}"))
                .with_context(line_context)?;

            let cards_str = cards_str.trim();
            let (before, after) = cards_str.split_once('|').unwrap_or(("", cards_str));
            for card in parse_cards(before.trim()).with_context(line_context)? {
                stack.push(card.flipped());
            }
            for card in parse_cards(after.trim()).with_context(line_context)? {
                stack.push(card);
            }
        }

        let mut seen = FxHashSet::default();
        for card in state.stacks().flat_map(CardStack::iter) {
            if !seen.insert((card.suit(), card.rank())) {
                bail!("Duplicate card {}", card.to_pretty_string());
            }
        }

        Ok(state)
    }

    pub fn to_pretty_string(&self) -> String {
        let mut lines = Vec::new();
        for (i, stack) in self.play_stacks.iter().enumerate() {
            if !stack.is_empty() {
                lines.push(format!("Play{}: {}", i + 1, stack.to_pretty_string()));
            }
        }
        for (i, stack) in self.spare_stacks.iter().enumerate() {
            if !stack.is_empty() {
                lines.push(format!("Spare{}: {}", i + 1, stack.to_pretty_string()));
            }
        }
        lines.join("\n")
    }
}

fn pair_mut<const N: usize>(
    stacks: &mut [CardStack; N],
    a: usize,
    b: usize,
) -> Option<(&mut CardStack, &mut CardStack)> {
    if a >= N || b >= N {
        return None;
    }
    if a < b {
        let (lo, hi) = stacks.split_at_mut(b);
        Some((&mut lo[a], &mut hi[0]))
    } else {
        let (lo, hi) = stacks.split_at_mut(a);
        Some((&mut hi[0], &mut lo[b]))
    }
}

fn parse_index(s: &str) -> Result<usize> {
    let idx = s
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid index '{s}'"))?;
    idx.checked_sub(1).context("Indices start at 1")
}

fn parse_cards(s: &str) -> Result<Vec<Card>> {
    let mut cards = Vec::new();
    let mut chars = s.chars().filter(|c| !c.is_whitespace());
    while let Some(rank) = chars.next() {
        let suit = chars
            .next()
            .with_context(|| format!("Missing suit after '{rank}'"))?;
        cards.push(Card::parse(rank, suit)?);
    }
    Ok(cards)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::{
        action::{Action, apply_action},
        history::StateManager,
    };

    use proptest::prelude::*;

    /// Every move and turn-over the rules accept in `state`.
    fn legal_actions(state: &GameState) -> Vec<Action> {
        let piles = (0..PLAY_STACKS)
            .map(PileId::Play)
            .chain((0..SPARE_STACKS).map(PileId::Spare));
        let mut actions = Vec::new();
        for from in piles {
            let len = state.pile(from).map_or(0, CardStack::len);
            actions.push(Action::Flip(from));
            for to in (0..PLAY_STACKS).map(PileId::Play) {
                for count in 1..=len {
                    actions.push(Action::Move { from, to, count });
                }
            }
        }
        actions.retain(|action| {
            let mut scratch = state.clone();
            matches!(apply_action(&mut scratch, action), Ok(true))
        });
        actions
    }

    proptest! {
        #[test]
        fn prop_played_states_round_trip_through_text(seed in any::<u64>(), picks in prop::collection::vec(any::<prop::sample::Index>(), 1..30)) {
            let mut manager = StateManager::with_seed(seed);
            manager.init().unwrap();
            for pick in picks {
                let state = manager.current_state().unwrap();
                let actions = legal_actions(state);
                if actions.is_empty() {
                    break;
                }
                let action = *pick.get(&actions);
                prop_assert!(manager.play(&action).unwrap());

                let state = manager.current_state().unwrap();
                prop_assert!(state.is_valid());
                let parsed = GameState::parse(&state.to_pretty_string()).unwrap();
                prop_assert_eq!(&parsed, state);
            }
        }
    }
}
