use crate::{
    card::{Card, Rank},
    stack::CardStack,
};

use log::trace;

/// Move-legality policy bound to a [`CardStack`].
///
/// The policies carry no data, so every stack of a kind shares the same
/// value and copying it is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackRules {
    /// Everything is allowed. Used for loose buffers such as a deck.
    #[default]
    Unrestricted,
    /// Tableau stacks: descending same-suit runs, Kings seed empty stacks.
    Play,
    /// Reserve stacks: never accept drops, resolved once drawn empty.
    Spare,
}

impl StackRules {
    /// Whether `card` may be dropped on `target`.
    pub fn valid_move(&self, card: &Card, target: &CardStack) -> bool {
        match self {
            StackRules::Unrestricted => true,
            StackRules::Spare => false,
            StackRules::Play => {
                let valid = match target.top() {
                    Some(top) => {
                        card.suit() == top.suit() && card.rank().successor() == Some(top.rank())
                    }
                    None => card.rank() == Rank::King,
                };
                trace!(
                    "play rule: {} onto {} -> {valid}",
                    card.to_pretty_string(),
                    target
                        .top()
                        .map(|c| c.to_pretty_string())
                        .unwrap_or_else(|| "empty".into()),
                );
                valid
            }
        }
    }

    /// Whether the run `source` may be dropped on `target`.
    ///
    /// Only the bottom card of the run is checked; the run itself is assumed
    /// to be in order already. An empty run is never a valid move for the
    /// ruled policies.
    pub fn valid_run_move(&self, source: &CardStack, target: &CardStack) -> bool {
        match self {
            StackRules::Unrestricted => true,
            StackRules::Spare => false,
            StackRules::Play => source
                .bottom()
                .is_some_and(|card| self.valid_move(card, target)),
        }
    }

    pub fn is_completed(&self, stack: &CardStack) -> bool {
        match self {
            StackRules::Unrestricted => true,
            StackRules::Spare => stack.is_empty(),
            StackRules::Play => {
                if stack.is_empty() {
                    return true;
                }
                if stack.len() < Rank::ALL.len() || stack.contains_covered() {
                    return false;
                }
                stack.cards().windows(2).all(|pair| {
                    pair[0].suit() == pair[1].suit() || pair[0].position_cmp(&pair[1]).is_gt()
                })
            }
        }
    }

    pub fn is_playable(&self, stack: &CardStack) -> bool {
        match self {
            StackRules::Unrestricted | StackRules::Spare => true,
            StackRules::Play => play_stack_is_playable(stack),
        }
    }
}

/// A face-down card is only exposed once the card resting on it leaves as the
/// lead of a run. That card can land on its same-suit successor or, if it is a
/// King, on an empty stack. When the successor is buried at or under the
/// face-down card, neither can ever happen.
fn play_stack_is_playable(stack: &CardStack) -> bool {
    if !stack.contains_covered() {
        return true;
    }
    let cards = stack.cards();
    for i in (1..cards.len()).rev() {
        if !cards[i - 1].is_face_down() {
            continue;
        }
        let mover = &cards[i];
        let Some(needed) = mover.rank().successor() else {
            continue;
        };
        let blocked = cards[..i]
            .iter()
            .any(|card| card.suit() == mover.suit() && card.rank() == needed);
        if blocked {
            trace!(
                "play rule: {} can only land on a card buried beneath it",
                mover.to_pretty_string()
            );
            return false;
        }
    }
    true
}
