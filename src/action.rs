use crate::state::{GameState, PileId};

use anyhow::{Context, Result, bail};
use log::{debug, warn};

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Carry the top `count` cards of `from` onto `to`.
    Move {
        from: PileId,
        to: PileId,
        count: usize,
    },
    /// Turn over the face-down top card of a stack.
    Flip(PileId),
}

impl Action {
    /// Reads `P1:P3`, `P1:P3@2`, `S2:P5` or `^P4`.
    pub fn parse(s: &str) -> Result<Self> {
        let part_ctx = || format!("Failed to parse move '{s}'");
        if let Some(pile) = s.strip_prefix('^') {
            return Ok(Action::Flip(PileId::parse(pile).with_context(part_ctx)?));
        }
        let Some((from_str, to_part)) = s.split_once(':') else {
            bail!("Unknown move format: {s}");
        };
        let (to_str, count) = match to_part.split_once('@') {
            Some((to_s, count_s)) => (to_s, count_s.parse::<usize>().with_context(part_ctx)?),
            None => (to_part, 1),
        };
        Ok(Action::Move {
            from: PileId::parse(from_str).with_context(part_ctx)?,
            to: PileId::parse(to_str).with_context(part_ctx)?,
            count,
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { from, to, count } if *count > 1 => write!(f, "{from}:{to}@{count}"),
            Action::Move { from, to, .. } => write!(f, "{from}:{to}"),
            Action::Flip(pile) => write!(f, "^{pile}"),
        }
    }
}

pub fn parse_actions(s: &str) -> Result<Vec<Action>> {
    s.split_whitespace().map(Action::parse).collect()
}

pub fn format_actions(actions: &[Action]) -> String {
    let list: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }
    output
}

/// Applies `action` to `state` the way a drag on the table does.
///
/// Returns `Ok(false)` and leaves the state untouched when the rules reject
/// the move, and an error when the request itself makes no sense for the
/// state (unknown stack, bad count, grabbing a face-down card).
pub fn apply_action(state: &mut GameState, action: &Action) -> Result<bool> {
    match *action {
        Action::Flip(pile) => {
            let stack = state
                .pile_mut(pile)
                .with_context(|| format!("No such stack {pile}"))?;
            let flipped = stack.flip_top();
            if !flipped {
                debug!("{pile}: nothing to turn over");
            }
            Ok(flipped)
        }
        Action::Move { from, to, count } => {
            let Some((source, target)) = state.pile_pair_mut(from, to) else {
                warn!("{action}: invalid stacks");
                bail!("Invalid source or target in {action}");
            };
            let len = source.len();
            if count == 0 || count > len {
                warn!("{action}: {from} holds {len} cards");
                bail!("Cannot move {count} cards from {from}, it holds {len}");
            }
            if source.cards()[len - count].is_face_down() {
                warn!("{action}: run starts on a face-down card");
                bail!("Cannot pick up a face-down card from {from}");
            }
            if !matches!(to, PileId::Play(_)) {
                debug!("{action}: cards only land on play stacks");
                return Ok(false);
            }

            let mut run = source.pop_n(count)?;
            if target.try_push_stack(&mut run) {
                debug!("{action}: applied");
                Ok(true)
            } else {
                source.push_stack(&mut run);
                Ok(false)
            }
        }
    }
}

/// Human readable form of `action` against `state`, e.g.
/// `(P2) 9♥8♥ -> (P5) T♥`.
pub fn describe_action(state: &GameState, action: &Action) -> String {
    let top_of = |pile: PileId| -> String {
        state
            .pile(pile)
            .and_then(|stack| stack.top())
            .map(|c| c.to_pretty_string())
            .unwrap_or_default()
    };

    match *action {
        Action::Flip(pile) => format!("Turn over ({pile}) {}", top_of(pile)),
        Action::Move { from, to, count } => {
            let from_cards = state
                .pile(from)
                .map(|stack| {
                    stack
                        .iter()
                        .skip(stack.len().saturating_sub(count))
                        .map(|c| c.to_pretty_string())
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            format!("({from}) {from_cards} -> ({to}) {}", top_of(to))
        }
    }
}
