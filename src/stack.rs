use crate::{card::Card, rules::StackRules};

use anyhow::{Result, bail};
use log::debug;
use smallvec::SmallVec;

const STACK_INLINE: usize = 19;

/// An ordered pile of cards, bottom first, bound to a [`StackRules`] policy.
///
/// `push`/`push_stack` never consult the rules; `try_push`/`try_push_stack`
/// are the only checked entry points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardStack {
    cards: SmallVec<[Card; STACK_INLINE]>,
    rules: StackRules,
}

impl CardStack {
    pub fn new(rules: StackRules) -> Self {
        Self {
            cards: SmallVec::new(),
            rules,
        }
    }

    pub fn from_cards(rules: StackRules, cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            rules,
        }
    }

    pub fn rules(&self) -> StackRules {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards from bottom to top.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn bottom(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn element_at(&self, index: usize) -> Result<&Card> {
        match self.cards.get(index) {
            Some(card) => Ok(card),
            None => bail!(
                "Card index {index} out of range for a stack of {}",
                self.cards.len()
            ),
        }
    }

    /// Index of the lowest face-up card.
    pub fn first_face_up(&self) -> Option<usize> {
        self.cards.iter().position(|card| !card.is_face_down())
    }

    pub fn contains_covered(&self) -> bool {
        self.cards.iter().any(|card| card.is_face_down())
    }

    pub fn is_completed(&self) -> bool {
        self.rules.is_completed(self)
    }

    pub fn is_playable(&self) -> bool {
        self.rules.is_playable(self)
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Moves every card of `other` onto this stack, bottom card first,
    /// leaving `other` empty.
    pub fn push_stack(&mut self, other: &mut CardStack) {
        self.cards.extend(other.cards.drain(..));
    }

    pub fn try_push(&mut self, card: Card) -> bool {
        if self.rules.valid_move(&card, self) {
            self.push(card);
            true
        } else {
            debug!("{} rejected {}", self.rules_name(), card.to_pretty_string());
            false
        }
    }

    pub fn try_push_stack(&mut self, other: &mut CardStack) -> bool {
        if self.rules.valid_run_move(other, self) {
            self.push_stack(other);
            true
        } else {
            debug!("{} rejected a run of {}", self.rules_name(), other.len());
            false
        }
    }

    pub fn pop(&mut self) -> Result<Card> {
        match self.cards.pop() {
            Some(card) => Ok(card),
            None => bail!("Cannot pop from an empty stack"),
        }
    }

    /// Detaches the top `count` cards into a new stack with the same rules,
    /// keeping their bottom-to-top order.
    pub fn pop_n(&mut self, count: usize) -> Result<CardStack> {
        let len = self.cards.len();
        if count == 0 || count > len {
            bail!("Cannot pop {count} cards from a stack of {len}");
        }
        let mut detached = CardStack::new(self.rules);
        for _ in 0..count {
            detached.push(self.pop()?);
        }
        detached.reverse();
        Ok(detached)
    }

    /// Detaches `card` and everything above it.
    pub fn pop_from(&mut self, card: &Card) -> Result<CardStack> {
        match self.cards.iter().position(|c| c == card) {
            Some(index) => self.pop_n(self.cards.len() - index),
            None => bail!("Card {} is not in the stack", card.to_pretty_string()),
        }
    }

    pub fn reverse(&mut self) {
        self.cards.reverse();
    }

    /// Turns a face-down top card face-up. Returns whether a card was turned.
    pub fn flip_top(&mut self) -> bool {
        match self.cards.last_mut() {
            Some(card) if card.is_face_down() => {
                card.flip();
                true
            }
            _ => false,
        }
    }

    /// Short form of the cards, bottom first. When the stack holds face-down
    /// cards, `|` separates them from the face-up ones.
    pub fn to_pretty_string(&self) -> String {
        let mut output = String::new();
        let sep = self
            .contains_covered()
            .then(|| self.first_face_up().unwrap_or(self.cards.len()));
        for (i, card) in self.cards.iter().enumerate() {
            if Some(i) == sep {
                output.push('|');
            }
            output.push_str(&card.to_pretty_string());
        }
        if sep == Some(self.cards.len()) {
            output.push('|');
        }
        output
    }

    fn rules_name(&self) -> &'static str {
        match self.rules {
            StackRules::Unrestricted => "unrestricted stack",
            StackRules::Play => "play stack",
            StackRules::Spare => "spare stack",
        }
    }
}

impl<'a> IntoIterator for &'a CardStack {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Facing, Rank, Suit};

    fn hearts(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|&r| Card::new(Suit::Hearts, r)).collect()
    }

    #[test]
    fn test_top_and_element_at() {
        let mut stack = CardStack::new(StackRules::Play);
        assert!(stack.top().is_none());
        assert!(stack.element_at(0).is_err());

        stack.push(Card::new(Suit::Clubs, Rank::Two));
        stack.push(Card::new(Suit::Clubs, Rank::Three));
        assert_eq!(stack.top(), Some(&Card::new(Suit::Clubs, Rank::Three)));
        assert_eq!(
            stack.element_at(0).unwrap(),
            &Card::new(Suit::Clubs, Rank::Two)
        );
        assert!(stack.element_at(2).is_err());
    }

    #[test]
    fn test_pop_empty_fails() {
        let mut stack = CardStack::default();
        assert!(stack.pop().is_err());
        assert!(stack.pop_n(1).is_err());
    }

    #[test]
    fn test_pop_n_keeps_order_and_rules() {
        let cards = hearts(&[Rank::King, Rank::Queen, Rank::Jack, Rank::Ten]);
        let mut stack = CardStack::from_cards(StackRules::Play, cards.clone());

        let run = stack.pop_n(3).unwrap();
        assert_eq!(run.cards(), &cards[1..]);
        assert_eq!(run.rules(), StackRules::Play);
        assert_eq!(stack.cards(), &cards[..1]);
    }

    #[test]
    fn test_pop_n_bounds() {
        let cards = hearts(&[Rank::King, Rank::Queen]);
        let mut stack = CardStack::from_cards(StackRules::Play, cards.clone());
        assert!(stack.pop_n(0).is_err());
        assert!(stack.pop_n(3).is_err());
        assert_eq!(stack.cards(), &cards[..]);

        let all = stack.pop_n(2).unwrap();
        assert!(stack.is_empty());
        assert_eq!(all.cards(), &cards[..]);
    }

    #[test]
    fn test_pop_from_card() {
        let cards = hearts(&[Rank::Nine, Rank::Eight, Rank::Seven, Rank::Six]);
        let mut stack = CardStack::from_cards(StackRules::Play, cards.clone());

        let run = stack.pop_from(&cards[1]).unwrap();
        assert_eq!(run.cards(), &cards[1..]);
        assert_eq!(stack.cards(), &cards[..1]);

        assert!(stack.pop_from(&cards[2]).is_err());
        // Facing is part of identity.
        assert!(stack.pop_from(&cards[0].flipped()).is_err());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_push_stack_drains_source() {
        let mut target = CardStack::from_cards(StackRules::Play, hearts(&[Rank::King]));
        let mut source = CardStack::from_cards(StackRules::Play, hearts(&[Rank::Two, Rank::Ace]));
        target.push_stack(&mut source);
        assert!(source.is_empty());
        assert_eq!(target.cards(), &hearts(&[Rank::King, Rank::Two, Rank::Ace])[..]);
    }

    #[test]
    fn test_try_push_rejects_without_mutation() {
        let mut target = CardStack::from_cards(StackRules::Play, hearts(&[Rank::Ten]));
        assert!(target.try_push(Card::new(Suit::Hearts, Rank::Nine)));
        assert!(!target.try_push(Card::new(Suit::Clubs, Rank::Eight)));
        assert_eq!(target.len(), 2);

        let mut run = CardStack::from_cards(StackRules::Play, hearts(&[Rank::Seven, Rank::Six]));
        assert!(!target.try_push_stack(&mut run));
        assert_eq!(run.len(), 2);
        assert_eq!(target.len(), 2);

        let mut run = CardStack::from_cards(StackRules::Play, hearts(&[Rank::Eight, Rank::Seven]));
        assert!(target.try_push_stack(&mut run));
        assert!(run.is_empty());
        assert_eq!(target.len(), 4);
    }

    #[test]
    fn test_try_push_empty_play_stack() {
        let mut target = CardStack::new(StackRules::Play);
        assert!(!target.try_push(Card::new(Suit::Spades, Rank::Queen)));
        assert!(target.try_push(Card::new(Suit::Spades, Rank::King)));
    }

    #[test]
    fn test_spare_stack_rejects_drops() {
        let card = Card::new(Suit::Diamonds, Rank::Five);
        let mut spare = CardStack::from_cards(StackRules::Spare, [card]);
        assert!(!spare.try_push(Card::new(Suit::Diamonds, Rank::Four)));
        assert_eq!(spare.cards(), &[card]);
        assert!(!spare.is_completed());
        spare.pop().unwrap();
        assert!(spare.is_completed());
    }

    #[test]
    fn test_reverse() {
        let cards = hearts(&[Rank::Ace, Rank::Two, Rank::Three]);
        let mut stack = CardStack::from_cards(StackRules::Unrestricted, cards.clone());
        stack.reverse();
        let reversed: Vec<_> = cards.iter().rev().copied().collect();
        assert_eq!(stack.cards(), &reversed[..]);
    }

    #[test]
    fn test_first_face_up_and_covered() {
        let mut stack = CardStack::new(StackRules::Play);
        assert_eq!(stack.first_face_up(), None);
        stack.push(Card::with_facing(Suit::Clubs, Rank::Two, Facing::FaceDown));
        assert_eq!(stack.first_face_up(), None);
        assert!(stack.contains_covered());
        stack.push(Card::new(Suit::Clubs, Rank::Three));
        assert_eq!(stack.first_face_up(), Some(1));
        assert_eq!(stack.to_pretty_string(), "2♣|3♣");
    }

    #[test]
    fn test_flip_top() {
        let mut stack = CardStack::new(StackRules::Play);
        assert!(!stack.flip_top());
        stack.push(Card::with_facing(Suit::Clubs, Rank::Two, Facing::FaceDown));
        assert!(stack.flip_top());
        assert!(!stack.contains_covered());
        assert!(!stack.flip_top());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut stack = CardStack::from_cards(StackRules::Play, hearts(&[Rank::King, Rank::Queen]));
        let copy = stack.clone();
        stack.cards_mut()[0].flip();
        stack.pop().unwrap();
        assert_eq!(copy.len(), 2);
        assert!(!copy.contains_covered());
        assert_eq!(copy.rules(), StackRules::Play);
    }
}
