use crate::{
    card::{Card, DECK_SIZE, Rank, Suit},
    rules::StackRules,
    stack::CardStack,
};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// One face-up card of every suit and rank, suits in order, Ace to King
/// within each suit.
pub fn new_deck() -> CardStack {
    let mut deck = CardStack::new(StackRules::Unrestricted);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(suit, rank));
        }
    }
    debug_assert_eq!(deck.len(), DECK_SIZE);
    deck
}

pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> CardStack {
    let mut deck = new_deck();
    deck.shuffle(rng);
    deck
}

pub fn seeded_deck(seed: u64) -> CardStack {
    shuffled_deck(&mut StdRng::seed_from_u64(seed))
}

impl CardStack {
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards_mut().shuffle(rng);
    }
}
