use anyhow::{Context, Result};

use std::{cmp::Ordering, fmt};

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const DECK_SIZE: usize = (MAX_SUIT * MAX_RANK) as usize;

const SUITS: [char; 4] = ['♠', '♣', '♥', '♦'];
const RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Clubs,
    Hearts,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Clubs, Suit::Hearts, Suit::Diamonds];

    pub fn color(&self) -> CardColor {
        match self {
            Suit::Spades | Suit::Clubs => CardColor::Black,
            Suit::Hearts | Suit::Diamonds => CardColor::Red,
        }
    }

    pub fn symbol(&self) -> char {
        SUITS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Suit::Spades => "Spades",
            Suit::Clubs => "Clubs",
            Suit::Hearts => "Hearts",
            Suit::Diamonds => "Diamonds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// The rank directly above this one, `None` for a King.
    pub fn successor(&self) -> Option<Rank> {
        Rank::ALL.get(self.index() as usize + 1).copied()
    }

    /// The rank directly below this one, `None` for an Ace.
    pub fn predecessor(&self) -> Option<Rank> {
        let idx = self.index().checked_sub(1)?;
        Rank::ALL.get(idx as usize).copied()
    }

    pub fn symbol(&self) -> char {
        RANKS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rank::Ace => "Ace",
            Rank::Two => "Two",
            Rank::Three => "Three",
            Rank::Four => "Four",
            Rank::Five => "Five",
            Rank::Six => "Six",
            Rank::Seven => "Seven",
            Rank::Eight => "Eight",
            Rank::Nine => "Nine",
            Rank::Ten => "Ten",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Facing {
    FaceDown,
    #[default]
    FaceUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardColor {
    Red,
    Black,
}

/// A playing card. Facing is the only part that changes during play.
///
/// Equality takes the facing into account, so a face-up King of Spades is not
/// equal to a face-down one. The derived ordering sorts by suit, then rank,
/// then facing, which keeps it consistent with equality; use
/// [`Card::position_cmp`] to compare positions regardless of facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card {
    suit: Suit,
    rank: Rank,
    facing: Facing,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self::with_facing(suit, rank, Facing::FaceUp)
    }

    pub fn with_facing(suit: Suit, rank: Rank, facing: Facing) -> Self {
        Self { suit, rank, facing }
    }

    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANKS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank at card {rank}{suit}"))?;
        let suit_idx = SUITS
            .iter()
            .position(|&s| s == suit)
            .with_context(|| format!("Invalid suit at card {rank}{suit}"))?;
        Ok(Card::new(Suit::ALL[suit_idx], Rank::ALL[rank_idx]))
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn color(&self) -> CardColor {
        self.suit.color()
    }

    pub fn is_face_down(&self) -> bool {
        self.facing == Facing::FaceDown
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    pub fn flip(&mut self) {
        self.facing = match self.facing {
            Facing::FaceDown => Facing::FaceUp,
            Facing::FaceUp => Facing::FaceDown,
        };
    }

    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }

    /// Orders by suit first, then by rank within a suit. Facing is ignored.
    pub fn position_cmp(&self, other: &Card) -> Ordering {
        self.suit
            .cmp(&other.suit)
            .then_with(|| self.rank.cmp(&other.rank))
    }

    /// Same suit and same rank, whatever the facing.
    pub fn same_position(&self, other: &Card) -> bool {
        self.position_cmp(other) == Ordering::Equal
    }

    pub fn to_pretty_string(&self) -> String {
        format!("{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

/// The image lookup key of the card: `Cover` when face-down, otherwise
/// `<Rank> of <Suit>`.
impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.facing {
            Facing::FaceDown => f.write_str("Cover"),
            Facing::FaceUp => write!(f, "{} of {}", self.rank.name(), self.suit.name()),
        }
    }
}
