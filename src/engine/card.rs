use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::*;

pub const NUM_CARDS: usize = 52;
pub const CARDS_PER_SUIT: usize = 13;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    pub fn colour(&self) -> Colour {
        self.suit.colour()
    }

    // dense index in 0..52, used for per-card tables
    pub fn id(&self) -> usize {
        usize::from(self.suit) * CARDS_PER_SUIT + self.rank.index()
    }

    // can this card be put on top of `base` in a tableau
    pub fn stacks_on(&self, base: &Card) -> bool {
        self.colour() != base.colour() && self.rank.index() + 1 == base.rank.index()
    }

    // can this card be put on top of `base` in a foundation
    pub fn fits_on_foundation(&self, base: &Card) -> bool {
        self.suit == base.suit && self.rank.index() == base.rank.index() + 1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad as a whole so that the board lines up
        f.pad(&format!("{}{}", self.rank, self.suit.symbol()))
    }
}

// accepts "10♥" as printed, and ascii forms like "10h" or "QS"
impl FromStr for Card {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || EngineError::UnknownCard(s.to_string());
        let s = s.trim();
        let suit_char = s.chars().last().ok_or_else(unknown)?;
        let suit = match suit_char.to_ascii_uppercase() {
            '♣' | 'C' => Suit::Clubs,
            '♦' | 'D' => Suit::Diamonds,
            '♥' | 'H' => Suit::Hearts,
            '♠' | 'S' => Suit::Spades,
            _ => return Err(unknown()),
        };
        let rank_str = &s[..s.len() - suit_char.len_utf8()];
        let rank = Rank::ALL
            .iter()
            .find(|r| r.symbol().eq_ignore_ascii_case(rank_str))
            .copied()
            .ok_or_else(unknown)?;
        Ok(Card::new(rank, suit))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
    pub const ALL: [Rank; CARDS_PER_SUIT] = [
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

    // Ace is 0, King is 12
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Colour {
    Red,
    Black,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn colour(&self) -> Colour {
        match self {
            Suit::Clubs => Colour::Black,
            Suit::Diamonds => Colour::Red,
            Suit::Hearts => Colour::Red,
            Suit::Spades => Colour::Black,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }
}

impl From<Suit> for usize {
    fn from(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => 0,
            Suit::Diamonds => 1,
            Suit::Hearts => 2,
            Suit::Spades => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit_str = match self {
            Suit::Clubs => "clubs",
            Suit::Diamonds => "diamonds",
            Suit::Hearts => "hearts",
            Suit::Spades => "spades",
        };
        write!(f, "{}", suit_str)
    }
}

static DECK: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut deck = Vec::with_capacity(NUM_CARDS);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
});

/// The 52 cards in canonical order (suit by suit, Ace to King).
///
/// The deck is built once; every call hands out its own copy.
pub fn generate_deck() -> Vec<Card> {
    DECK.clone()
}

/// Returns a shuffled copy of `cards`, leaving the input untouched.
pub fn shuffle_deck<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Card> {
    let mut shuffled = cards.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
