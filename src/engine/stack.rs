use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::*;

pub const NUM_FOUNDATIONS: u8 = 4;
pub const NUM_TABLEAUS: u8 = 7;
pub const NUM_STACKS: usize = 2 + NUM_FOUNDATIONS as usize + NUM_TABLEAUS as usize;

/// One of the thirteen piles on the board.
///
/// Foundations are numbered 1..=4 and tableaus 1..=7, matching their
/// textual names (`foundation-2`, `tableau-7`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stack {
    Deck,
    Waste,
    Foundation(u8),
    Tableau(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackType {
    Deck,
    Waste,
    Foundation,
    Tableau,
}

impl Stack {
    pub const ALL: [Stack; NUM_STACKS] = [
        Stack::Deck,
        Stack::Waste,
        Stack::Foundation(1),
        Stack::Foundation(2),
        Stack::Foundation(3),
        Stack::Foundation(4),
        Stack::Tableau(1),
        Stack::Tableau(2),
        Stack::Tableau(3),
        Stack::Tableau(4),
        Stack::Tableau(5),
        Stack::Tableau(6),
        Stack::Tableau(7),
    ];

    pub fn stack_type(&self) -> StackType {
        match self {
            Stack::Deck => StackType::Deck,
            Stack::Waste => StackType::Waste,
            Stack::Foundation(_) => StackType::Foundation,
            Stack::Tableau(_) => StackType::Tableau,
        }
    }

    // 0 for the deck and waste
    pub fn number(&self) -> u8 {
        match self {
            Stack::Deck | Stack::Waste => 0,
            Stack::Foundation(n) | Stack::Tableau(n) => *n,
        }
    }

    pub fn foundations() -> impl Iterator<Item = Stack> {
        (1..=NUM_FOUNDATIONS).map(Stack::Foundation)
    }

    pub fn tableaus() -> impl Iterator<Item = Stack> {
        (1..=NUM_TABLEAUS).map(Stack::Tableau)
    }

    // position of this stack in `Stack::ALL`, used to index board storage
    pub(crate) fn slot(&self) -> usize {
        match self {
            Stack::Deck => 0,
            Stack::Waste => 1,
            Stack::Foundation(n) => {
                debug_assert!((1..=NUM_FOUNDATIONS).contains(n), "bad foundation {}", n);
                1 + *n as usize
            }
            Stack::Tableau(n) => {
                debug_assert!((1..=NUM_TABLEAUS).contains(n), "bad tableau {}", n);
                1 + NUM_FOUNDATIONS as usize + *n as usize
            }
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stack::Deck => write!(f, "deck"),
            Stack::Waste => write!(f, "waste"),
            Stack::Foundation(n) => write!(f, "foundation-{}", n),
            Stack::Tableau(n) => write!(f, "tableau-{}", n),
        }
    }
}

// "tableau-3", or the short forms "t3", "f1", "d" and "w"
impl FromStr for Stack {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || EngineError::UnknownStack(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "deck" | "d" => return Ok(Stack::Deck),
            "waste" | "w" => return Ok(Stack::Waste),
            _ => {}
        }
        let (kind, number) = if let Some(n) = lower.strip_prefix("foundation-") {
            (StackType::Foundation, n)
        } else if let Some(n) = lower.strip_prefix("tableau-") {
            (StackType::Tableau, n)
        } else if let Some(n) = lower.strip_prefix('f') {
            (StackType::Foundation, n)
        } else if let Some(n) = lower.strip_prefix('t') {
            (StackType::Tableau, n)
        } else {
            return Err(unknown());
        };
        let number: u8 = number.parse().map_err(|_| unknown())?;
        match kind {
            StackType::Foundation if (1..=NUM_FOUNDATIONS).contains(&number) => {
                Ok(Stack::Foundation(number))
            }
            StackType::Tableau if (1..=NUM_TABLEAUS).contains(&number) => {
                Ok(Stack::Tableau(number))
            }
            _ => Err(unknown()),
        }
    }
}
