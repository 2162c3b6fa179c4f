//! Move legality, independent of any board.
//!
//! `can_drop` only looks at the bottommost card of whatever is being moved
//! and the topmost card of the destination. Runs taken from a tableau are
//! already internally ordered because every card in them got there through
//! a legal move.

use super::card::*;
use super::stack::StackType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DragKind {
    Single,
    Multiple,
}

pub fn can_drop(
    source: StackType,
    target: StackType,
    kind: DragKind,
    card: Card,
    target_top: Option<Card>,
) -> bool {
    // the deck only ever feeds the waste, and nothing is dropped onto either
    if source == StackType::Deck {
        return false;
    }
    match target {
        StackType::Deck | StackType::Waste => false,
        StackType::Tableau => match target_top {
            None => card.rank == Rank::King,
            Some(top) => card.stacks_on(&top),
        },
        StackType::Foundation => {
            if kind == DragKind::Multiple {
                return false;
            }
            // an Ace may hop to another empty foundation, nothing else may
            match target_top {
                None => card.rank == Rank::Ace,
                Some(top) => source != StackType::Foundation && card.fits_on_foundation(&top),
            }
        }
    }
}
