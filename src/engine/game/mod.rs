use std::fmt;

use log::debug;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use super::card::*;
use super::error::*;
use super::rules::{can_drop, DragKind};
use super::stack::*;


/// The part of the game that undo/redo tracks: what is in each stack, which
/// stack each card is in, and how many cards of each tableau are face-up.
///
/// Timers and other transient state live in `Session`, never here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    // cards of each stack bottom to top, indexed by `Stack::slot()`
    stacks: Vec<Vec<Card>>,
    // face-up cards of each tableau, counted from the top
    face_up: [usize; NUM_TABLEAUS as usize],
    // which stack each card is in, indexed by `Card::id()`
    card_stacks: Vec<Option<Stack>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Stack,
    pub to: Stack,
    // bottommost card of what gets moved
    pub card: Card,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} to {}", self.card, self.from, self.to)
    }
}

impl Board {
    fn empty() -> Self {
        Board {
            stacks: vec![Vec::new(); NUM_STACKS],
            face_up: [0; NUM_TABLEAUS as usize],
            card_stacks: vec![None; NUM_CARDS],
        }
    }

    // shuffle & deal a new game
    pub fn deal(seed: u64) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut deck = shuffle_deck(&generate_deck(), &mut rng);
        let mut board = Board::empty();
        for tableau in Stack::tableaus() {
            let n = tableau.number() as usize;
            let remainder = deck.split_off(n);
            board.put(tableau, deck);
            board.face_up[n - 1] = 1;
            deck = remainder;
        }
        board.put(Stack::Deck, deck);
        debug!("dealt game {}", seed);
        board
    }

    // replace the contents of a stack, keeping the per-card lookup in sync
    fn put(&mut self, stack: Stack, cards: Vec<Card>) {
        for card in &self.stacks[stack.slot()] {
            self.card_stacks[card.id()] = None;
        }
        for card in &cards {
            self.card_stacks[card.id()] = Some(stack);
        }
        self.stacks[stack.slot()] = cards;
    }

    pub fn cards(&self, stack: Stack) -> &[Card] {
        &self.stacks[stack.slot()]
    }

    pub fn topmost(&self, stack: Stack) -> Option<Card> {
        self.cards(stack).last().copied()
    }

    pub fn stack_of(&self, card: Card) -> Option<Stack> {
        self.card_stacks[card.id()]
    }

    pub fn index_of(&self, card: Card) -> Option<usize> {
        let stack = self.stack_of(card)?;
        self.cards(stack).iter().position(|&c| c == card)
    }

    pub fn face_up_count(&self, stack: Stack) -> usize {
        match stack {
            Stack::Deck => 0,
            Stack::Waste | Stack::Foundation(_) => self.cards(stack).len(),
            Stack::Tableau(n) => self.face_up[n as usize - 1],
        }
    }

    pub fn is_face_up(&self, card: Card) -> bool {
        match (self.stack_of(card), self.index_of(card)) {
            (Some(stack), Some(index)) => {
                index + self.face_up_count(stack) >= self.cards(stack).len()
            }
            _ => false,
        }
    }

    pub fn is_topmost(&self, card: Card) -> bool {
        match self.stack_of(card) {
            Some(stack) => self.topmost(stack) == Some(card),
            None => false,
        }
    }

    /// The cards that would come along if a drag started at `card`.
    pub fn drag_list(&self, card: Card) -> Vec<Card> {
        if !self.is_face_up(card) {
            return Vec::new();
        }
        match (self.stack_of(card), self.index_of(card)) {
            (Some(stack @ Stack::Tableau(_)), Some(index)) => self.cards(stack)[index..].to_vec(),
            _ => vec![card],
        }
    }

    /// Checks a move of `card` and everything above it from `source` to
    /// `target`. Without a card, the topmost card of `source` is moved.
    pub fn check_move(&self, source: Stack, target: Stack, card: Option<Card>) -> Result<DragKind> {
        let illegal = |reason: &str| EngineError::IllegalMove {
            from: source,
            to: target,
            reason: reason.to_string(),
        };
        let card = match card.or_else(|| self.topmost(source)) {
            Some(card) => card,
            None => return Err(illegal(REASON_EMPTY_SOURCE)),
        };
        if source == target {
            return Err(illegal(REASON_SAME_STACK));
        }
        if self.stack_of(card) != Some(source) {
            return Err(illegal(REASON_NOT_IN_STACK));
        }
        if !self.is_face_up(card) {
            return Err(illegal(REASON_FACE_DOWN));
        }
        let kind = if self.is_topmost(card) {
            DragKind::Single
        } else {
            DragKind::Multiple
        };
        if kind == DragKind::Multiple && source.stack_type() != StackType::Tableau {
            return Err(illegal(REASON_RUN_OUTSIDE_TABLEAU));
        }
        if !can_drop(
            source.stack_type(),
            target.stack_type(),
            kind,
            card,
            self.topmost(target),
        ) {
            return Err(illegal(REASON_DOES_NOT_FIT));
        }
        Ok(kind)
    }

    pub fn can_move(&self, source: Stack, target: Stack, card: Option<Card>) -> bool {
        self.check_move(source, target, card).is_ok()
    }

    /// Moves `card` (default: the topmost card) and everything above it.
    ///
    /// The move is not validated here; callers check with `can_move` first.
    pub fn move_card(&mut self, source: Stack, target: Stack, card: Option<Card>) {
        debug_assert!(
            self.can_move(source, target, card),
            "illegal move from {} to {}",
            source,
            target
        );
        self.transfer(source, target, card);
    }

    fn transfer(&mut self, source: Stack, target: Stack, bottommost: Option<Card>) -> usize {
        let source_cards = &mut self.stacks[source.slot()];
        let index = match bottommost {
            Some(card) => source_cards
                .iter()
                .position(|&c| c == card)
                .unwrap_or_else(|| panic!("{} is not in {}", card, source)),
            None => source_cards.len().saturating_sub(1),
        };
        let moved = source_cards.split_off(index);
        let remaining = source_cards.len();

        // the card uncovered on a tableau turns face-up
        if let Stack::Tableau(n) = source {
            let face_up = &mut self.face_up[n as usize - 1];
            let floor = if remaining > 0 { 1 } else { 0 };
            *face_up = face_up.saturating_sub(moved.len()).max(floor);
        }
        if let Stack::Tableau(n) = target {
            self.face_up[n as usize - 1] += moved.len();
        }
        for card in &moved {
            self.card_stacks[card.id()] = Some(target);
        }
        let count = moved.len();
        debug!("moved {} card(s) from {} to {}", count, source, target);
        self.stacks[target.slot()].extend(moved);
        count
    }

    /// Draws one card from the deck onto the waste, or turns the waste back
    /// over into the deck when the deck is empty. Returns false if there was
    /// nothing to do.
    pub fn deal_from_deck(&mut self) -> bool {
        if !self.cards(Stack::Deck).is_empty() {
            self.transfer(Stack::Deck, Stack::Waste, None);
            return true;
        }
        if self.cards(Stack::Waste).is_empty() {
            return false;
        }
        let mut waste = std::mem::take(&mut self.stacks[Stack::Waste.slot()]);
        waste.reverse();
        self.put(Stack::Deck, waste);
        debug!("recycled the waste into the deck");
        true
    }

    /// Moves the topmost card of `stack` to the first foundation that takes
    /// it, or failing that (and unless `foundation_only`) to the first
    /// tableau that takes it. Returns where the card went.
    pub fn auto_move(&mut self, stack: Stack, foundation_only: bool) -> Option<Stack> {
        let card = self.topmost(stack)?;
        let target = Stack::foundations()
            .find(|&f| self.can_move(stack, f, Some(card)))
            .or_else(|| {
                if foundation_only {
                    None
                } else {
                    Stack::tableaus().find(|&t| self.can_move(stack, t, Some(card)))
                }
            })?;
        self.move_card(stack, target, Some(card));
        Some(target)
    }

    /// One step of finishing a trivially winnable game: tries the waste and
    /// then each tableau, moving at most one card to a foundation.
    pub fn auto_complete_step(&mut self) -> Option<Move> {
        let sources = std::iter::once(Stack::Waste).chain(Stack::tableaus());
        for source in sources {
            if let Some(card) = self.topmost(source) {
                if let Some(target) = self.auto_move(source, true) {
                    return Some(Move {
                        from: source,
                        to: target,
                        card,
                    });
                }
            }
        }
        None
    }

    /// Every move `can_move` accepts from the current position. Dealing from
    /// the deck is not included.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for &from in Stack::ALL.iter() {
            let candidates: Vec<Card> = match from {
                Stack::Tableau(_) => self
                    .cards(from)
                    .iter()
                    .copied()
                    .filter(|&c| self.is_face_up(c))
                    .collect(),
                _ => self.topmost(from).into_iter().collect(),
            };
            for card in candidates {
                for &to in Stack::ALL.iter() {
                    if self.can_move(from, to, Some(card)) {
                        moves.push(Move { from, to, card });
                    }
                }
            }
        }
        moves
    }

    pub fn is_won(&self) -> bool {
        Stack::foundations().all(|f| self.cards(f).len() == CARDS_PER_SUIT)
    }

    /// True when the rest of the game needs no decisions: the deck is empty,
    /// no waste card sits on a lower one, and every tableau card is face-up.
    pub fn is_trivially_winnable(&self) -> bool {
        if !self.cards(Stack::Deck).is_empty() {
            return false;
        }
        let waste_ordered = self
            .cards(Stack::Waste)
            .windows(2)
            .all(|pair| pair[0].rank.index() >= pair[1].rank.index());
        if !waste_ordered {
            return false;
        }
        Stack::tableaus().all(|t| self.face_up_count(t) == self.cards(t).len())
    }

    /// Verifies the table sizes, the card partition, the per-card lookup,
    /// tableau face-up counts and foundation ordering.
    pub fn check_invariants(&self) -> Result<()> {
        let corrupt = |msg: String| Err(EngineError::InvariantViolation(msg));
        if self.stacks.len() != NUM_STACKS || self.card_stacks.len() != NUM_CARDS {
            return corrupt(format!(
                "expected {} stacks and {} cards, found {} and {}",
                NUM_STACKS,
                NUM_CARDS,
                self.stacks.len(),
                self.card_stacks.len()
            ));
        }
        let mut seen = vec![false; NUM_CARDS];
        for &stack in Stack::ALL.iter() {
            for &card in self.cards(stack) {
                if seen[card.id()] {
                    return corrupt(format!("{} appears more than once", card));
                }
                seen[card.id()] = true;
                if self.card_stacks[card.id()] != Some(stack) {
                    return corrupt(format!("{} is in {} but not recorded there", card, stack));
                }
            }
        }
        if let Some(id) = seen.iter().position(|&s| !s) {
            return corrupt(format!("card #{} is missing from the board", id));
        }
        for tableau in Stack::tableaus() {
            let (len, face_up) = (self.cards(tableau).len(), self.face_up_count(tableau));
            if face_up > len || (len > 0 && face_up == 0) {
                return corrupt(format!("{} has {} face-up of {} cards", tableau, face_up, len));
            }
        }
        for foundation in Stack::foundations() {
            let cards = self.cards(foundation);
            let ordered = cards
                .iter()
                .enumerate()
                .all(|(i, c)| c.rank.index() == i && c.suit == cards[0].suit);
            if !ordered {
                return corrupt(format!("{} is out of order", foundation));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deck = self.cards(Stack::Deck).len();
        write!(f, "{:>3} ", if deck > 0 { "[]" } else { "--" })?;
        match self.topmost(Stack::Waste) {
            Some(card) => write!(f, "{:>3}    ", card)?,
            None => write!(f, " --    ")?,
        }
        for foundation in Stack::foundations() {
            match self.topmost(foundation) {
                Some(card) => write!(f, "{:>3} ", card)?,
                None => write!(f, " -- ")?,
            }
        }
        writeln!(f, "  ({} in deck)", deck)?;
        writeln!(f)?;
        for tableau in Stack::tableaus() {
            write!(f, " t{} ", tableau.number())?;
        }
        writeln!(f)?;
        for row in 0.. {
            let mut printed_something = false;
            let mut line = String::new();
            for tableau in Stack::tableaus() {
                match self.cards(tableau).get(row) {
                    Some(&card) if self.is_face_up(card) => {
                        line += &format!("{:>3} ", card);
                        printed_something = true;
                    }
                    Some(_) => {
                        line += " [] ";
                        printed_something = true;
                    }
                    None => line += "    ",
                }
            }
            if printed_something {
                writeln!(f, "{}", line.trim_end())?;
            } else {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod inspect {
    use super::*;

    // builds a board from explicit stacks; every tableau starts fully face-up.
    // cards left out are simply not on the board
    pub fn board_from_stacks(stacks: Vec<(Stack, Vec<Card>)>) -> Board {
        let mut board = Board::empty();
        for (stack, cards) in stacks {
            if let Stack::Tableau(n) = stack {
                board.face_up[n as usize - 1] = cards.len();
            }
            board.put(stack, cards);
        }
        board
    }

    pub fn set_face_up(board: &mut Board, tableau: u8, count: usize) {
        board.face_up[tableau as usize - 1] = count;
    }

    pub fn cards(names: &str) -> Vec<Card> {
        names
            .split_whitespace()
            .map(|n| n.parse().unwrap())
            .collect()
    }
}
