use std::collections::VecDeque;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::*;
use super::game::*;

/// Undo/redo history of board snapshots.
///
/// `frames[0]` is the newest snapshot and `frames[pointer]` is the one the
/// live board currently matches. Moving the pointer restores boards only;
/// whatever else the caller keeps (timers, move counters) is untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct History {
    frames: VecDeque<Board>,
    pointer: usize,
    // set while a restore is being applied, so observing it doesn't push
    #[serde(skip)]
    restoring: bool,
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

impl History {
    pub fn new() -> Self {
        History {
            frames: VecDeque::new(),
            pointer: 0,
            restoring: false,
        }
    }

    /// Called after every transaction on the board. Pushes a snapshot when
    /// the board differs from the current frame, unless the transaction was
    /// one of our own restores. Returns whether a snapshot was pushed.
    pub fn observe(&mut self, board: &Board) -> bool {
        if self.restoring {
            self.restoring = false;
            return false;
        }
        // no no-ops
        if self.frames.get(self.pointer) == Some(board) {
            return false;
        }
        self.push(board.clone());
        true
    }

    pub fn push(&mut self, snapshot: Board) {
        // anything newer than the pointer belongs to an abandoned branch
        let abandoned = self.pointer.min(self.frames.len().saturating_sub(1));
        self.frames.drain(..abandoned);
        self.frames.push_front(snapshot);
        self.pointer = 0;
        debug!("history: pushed frame, {} in stack", self.frames.len());
    }

    pub fn undo(&mut self) -> Option<&Board> {
        if !self.can_undo() {
            return None;
        }
        self.pointer += 1;
        self.restoring = true;
        debug!("history: undo to {}", self.pointer);
        self.frames.get(self.pointer)
    }

    pub fn redo(&mut self) -> Option<&Board> {
        if !self.can_redo() {
            return None;
        }
        self.pointer -= 1;
        self.restoring = true;
        debug!("history: redo to {}", self.pointer);
        self.frames.get(self.pointer)
    }

    // back to the position right after the deal
    pub fn restart(&mut self) -> Option<&Board> {
        let baseline = self.frames.pop_back()?;
        self.frames.clear();
        self.frames.push_back(baseline);
        self.pointer = 0;
        self.restoring = true;
        debug!("history: restart");
        self.frames.front()
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.pointer = 0;
        self.restoring = false;
    }

    pub fn can_undo(&self) -> bool {
        self.pointer + 1 < self.frames.len()
    }

    pub fn can_redo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_restart(&self) -> bool {
        self.frames.len() > 1
    }

    /// Checks every snapshot and that the pointer lands on one.
    pub fn check_invariants(&self) -> Result<()> {
        if self.pointer >= self.frames.len().max(1) {
            return Err(EngineError::InvariantViolation(format!(
                "history pointer {} is past {} snapshots",
                self.pointer,
                self.frames.len()
            )));
        }
        for (n, board) in self.frames.iter().enumerate() {
            board.check_invariants().map_err(|e| match e {
                EngineError::InvariantViolation(msg) => {
                    EngineError::InvariantViolation(format!("snapshot {}: {}", n, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} snapshots, pointer at {}", self.frames.len(), self.pointer)?;
        for (n, board) in self.frames.iter().enumerate() {
            let marker = if n == self.pointer { ">" } else { " " };
            write!(f, "\n{} [{:>3}]\n{}", marker, n, board)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::super::game::inspect::*;
    use super::super::stack::*;
    use super::*;

    fn two_move_game() -> (Board, History) {
        let board = board_from_stacks(vec![
            (Stack::Tableau(1), cards("K♠ Q♥")),
            (Stack::Tableau(2), cards("J♣")),
            (Stack::Tableau(3), cards("10♦")),
            (Stack::Tableau(4), cards("10♥")),
        ]);
        let mut history = History::new();
        history.observe(&board);
        (board, history)
    }

    #[test]
    fn undo_redo() {
        let (mut board, mut history) = two_move_game();
        let state_1 = board.clone();
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        board.move_card(Stack::Tableau(2), Stack::Tableau(1), None);
        assert!(history.observe(&board));
        board.move_card(Stack::Tableau(3), Stack::Tableau(1), None);
        assert!(history.observe(&board));
        let state_3 = board.clone();
        assert_eq!(history.len(), 3);
        assert!(history.can_undo());
        assert!(history.can_restart());

        board = history.undo().unwrap().clone();
        assert!(!history.observe(&board));
        board = history.undo().unwrap().clone();
        assert!(!history.observe(&board));
        assert_eq!(board, state_1);
        assert!(history.undo().is_none());

        board = history.redo().unwrap().clone();
        history.observe(&board);
        board = history.redo().unwrap().clone();
        history.observe(&board);
        assert_eq!(board, state_3);
        assert!(history.redo().is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn new_move_drops_redo() {
        let (mut board, mut history) = two_move_game();
        board.move_card(Stack::Tableau(2), Stack::Tableau(1), None);
        history.observe(&board);
        board.move_card(Stack::Tableau(3), Stack::Tableau(1), None);
        history.observe(&board);

        board = history.undo().unwrap().clone();
        history.observe(&board);
        assert!(history.can_redo());

        board.move_card(Stack::Tableau(4), Stack::Tableau(1), None);
        assert!(history.observe(&board));
        assert!(!history.can_redo());
        assert_eq!(history.pointer(), 0);
        // baseline, first move, and the new branch
        assert_eq!(history.len(), 3);
        assert_eq!(history.frames[1].cards(Stack::Tableau(1)), &cards("K♠ Q♥ J♣")[..]);
    }

    #[test]
    fn no_ops() {
        let (board, mut history) = two_move_game();
        assert!(!history.observe(&board));
        assert!(!history.observe(&board.clone()));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn bad_snapshots_are_reported() {
        assert_eq!(History::new().check_invariants(), Ok(()));
        let mut board = Board::deal(6);
        let mut history = History::new();
        history.observe(&board);
        board.deal_from_deck();
        history.observe(&board);
        assert_eq!(history.check_invariants(), Ok(()));

        history.pointer = 2;
        assert!(matches!(
            history.check_invariants(),
            Err(EngineError::InvariantViolation(_))
        ));
        history.pointer = 1;
        assert_eq!(history.check_invariants(), Ok(()));

        history.frames[0] = board_from_stacks(vec![(Stack::Tableau(1), cards("K♠"))]);
        assert!(matches!(
            history.check_invariants(),
            Err(EngineError::InvariantViolation(msg)) if msg.starts_with("snapshot 0")
        ));
    }

    #[test]
    fn restart_and_reset() {
        let (mut board, mut history) = two_move_game();
        let baseline = board.clone();
        assert!(!history.can_restart());
        board.move_card(Stack::Tableau(2), Stack::Tableau(1), None);
        history.observe(&board);
        board.move_card(Stack::Tableau(3), Stack::Tableau(1), None);
        history.observe(&board);
        history.undo();

        board = history.restart().unwrap().clone();
        assert!(!history.observe(&board));
        assert_eq!(board, baseline);
        assert_eq!(history.len(), 1);
        assert_eq!(history.pointer(), 0);
        assert!(!history.can_undo() && !history.can_redo() && !history.can_restart());

        history.reset();
        assert_eq!(history.len(), 0);
        assert!(history.restart().is_none());
        assert!(history.observe(&board));
        assert_eq!(history.len(), 1);
    }
}
