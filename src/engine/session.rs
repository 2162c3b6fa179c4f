use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::card::Card;
use super::error::*;
use super::game::*;
use super::stack::Stack;
use super::undo::History;

/// Transitions the statistics keeper listens for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    NewGameStarted { seed: u64 },
    // a saved game was picked up again and needs a record of its own
    GameLoaded { seed: u64 },
    GameWon { time: u64, moves: u32 },
}

/// A game in progress: the board, its history, and the bookkeeping that
/// history doesn't track (clock, move counter, pause flag).
///
/// Every public mutator is one transaction. After the board changes the
/// history observes it, so callers never see a half-applied move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    seed: u64,
    board: Board,
    history: History,
    elapsed_secs: u64,
    moves: u32,
    started: bool,
    paused: bool,
    won: bool,
    // a game is won once even if the winning move is undone and redone
    win_reported: bool,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        Session::from_board(seed, Board::deal(seed))
    }

    fn from_board(seed: u64, board: Board) -> Self {
        let mut session = Session {
            seed,
            board,
            history: History::new(),
            elapsed_secs: 0,
            moves: 0,
            started: false,
            paused: false,
            won: false,
            win_reported: false,
            events: Vec::new(),
        };
        session.start();
        session
    }

    pub fn new_game(&mut self, seed: u64) {
        self.seed = seed;
        self.board = Board::deal(seed);
        self.start();
    }

    fn start(&mut self) {
        self.history.reset();
        self.elapsed_secs = 0;
        self.moves = 0;
        self.started = false;
        self.paused = false;
        self.won = false;
        self.win_reported = false;
        info!("new game, seed {}", self.seed);
        self.events.push(GameEvent::NewGameStarted { seed: self.seed });
        // the first observation becomes the baseline that restart returns to
        self.commit();
    }

    fn commit(&mut self) {
        if self.history.observe(&self.board) {
            trace!("{}", self.history);
        }
        if cfg!(debug_assertions) {
            if let Err(e) = self.board.check_invariants() {
                panic!("{}", e);
            }
        }
        self.won = self.board.is_won();
        if self.won && !self.win_reported {
            self.win_reported = true;
            info!("game won in {}s with {} moves", self.elapsed_secs, self.moves);
            self.events.push(GameEvent::GameWon {
                time: self.elapsed_secs,
                moves: self.moves,
            });
        }
    }

    fn count_move(&mut self) {
        self.moves += 1;
        self.started = true;
    }

    /// Checks and performs a move in one go.
    pub fn try_move(&mut self, source: Stack, target: Stack, card: Option<Card>) -> Result<()> {
        self.board.check_move(source, target, card)?;
        self.board.move_card(source, target, card);
        self.count_move();
        self.commit();
        Ok(())
    }

    pub fn deal(&mut self) -> bool {
        if !self.board.deal_from_deck() {
            return false;
        }
        self.count_move();
        self.commit();
        true
    }

    pub fn auto_move(&mut self, stack: Stack, foundation_only: bool) -> Option<Stack> {
        let target = self.board.auto_move(stack, foundation_only)?;
        self.count_move();
        self.commit();
        Some(target)
    }

    pub fn auto_complete_step(&mut self) -> Option<Move> {
        let m = self.board.auto_complete_step()?;
        self.count_move();
        self.commit();
        Some(m)
    }

    /// Keeps moving cards to the foundations until nothing moves.
    pub fn auto_complete(&mut self) -> Vec<Move> {
        let mut moves = Vec::new();
        while let Some(m) = self.auto_complete_step() {
            debug!("auto-complete: {}", m);
            moves.push(m);
        }
        moves
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(board) => self.board = board.clone(),
            None => return false,
        }
        self.commit();
        true
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(board) => self.board = board.clone(),
            None => return false,
        }
        self.commit();
        true
    }

    pub fn restart(&mut self) -> bool {
        if !self.history.can_restart() {
            return false;
        }
        match self.history.restart() {
            Some(board) => self.board = board.clone(),
            None => return false,
        }
        self.commit();
        true
    }

    /// Advances the clock, which only runs once the first move is made and
    /// stops while paused or after the game is won.
    pub fn tick(&mut self, secs: u64) {
        if self.started && !self.paused && !self.won {
            self.elapsed_secs += secs;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_trivially_winnable(&self) -> bool {
        self.board.is_trivially_winnable()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_restart(&self) -> bool {
        self.history.can_restart()
    }

    /// Checks the live board and every snapshot in its history.
    pub fn check_invariants(&self) -> Result<()> {
        self.board.check_invariants()?;
        self.history.check_invariants()
    }

    pub(super) fn mark_loaded(&mut self) {
        info!("resuming game, seed {}", self.seed);
        self.events.push(GameEvent::GameLoaded { seed: self.seed });
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::super::card::*;
    use super::super::game::inspect::*;
    use super::*;

    // makes moves picked from the legal ones by `choices`, or deals
    fn play(session: &mut Session, choices: &[u16]) {
        for &choice in choices {
            let moves = session.board().legal_moves();
            match moves.get(choice as usize % (moves.len() + 1)) {
                Some(m) => session.try_move(m.from, m.to, Some(m.card)).unwrap(),
                None => {
                    session.deal();
                }
            }
            session.tick(3);
        }
    }

    fn almost_won() -> Board {
        let mut stacks: Vec<(Stack, Vec<Card>)> = Stack::foundations()
            .zip(Suit::ALL.iter())
            .map(|(f, &suit)| (f, Rank::ALL.iter().map(|&r| Card::new(r, suit)).collect()))
            .collect();
        let king = stacks[3].1.pop().unwrap();
        let queen = stacks[3].1.pop().unwrap();
        stacks.push((Stack::Waste, vec![queen]));
        stacks.push((Stack::Tableau(1), vec![king]));
        board_from_stacks(stacks)
    }

    #[test]
    fn new_game() {
        let mut session = Session::new(5);
        assert_eq!(session.take_events(), vec![GameEvent::NewGameStarted { seed: 5 }]);
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo() && !session.can_redo() && !session.can_restart());
        assert_eq!(session.board(), &Board::deal(5));

        play(&mut session, &[1, 2, 3, 4, 5, 6]);
        assert!(session.moves() > 0);
        session.new_game(6);
        assert_eq!(session.take_events(), vec![GameEvent::NewGameStarted { seed: 6 }]);
        assert_eq!(session.board(), &Board::deal(6));
        assert_eq!(session.history().len(), 1);
        assert_eq!((session.moves(), session.elapsed_secs()), (0, 0));
        assert!(!session.is_started());
    }

    #[test]
    fn clock() {
        let mut session = Session::new(9);
        session.tick(10);
        assert_eq!(session.elapsed_secs(), 0);
        assert!(session.deal());
        session.tick(10);
        assert_eq!(session.elapsed_secs(), 10);
        session.set_paused(true);
        session.tick(10);
        assert_eq!(session.elapsed_secs(), 10);
        session.set_paused(false);
        session.tick(1);
        assert_eq!(session.elapsed_secs(), 11);
    }

    #[test]
    fn illegal_moves_change_nothing() {
        let mut session = Session::new(1);
        let before = session.board().clone();
        assert!(matches!(
            session.try_move(Stack::Tableau(1), Stack::Waste, None),
            Err(EngineError::IllegalMove { .. })
        ));
        assert_eq!(session.board(), &before);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn undo_keeps_the_clock() {
        let mut session = Session::new(77);
        play(&mut session, &[3, 1, 4, 1, 5, 9, 2, 6]);
        let board = session.board().clone();
        let (elapsed, moves) = (session.elapsed_secs(), session.moves());
        let steps = session.history().len() - 1;
        assert!(steps > 0);

        for _ in 0..steps {
            assert!(session.undo());
        }
        assert!(!session.undo());
        assert_eq!(session.elapsed_secs(), elapsed);
        for _ in 0..steps {
            assert!(session.redo());
        }
        assert!(!session.redo());
        assert_eq!(session.board(), &board);
        assert_eq!(session.elapsed_secs(), elapsed);
        assert_eq!(session.moves(), moves);
    }

    #[test]
    fn branching_drops_redo() {
        let mut session = Session::new(12);
        assert!(session.deal());
        assert!(session.deal());
        assert!(session.undo());
        assert!(session.can_redo());
        assert!(session.deal());
        assert!(!session.can_redo());
        assert!(!session.redo());
    }

    #[test]
    fn restart_returns_to_the_deal() {
        let mut session = Session::new(4);
        for _ in 0..5 {
            session.deal();
        }
        session.tick(30);
        assert!(session.can_restart());
        assert!(session.restart());
        assert_eq!(session.board(), &Board::deal(4));
        assert_eq!(session.elapsed_secs(), 30);
        assert!(!session.can_undo());
        assert!(!session.restart());
    }

    #[test]
    fn winning() {
        let mut session = Session::from_board(0, almost_won());
        session.take_events();
        assert!(session.is_trivially_winnable());
        assert!(!session.is_won());
        assert!(session.try_move(Stack::Tableau(1), Stack::Foundation(4), None).is_err());
        assert_eq!(session.auto_move(Stack::Waste, false), Some(Stack::Foundation(4)));
        session.tick(5);
        assert_eq!(session.auto_complete().len(), 1);
        assert!(session.is_won());
        assert!(session.auto_complete().is_empty());
        assert_eq!(session.take_events(), vec![GameEvent::GameWon { time: 5, moves: 2 }]);
        session.tick(5);
        assert_eq!(session.elapsed_secs(), 5);

        // undoing and replaying the last move doesn't win twice
        assert!(session.undo());
        assert!(!session.is_won());
        assert!(session.redo());
        assert!(session.is_won());
        assert!(session.take_events().is_empty());
    }

    proptest! {
        #[test]
        fn undo_redo_round_trip(
            seed in any::<u64>(),
            choices in prop::collection::vec(any::<u16>(), 1..60),
            rounds in 1usize..8,
        ) {
            let mut session = Session::new(seed);
            play(&mut session, &choices);
            let board = session.board().clone();
            let elapsed = session.elapsed_secs();
            for _ in 0..rounds {
                session.undo();
                session.redo();
            }
            prop_assert_eq!(session.board(), &board);
            prop_assert_eq!(session.elapsed_secs(), elapsed);
            prop_assert_eq!(session.check_invariants(), Ok(()));
        }
    }
}
