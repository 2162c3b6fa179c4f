use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use log::{debug, info};
use rand::prelude::*;
use thiserror::Error;

use super::engine::*;
use super::stats::{GameRecord, StatsLog};

pub const HELP: &str = "\
commands:
  deal (d)                   draw from the deck, or turn the waste over
  move (m) FROM TO [CARD]    move CARD and everything on it (default: top card)
  auto (a) STACK             send the top card of STACK wherever it fits
  finish (f)                 move everything possible to the foundations
  undo (u), redo (r)         step through history
  restart                    back to the deal
  new (n) [SEED]             start a new game
  pause, resume              stop or start the clock
  hint (h)                   list legal moves
  show (b)                   print the board
  save (s)                   save the game
  stats                      show statistics
  quit (q)
stacks: deck (d), waste (w), foundation-1..4 (f1..f4), tableau-1..7 (t1..t7)
cards: 10♥, Q♠, or in ASCII 10H, QS";

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("type a command, or `help`")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("{0:?} is not a seed")]
    BadSeed(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Deal,
    Move {
        from: Stack,
        to: Stack,
        card: Option<Card>,
    },
    Auto(Stack),
    Finish,
    Undo,
    Redo,
    Restart,
    New(Option<u64>),
    Pause,
    Resume,
    Hint,
    Show,
    Save,
    Stats,
    Help,
    Quit,
}

impl Command {
    // commands that play the current game, which a paused game refuses
    fn plays(&self) -> bool {
        matches!(
            self,
            Command::Deal
                | Command::Move { .. }
                | Command::Auto(_)
                | Command::Finish
                | Command::Undo
                | Command::Redo
                | Command::Restart
        )
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = words.split_first().ok_or(CommandError::Empty)?;
        let arg = |i: usize, what: &'static str| {
            args.get(i)
                .copied()
                .ok_or(CommandError::MissingArgument(what))
        };
        let command = match name.to_lowercase().as_str() {
            "deal" | "d" => Command::Deal,
            "move" | "m" => Command::Move {
                from: arg(0, "source stack")?.parse()?,
                to: arg(1, "destination stack")?.parse()?,
                card: args.get(2).map(|c| c.parse()).transpose()?,
            },
            "auto" | "a" => Command::Auto(arg(0, "stack")?.parse()?),
            "finish" | "f" => Command::Finish,
            "undo" | "u" => Command::Undo,
            "redo" | "r" => Command::Redo,
            "restart" => Command::Restart,
            "new" | "n" => Command::New(
                args.get(0)
                    .map(|s| s.parse().map_err(|_| CommandError::BadSeed(s.to_string())))
                    .transpose()?,
            ),
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "hint" | "h" => Command::Hint,
            "show" | "board" | "b" => Command::Show,
            "save" | "s" => Command::Save,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(command)
    }
}

/// What the front end should show after a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Board,
    Message(String),
    Quit,
}

/// A session together with the statistics it feeds and the wall clock that
/// drives its timer.
pub struct App {
    pub session: Session,
    pub stats: StatsLog,
    save_dir: PathBuf,
    last_tick: Instant,
}

impl App {
    pub fn new(session: Session, stats: StatsLog, save_dir: PathBuf) -> Self {
        let mut app = App {
            session,
            stats,
            save_dir,
            last_tick: Instant::now(),
        };
        app.record_progress();
        app
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        debug!("executing {:?}", command);
        if self.session.is_paused() && command.plays() {
            bail!("the game is paused; `resume` to continue");
        }
        let reply = match command {
            Command::Deal => {
                if !self.session.deal() {
                    bail!("the deck and the waste are both empty");
                }
                Reply::Board
            }
            Command::Move { from, to, card } => {
                self.session.try_move(from, to, card)?;
                Reply::Board
            }
            Command::Auto(stack) => match self.session.auto_move(stack, false) {
                Some(_) => Reply::Board,
                None => bail!("the top card of {} has nowhere to go", stack),
            },
            Command::Finish => {
                if self.session.auto_complete().is_empty() {
                    bail!("no card can go to a foundation");
                }
                Reply::Board
            }
            Command::Undo => {
                if !self.session.undo() {
                    bail!("nothing to undo");
                }
                Reply::Board
            }
            Command::Redo => {
                if !self.session.redo() {
                    bail!("nothing to redo");
                }
                Reply::Board
            }
            Command::Restart => {
                if !self.session.restart() {
                    bail!("no moves made yet");
                }
                Reply::Board
            }
            Command::New(seed) => {
                let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
                self.session.new_game(seed);
                self.last_tick = Instant::now();
                Reply::Board
            }
            Command::Pause => {
                self.session.set_paused(true);
                Reply::Message("paused".to_string())
            }
            Command::Resume => {
                self.session.set_paused(false);
                self.last_tick = Instant::now();
                Reply::Board
            }
            Command::Hint => Reply::Message(self.hint()),
            Command::Show => Reply::Board,
            Command::Save => {
                let filename = save(&self.session, self.save_dir.clone(), SAVE_PREFIX)?;
                info!("saved to {:?}", filename);
                Reply::Message(format!("saved to {:?}", filename))
            }
            Command::Stats => Reply::Message(self.stats.to_string()),
            Command::Help => Reply::Message(HELP.to_string()),
            Command::Quit => Reply::Quit,
        };
        self.record_progress();
        Ok(reply)
    }

    /// Feeds whole seconds of wall-clock time since the last tick to the
    /// session, carrying the remainder over.
    pub fn tick(&mut self, now: Instant) {
        let secs = now.saturating_duration_since(self.last_tick).as_secs();
        if secs > 0 {
            self.last_tick += Duration::from_secs(secs);
            self.session.tick(secs);
            self.record_progress();
        }
    }

    // drains session events into the statistics, then keeps the record of
    // an unfinished game up to date. A loaded game that was already won
    // gets its record marked won here, since no win event is replayed
    pub fn record_progress(&mut self) {
        for event in self.session.take_events() {
            self.stats.apply(&event);
        }
        let finished = self.stats.current().map_or(false, |r| r.won);
        if !finished {
            self.stats.update_current(GameRecord {
                time: self.session.elapsed_secs(),
                moves: self.session.moves(),
                won: self.session.is_won(),
            });
        }
    }

    fn hint(&self) -> String {
        let moves = self.session.board().legal_moves();
        if moves.is_empty() {
            return "no moves; try `deal`".to_string();
        }
        let lines: Vec<String> = moves.iter().map(|m| format!("  {}", m)).collect();
        format!("{} legal moves:\n{}", moves.len(), lines.join("\n"))
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = &self.session;
        write!(f, "{}", session.board())?;
        let secs = session.elapsed_secs();
        write!(
            f,
            "seed {} | {} moves | {}:{:02}",
            session.seed(),
            session.moves(),
            secs / 60,
            secs % 60
        )?;
        if session.is_paused() {
            write!(f, " | paused")?;
        }
        if session.is_won() {
            write!(f, " | you win!")?;
        } else if session.is_trivially_winnable() {
            write!(f, " | `finish` to win")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::env;
    use std::fs;

    use super::*;

    fn app(seed: u64) -> App {
        App::new(Session::new(seed), StatsLog::new(), env::temp_dir())
    }

    #[test]
    fn parse() {
        assert_eq!("d".parse(), Ok(Command::Deal));
        assert_eq!(
            "move t3 foundation-1".parse(),
            Ok(Command::Move {
                from: Stack::Tableau(3),
                to: Stack::Foundation(1),
                card: None
            })
        );
        assert_eq!(
            "  M w t7 QS ".parse(),
            Ok(Command::Move {
                from: Stack::Waste,
                to: Stack::Tableau(7),
                card: Some(Card::new(Rank::Queen, Suit::Spades))
            })
        );
        assert_eq!("auto tableau-2".parse(), Ok(Command::Auto(Stack::Tableau(2))));
        assert_eq!("new".parse(), Ok(Command::New(None)));
        assert_eq!("n 42".parse(), Ok(Command::New(Some(42))));
        assert_eq!("quit".parse(), Ok(Command::Quit));

        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("jump".parse::<Command>(), Err(CommandError::Unknown("jump".to_string())));
        assert_eq!(
            "move t1".parse::<Command>(),
            Err(CommandError::MissingArgument("destination stack"))
        );
        assert_eq!("new x".parse::<Command>(), Err(CommandError::BadSeed("x".to_string())));
        assert!(matches!(
            "move t1 t9".parse::<Command>(),
            Err(CommandError::Engine(EngineError::UnknownStack(_)))
        ));
        assert!(matches!(
            "move t1 t2 ZZ".parse::<Command>(),
            Err(CommandError::Engine(EngineError::UnknownCard(_)))
        ));
    }

    #[test]
    fn playing() {
        let mut app = app(8);
        assert_eq!(app.stats.games_played(), 1);
        assert_eq!(app.execute(Command::Deal).unwrap(), Reply::Board);
        assert_eq!(app.stats.current().unwrap().moves, 1);
        assert!(app.execute(Command::Move {
            from: Stack::Deck,
            to: Stack::Waste,
            card: None
        })
        .is_err());
        assert_eq!(app.session.moves(), 1);

        assert_eq!(app.execute(Command::Undo).unwrap(), Reply::Board);
        assert!(app.execute(Command::Undo).is_err());
        assert!(app.execute(Command::Redo).is_ok());
        assert!(app.execute(Command::Restart).is_ok());
        assert!(app.execute(Command::Restart).is_err());
        assert!(matches!(app.execute(Command::Hint).unwrap(), Reply::Message(_)));
        assert_eq!(app.execute(Command::Quit).unwrap(), Reply::Quit);
    }

    #[test]
    fn pausing() {
        let mut app = app(8);
        app.execute(Command::Pause).unwrap();
        assert!(app.execute(Command::Deal).is_err());
        assert!(app.execute(Command::Stats).is_ok());
        app.execute(Command::Resume).unwrap();
        assert!(app.execute(Command::Deal).is_ok());
    }

    #[test]
    fn new_games_are_recorded() {
        let mut app = app(1);
        app.execute(Command::Deal).unwrap();
        app.execute(Command::New(Some(2))).unwrap();
        assert_eq!(app.session.seed(), 2);
        assert_eq!(app.session.board(), &Board::deal(2));
        assert_eq!(app.stats.games_played(), 2);
        assert_eq!(
            app.stats.records()[0],
            GameRecord {
                time: 0,
                moves: 1,
                won: false
            }
        );
        assert_eq!(app.stats.current(), Some(&GameRecord::default()));
    }

    #[test]
    fn ticking() {
        let mut app = app(3);
        let start = app.last_tick;
        app.execute(Command::Deal).unwrap();
        app.tick(start + Duration::from_millis(2500));
        assert_eq!(app.session.elapsed_secs(), 2);
        app.tick(start + Duration::from_millis(3100));
        assert_eq!(app.session.elapsed_secs(), 3);
        assert_eq!(app.stats.current().unwrap().time, 3);
    }

    #[test]
    fn saving() {
        let mut dir = env::temp_dir();
        dir.push(format!("klondike-interface-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut app = App::new(Session::new(4), StatsLog::new(), dir.clone());
        app.execute(Command::Deal).unwrap();
        match app.execute(Command::Save).unwrap() {
            Reply::Message(text) => assert!(text.contains("klondike_save.")),
            other => panic!("unexpected reply {:?}", other),
        }
        let loaded = load(&dir.join("klondike_save.0")).unwrap();
        assert_eq!(loaded.board(), app.session.board());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loaded_games_keep_earlier_records() {
        let mut dir = env::temp_dir();
        dir.push(format!("klondike-resume-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut session = Session::new(10);
        session.deal();
        session.deal();
        let path = save(&session, dir.clone(), SAVE_PREFIX).unwrap();

        let mut stats = StatsLog::new();
        stats.update_current(GameRecord {
            time: 30,
            moves: 40,
            won: false,
        });
        let mut app = App::new(load(&path).unwrap(), stats, dir.clone());
        app.execute(Command::Deal).unwrap();
        assert_eq!(app.stats.games_played(), 2);
        assert_eq!(
            app.stats.records()[0],
            GameRecord {
                time: 30,
                moves: 40,
                won: false
            }
        );
        assert_eq!(app.stats.current().unwrap().moves, 3);
        fs::remove_dir_all(&dir).unwrap();
    }
}
