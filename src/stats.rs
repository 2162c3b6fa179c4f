//! Lifetime statistics, kept as one record per game started.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use super::engine::GameEvent;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub time: u64,
    pub moves: u32,
    pub won: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Streak {
    pub winning: bool,
    pub length: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsLog {
    records: Vec<GameRecord>,
}

impl StatsLog {
    pub fn new() -> Self {
        StatsLog::default()
    }

    /// Reads a log written by `save`. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(StatsLog::new());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        ron::de::from_str(&text).with_context(|| format!("parsing {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = ron::ser::to_string_pretty(self, PrettyConfig::default())?;
        fs::write(path, text).with_context(|| format!("writing {:?}", path))?;
        debug!("saved {} game records to {:?}", self.records.len(), path);
        Ok(())
    }

    pub fn apply(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::NewGameStarted { .. } | GameEvent::GameLoaded { .. } => {
                self.records.push(GameRecord::default())
            }
            GameEvent::GameWon { time, moves } => self.update_current(GameRecord {
                time,
                moves,
                won: true,
            }),
        }
    }

    // overwrites the record of the game in progress
    pub fn update_current(&mut self, record: GameRecord) {
        match self.records.last_mut() {
            Some(current) => *current = record,
            None => self.records.push(record),
        }
    }

    pub fn current(&self) -> Option<&GameRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn games_played(&self) -> usize {
        self.records.len()
    }

    pub fn wins_and_losses(&self) -> (usize, usize) {
        let wins = self.records.iter().filter(|r| r.won).count();
        (wins, self.records.len() - wins)
    }

    /// Longest run of consecutive wins (or losses).
    pub fn longest_streak(&self, winning: bool) -> usize {
        let mut longest = 0;
        let mut run = 0;
        for record in &self.records {
            if record.won == winning {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest
    }

    pub fn current_streak(&self) -> Option<Streak> {
        let winning = self.records.last()?.won;
        let length = self
            .records
            .iter()
            .rev()
            .take_while(|r| r.won == winning)
            .count();
        Some(Streak { winning, length })
    }

    pub fn best_time(&self) -> Option<u64> {
        self.records.iter().filter(|r| r.won).map(|r| r.time).min()
    }

    pub fn least_moves(&self) -> Option<u32> {
        self.records.iter().filter(|r| r.won).map(|r| r.moves).min()
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for StatsLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (wins, losses) = self.wins_and_losses();
        writeln!(f, "games played:   {}", self.games_played())?;
        writeln!(f, "wins / losses:  {} / {}", wins, losses)?;
        writeln!(
            f,
            "longest streak: {} won, {} lost",
            self.longest_streak(true),
            self.longest_streak(false)
        )?;
        match self.current_streak() {
            Some(Streak { winning, length }) => writeln!(
                f,
                "current streak: {} {}",
                length,
                if winning { "won" } else { "lost" }
            )?,
            None => writeln!(f, "current streak: -")?,
        }
        writeln!(f, "best time:      {}", or_dash(self.best_time().map(|t| format!("{}s", t))))?;
        write!(f, "least moves:    {}", or_dash(self.least_moves()))
    }
}
