use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::session::Session;

pub const SAVE_PREFIX: &str = "klondike_save.";

// load game
pub fn load(filename: &Path) -> Result<Session> {
    let save = fs::read_to_string(filename)?;
    let mut session: Session = serde_json::from_str(&save)?;
    session
        .check_invariants()
        .with_context(|| format!("{:?} holds an impossible game", filename))?;
    session.mark_loaded();
    Ok(session)
}

// save game to the first free `<name>N` in `dir`
pub fn save(session: &Session, dir: PathBuf, name: &str) -> Result<PathBuf> {
    let save = serde_json::to_string(session)?;
    for n in 0.. {
        let mut filename = dir.clone();
        filename.push(name.to_string() + &n.to_string());
        if !filename.exists() {
            let mut file = fs::File::create(filename.clone())?;
            file.write_all(save.as_bytes())?;
            return Ok(filename);
        }
    }
    unreachable!();
}
