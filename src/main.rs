use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use rand::prelude::*;
use structopt::StructOpt;

mod engine;
mod interface;
mod stats;

use engine::*;
use interface::*;
use stats::StatsLog;

// pause between cards when finishing a game automatically
const AUTO_MOVE_INTERVAL: Duration = Duration::from_millis(200);

/// Play Klondike solitaire
///
/// Build the four foundations up by suit from Ace to King to win.
/// On the tableau, stack cards down in alternating colours; only a King
/// may fill an empty column. Draw from the deck one card at a time.
///
/// Type `help` at the prompt for the list of commands. By starting from a
/// seed, you can replay the same exact deal.
///
/// Set RUST_LOG (e.g. RUST_LOG=debug) for more detailed output.
#[derive(StructOpt)]
#[structopt(name = "klondike", about = "Klondike solitaire game")]
struct Opt {
    /// Seed to randomly generate game from
    #[structopt(short, long)]
    seed: Option<u64>,
    /// Save file to load
    #[structopt(short, long)]
    load: Option<PathBuf>,
    /// File to keep statistics in
    #[structopt(long, default_value = "klondike_stats.ron")]
    stats: PathBuf,
    /// Output nothing to stderr
    #[structopt(short, long)]
    quiet: bool,
    /// Finish the game automatically once no decisions are left
    #[structopt(short, long)]
    auto: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    if !opt.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    let session = initialize_session(&opt)?;
    let stats = match StatsLog::load(&opt.stats) {
        Ok(stats) => stats,
        Err(e) => {
            warn!("starting fresh statistics: {:#}", e);
            StatsLog::new()
        }
    };
    let save_dir = env::current_dir().context("finding the current directory")?;
    let mut app = App::new(session, stats, save_dir);

    println!("{}", app);
    prompt()?;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        app.tick(Instant::now());
        let reply = match line.parse::<Command>() {
            Ok(command) => app.execute(command),
            Err(e) => Err(e.into()),
        };
        match reply {
            Ok(Reply::Board) => println!("{}", app),
            Ok(Reply::Message(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => warn!("{:#}", e),
        }
        if opt.auto {
            auto_finish(&mut app);
        }
        save_stats(&app, &opt);
        prompt()?;
    }

    save_stats(&app, &opt);
    Ok(())
}

fn initialize_session(opt: &Opt) -> Result<Session> {
    if let Some(path) = &opt.load {
        if opt.seed.is_some() {
            warn!("ignoring seed in favour of loading from file");
        }
        info!("loading from {:?}", path);
        return load(path).with_context(|| format!("loading {:?}", path));
    }
    let seed = match opt.seed {
        Some(s) => s,
        None => rand::thread_rng().gen(),
    };
    info!("seed is {}", seed);
    Ok(Session::new(seed))
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("writing prompt")
}

// plays the rest of a game that needs no more decisions, one card at a time
fn auto_finish(app: &mut App) {
    let session = &app.session;
    if session.is_won() || session.is_paused() || !session.is_trivially_winnable() {
        return;
    }
    info!("finishing the game");
    while let Some(m) = app.session.auto_complete_step() {
        println!("{}", m);
        sleep(AUTO_MOVE_INTERVAL);
        app.tick(Instant::now());
    }
    app.record_progress();
    println!("{}", app);
}

fn save_stats(app: &App, opt: &Opt) {
    if let Err(e) = app.stats.save(&opt.stats) {
        warn!("could not save statistics: {:#}", e);
    }
}
