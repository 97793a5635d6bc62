use std::fs::File;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use irq_shooter::config::Config;
use irq_shooter::dispatch;
use irq_shooter::host::{Geometry, TerminalInterrupts, TerminalVideo};
use irq_shooter::input::ScriptedInterrupts;
use irq_shooter::scores::{FileScores, ScoreStore};
use irq_shooter::session::Session;
use irq_shooter::sprite::ProceduralSprites;
use irq_shooter::video::HeadlessDevice;

#[derive(Debug, Parser)]
#[command(name = "irq_shooter", about = "Interrupt-driven arcade shooter")]
struct Cli {
    /// TOML file overriding the built-in tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leaderboard file (defaults to ~/.irq_shooter_scores)
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Where log output goes; the terminal itself is the display
    #[arg(long, default_value = "irq_shooter.log")]
    log: PathBuf,

    /// Run on an in-memory device with a synthetic timer, then quit
    #[arg(long)]
    headless: bool,

    /// Timer ticks to run in headless mode
    #[arg(long, default_value_t = 300, requires = "headless")]
    ticks: usize,

    /// Seed for enemy placement
    #[arg(long)]
    seed: Option<u64>,
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn setup_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log)?;

    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let store: Box<dyn ScoreStore> = Box::new(FileScores::new(
        cli.scores.clone().unwrap_or_else(FileScores::default_path),
    ));
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if cli.headless {
        return run_headless(config, store, rng, cli.ticks);
    }
    run_terminal(config, store, rng)
}

fn run_headless(config: Config, store: Box<dyn ScoreStore>, rng: StdRng, ticks: usize) -> Result<()> {
    let mut session = Session::new(
        config,
        Box::new(HeadlessDevice::new()),
        Box::new(ProceduralSprites),
        store,
        rng,
    )
    .context("starting headless session")?;
    let mut source = ScriptedInterrupts::ticks_then_escape(ticks);
    let summary = dispatch::run(&mut session, &mut source)?;
    println!("{} ticks, final state {}", summary.ticks, session.state());
    Ok(())
}

fn run_terminal(config: Config, store: Box<dyn ScoreStore>, rng: StdRng) -> Result<()> {
    let mut out = stdout();

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Request key-release events. Terminals without the kitty protocol
    // ignore this and get synthesised releases instead.
    let key_releases = terminal::supports_keyboard_enhancement().unwrap_or(false)
        && out
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .is_ok();
    info!(key_releases, "terminal ready");

    let result = play(config, store, rng, key_releases);

    // Always restore the terminal
    if key_releases {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();

    if let Err(e) = &result {
        error!(error = %e, "game aborted");
    }
    result
}

fn play(config: Config, store: Box<dyn ScoreStore>, rng: StdRng, key_releases: bool) -> Result<()> {
    let geometry = Geometry::new();
    let video = TerminalVideo::new(geometry.clone(), config.cursor_start);
    let mut source = TerminalInterrupts::start(config.tick_hz, geometry, key_releases);

    let mut session = Session::new(config, Box::new(video), Box::new(ProceduralSprites), store, rng)
        .context("bringing up the display")?;
    dispatch::run(&mut session, &mut source)?;
    Ok(())
}
