use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mindgames::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::SessionLog,
    runtime::{ChannelEventSource, MonotonicClock, Runner},
    score_store::ScoreStore,
    App, AppState, GameKind,
};

/// cognitive mini-games in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Nine small cognitive games (reaction time, aim, n-back, simon, color vision, visual memory, typing, number memory and precision clicking) with best scores kept on this machine."
)]
pub struct Cli {
    /// jump straight into a game
    #[clap(short = 'g', long, value_enum)]
    game: Option<GameKind>,

    /// n for the n-back game
    #[clap(short = 'n', long)]
    nback_level: Option<u32>,

    /// length of an aim trainer run in seconds
    #[clap(long)]
    aim_secs: Option<u32>,

    /// length of a typing test in seconds
    #[clap(long)]
    typing_secs: Option<u32>,

    /// seed the stimulus generators for a repeatable run
    #[clap(long)]
    seed: Option<u64>,

    /// keep the options given on this command line as defaults
    #[clap(long)]
    save_config: bool,

    /// list the games and exit
    #[clap(long)]
    list: bool,

    /// print best scores and exit
    #[clap(long)]
    scores: bool,

    /// delete every saved score and the session history, then exit
    #[clap(long)]
    clear_scores: bool,
}

impl Cli {
    /// Apply command line overrides on top of stored preferences
    fn apply(&self, mut config: Config) -> Config {
        if let Some(n) = self.nback_level {
            config.nback_level = n;
        }
        if let Some(secs) = self.aim_secs {
            config.aim_secs = secs;
        }
        if let Some(secs) = self.typing_secs {
            config.typing_secs = secs;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let log_dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "mindgames.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Some(guard)
}

fn print_games() {
    for (idx, kind) in GameKind::ALL.iter().enumerate() {
        println!(
            "{}. {:<16} {:<18} {:<11} {}",
            idx + 1,
            kind.to_string(),
            kind.name(),
            kind.category(),
            kind.description()
        );
    }
}

fn print_scores(store: &ScoreStore) {
    for kind in GameKind::ALL {
        let best = store
            .best(kind)
            .map(|v| kind.format_score(v))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<18} {best}", kind.name());
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _guard = init_logging();

    if cli.list {
        print_games();
        return Ok(());
    }
    if cli.scores {
        print_scores(&ScoreStore::open_default());
        return Ok(());
    }
    if cli.clear_scores {
        let removed = ScoreStore::open_default().clear_all()?;
        println!("cleared {removed} saved scores");
        if let Some(log) = SessionLog::open_default() {
            if log.clear()? {
                println!("deleted session history {}", log.path().display());
            }
        }
        return Ok(());
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    for kind in GameKind::ALL {
        if let Err(err) = config.game_config(kind).validate(kind) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("{kind}: {err}")).exit();
        }
    }
    if cli.save_config {
        config_store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    tracing::info!("mindgames starting up");
    let mut app = App::new(config, ScoreStore::open_default(), SessionLog::open_default());
    if let Some(kind) = cli.game {
        app.menu_index = GameKind::ALL.iter().position(|&k| k == kind).unwrap_or(0);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, cli.game);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("mindgames shutting down");
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    game: Option<GameKind>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(ChannelEventSource::crossterm(), MonotonicClock::new());

    let size = terminal.size()?;
    app.on_resize(Rect::new(0, 0, size.width, size.height));
    if let (Some(kind), AppState::Menu) = (game, app.state) {
        app.start_game(kind, runner.now());
    }

    while !app.should_quit {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        runner.drive(app);
    }

    Ok(())
}
