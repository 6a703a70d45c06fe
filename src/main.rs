mod app;
mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::{mpsc, Mutex},
    thread,
    time::Duration,
};
use tracing::{info, warn, Level};
use typetrial::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::Controller,
    runtime::{ChannelEventSource, Runner, Step, TICK_INTERVAL},
    session::Session,
    stats::{export_csv, ResultStore, StatsDb},
    surface::ViewState,
    word_generator::{FixedPrompt, TextSource, WordGenerator},
};

use crate::app::{App, AppEvent};

/// How often the screen is redrawn when nothing happens.
const REDRAW_INTERVAL_MS: u64 = 250;

/// fixed-duration typing trial with live scoring and per-user history
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// name to record results under (pre-fills the name field)
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// custom text to type instead of generated sentences
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// trial length in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u64).range(1..))]
    secs: Option<u64>,

    /// results database file
    #[clap(long)]
    db: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the stored results as CSV to this file and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// only export results for this user
    #[clap(long, requires = "export_history")]
    user: Option<String>,

    /// log at debug level
    #[clap(long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.secs {
            config.trial_secs = secs;
        }
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
    }

    fn text_source(&self, config: &Config) -> Box<dyn TextSource> {
        match &self.prompt {
            Some(prompt) => Box::new(FixedPrompt(prompt.clone())),
            None => Box::new(WordGenerator::new(config.word_gen())),
        }
    }
}

fn init_logging(path: &Path, debug: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_path = AppDirs::log_path();
    if let Err(e) = init_logging(&log_path, cli.debug) {
        eprintln!("logging disabled: cannot write {}: {}", log_path.display(), e);
    }

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let mut config = config_store.load();
    cli.apply(&mut config);

    let db = StatsDb::open(config.resolved_db_path())?;

    if let Some(path) = &cli.export_history {
        let records = db.query_by_user(cli.user.as_deref())?;
        export_csv(&records, File::create(path)?)?;
        info!("exported {} records to {}", records.len(), path.display());
        println!("Exported {} records to {}", records.len(), path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = Session::new(config.trial(), cli.text_source(&config))?;
    let (tx, rx) = mpsc::channel();
    spawn_key_reader(tx.clone());

    let controller = Controller::new(
        session,
        db,
        ViewState::new(config.trial()),
        tx,
        TICK_INTERVAL,
    );
    let name = cli
        .name
        .clone()
        .or_else(|| config.last_username.clone())
        .unwrap_or_default();
    let mut app = App::new(controller, name);
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        Duration::from_millis(REDRAW_INTERVAL_MS),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(name) = app.last_started_name.take() {
        // Reload so CLI overrides are not written back.
        let mut saved = config_store.load();
        saved.last_username = Some(name);
        if let Err(e) = config_store.save(&saved) {
            warn!("could not save config: {}", e);
        }
    }

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<ChannelEventSource<AppEvent>>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            Step::Event(AppEvent::Key(key)) => {
                if !app.on_key(key) {
                    break;
                }
            }
            Step::Event(AppEvent::Session(event)) => {
                app.dispatch(event);
            }
            Step::Event(AppEvent::Resize) | Step::Idle => {}
            Step::Closed => break,
        }

        if let Some(e) = app.fatal.take() {
            return Err(e.into());
        }
    }

    Ok(())
}

fn spawn_key_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(Event::Key(key)) => AppEvent::Key(key),
            Ok(Event::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(_) => break,
        };

        if tx.send(evt).is_err() {
            break;
        }
    });
}
