use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use typetrial::{
    controller::Controller,
    runtime::{SessionEvent, Tick},
    session::SessionPhase,
    stats::{BestStats, SessionRecord, StatsDb},
    surface::ViewState,
    TrialError,
};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Session(SessionEvent),
}

impl From<Tick> for AppEvent {
    fn from(tick: Tick) -> Self {
        AppEvent::Session(SessionEvent::Tick(tick))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Trial,
    History,
}

pub type TrialController = Controller<StatsDb, ViewState, AppEvent>;

pub struct App {
    pub controller: TrialController,
    /// Contents of the name field.
    pub name: String,
    /// Contents of the typing area, sent whole on every edit.
    pub input: String,
    pub screen: Screen,
    pub best_hint: Option<BestStats>,
    pub history: Vec<SessionRecord>,
    /// Last name a trial was started with, remembered across runs.
    pub last_started_name: Option<String>,
    pub fatal: Option<TrialError>,
}

impl App {
    pub fn new(controller: TrialController, name: String) -> Self {
        let mut app = Self {
            controller,
            name,
            input: String::new(),
            screen: Screen::Trial,
            best_hint: None,
            history: Vec::new(),
            last_started_name: None,
            fatal: None,
        };
        app.refresh_hint();
        app
    }

    pub fn phase(&self) -> SessionPhase {
        self.controller.session().phase()
    }

    pub fn view(&self) -> &ViewState {
        self.controller.surface()
    }

    /// Apply one session event. Returns whether it was accepted.
    pub fn dispatch(&mut self, event: SessionEvent) -> bool {
        match self.controller.handle(event) {
            Ok(()) => true,
            Err(e) if e.is_recoverable() => false,
            Err(e) => {
                self.fatal = Some(e);
                false
            }
        }
    }

    /// Handle a key press. Returns false when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('r') if ctrl => self.reset(),
            // The typing area is hidden behind the history screen.
            KeyCode::Tab if self.phase() != SessionPhase::Running => self.toggle_screen(),
            KeyCode::Enter => self.start_or_submit(),
            KeyCode::Backspace => self.edit(|s| {
                s.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit(|s| s.push(c)),
            _ => {}
        }

        true
    }

    fn edit(&mut self, change: impl FnOnce(&mut String)) {
        match self.phase() {
            SessionPhase::Running => {
                if !self
                    .controller
                    .session()
                    .accepts_input_at(Instant::now())
                {
                    return;
                }
                change(&mut self.input);
                let buffer = self.input.clone();
                self.dispatch(SessionEvent::InputChanged(buffer));
            }
            phase if phase.can_start() => {
                change(&mut self.name);
                self.refresh_hint();
            }
            _ => {}
        }
    }

    fn start_or_submit(&mut self) {
        if self.phase().can_start() {
            self.controller.surface_mut().clear_notices();
            let username = self.name.trim().to_string();
            if self.dispatch(SessionEvent::Start {
                username: username.clone(),
            }) {
                self.input.clear();
                self.screen = Screen::Trial;
                self.last_started_name = Some(username);
            }
        } else if self.dispatch(SessionEvent::Submit) {
            self.refresh_hint();
        }
    }

    fn reset(&mut self) {
        self.input.clear();
        self.controller.surface_mut().clear_notices();
        self.dispatch(SessionEvent::Reset);
    }

    fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Trial => {
                self.refresh_history();
                Screen::History
            }
            Screen::History => Screen::Trial,
        };
    }

    /// History filtered by the name field, or everyone when it is empty.
    pub fn history_filter(&self) -> Option<&str> {
        Some(self.name.trim()).filter(|n| !n.is_empty())
    }

    fn refresh_history(&mut self) {
        let filter = self.history_filter().map(str::to_string);
        self.history = self
            .controller
            .history(filter.as_deref())
            .unwrap_or_else(|e| {
                warn!("could not load history: {}", e);
                Vec::new()
            });
    }

    fn refresh_hint(&mut self) {
        self.best_hint = self.controller.best_stats_for(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use typetrial::session::Session;
    use typetrial::surface::Notice;
    use typetrial::word_generator::FixedPrompt;

    fn app(text: &str, secs: u64) -> (App, mpsc::Receiver<AppEvent>) {
        let session = Session::new(
            Duration::from_secs(secs),
            Box::new(FixedPrompt(text.to_string())),
        )
        .unwrap();
        let (tx, rx) = mpsc::channel();
        let controller = Controller::new(
            session,
            StatsDb::open_in_memory().unwrap(),
            ViewState::new(Duration::from_secs(secs)),
            tx,
            Duration::from_secs(3600),
        );
        (App::new(controller, String::new()), rx)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn expire(app: &mut App) {
        let generation = app.controller.session().generation();
        while app.phase() == SessionPhase::Running {
            app.dispatch(SessionEvent::Tick(Tick { generation }));
        }
    }

    #[test]
    fn typing_before_start_edits_name() {
        let (mut app, _rx) = app("abc", 60);
        type_str(&mut app, "adax");
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.name, "ada");
        assert_eq!(app.input, "");
        assert_eq!(app.best_hint, Some(BestStats::default()));
    }

    #[test]
    fn enter_without_name_is_rejected() {
        let (mut app, _rx) = app("abc", 60);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.phase(), SessionPhase::Idle);
        assert!(matches!(app.view().last_notice(), Some(Notice::Rejected(_))));
        assert!(app.fatal.is_none());
    }

    #[test]
    fn full_trial_through_keys() {
        let (mut app, _rx) = app("abc", 5);
        type_str(&mut app, "ada");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), SessionPhase::Running);
        assert_eq!(app.last_started_name.as_deref(), Some("ada"));

        type_str(&mut app, "abx");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "ab");
        assert_eq!(app.controller.session().typed(), "ab");

        // Enter while running asks to submit and is refused.
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), SessionPhase::Running);

        expire(&mut app);
        press(&mut app, KeyCode::Char('z'));
        assert_eq!(app.input, "ab");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), SessionPhase::Submitted);
        assert_eq!(app.best_hint.map(|b| b.total_tests), Some(1));
    }

    #[test]
    fn ctrl_r_resets() {
        let (mut app, _rx) = app("abc", 60);
        type_str(&mut app, "ada");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "ab");

        assert!(app.on_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)));
        assert_eq!(app.phase(), SessionPhase::Idle);
        assert_eq!(app.input, "");
        assert_eq!(app.view().metrics.total_chars, 0);
    }

    #[test]
    fn tab_toggles_history() {
        let (mut app, _rx) = app("abc", 60);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::History);
        assert!(app.history.is_empty());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Trial);
    }

    #[test]
    fn tab_is_ignored_while_running() {
        let (mut app, _rx) = app("abc", 60);
        type_str(&mut app, "ada");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Trial);
        type_str(&mut app, "ab");
        assert_eq!(app.controller.session().typed(), "ab");

        expire(&mut app);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::History);
    }

    #[test]
    fn database_failure_on_submit_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let session = Session::new(
            Duration::from_secs(1),
            Box::new(FixedPrompt("abc".to_string())),
        )
        .unwrap();
        let (tx, _rx) = mpsc::channel();
        let controller = Controller::new(
            session,
            StatsDb::open(&path).unwrap(),
            ViewState::new(Duration::from_secs(1)),
            tx,
            Duration::from_secs(3600),
        );
        let mut app = App::new(controller, "ada".to_string());

        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "ab");
        expire(&mut app);

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("DROP TABLE user_stats", [])
            .unwrap();
        press(&mut app, KeyCode::Enter);

        assert!(app.fatal.is_none());
        assert_eq!(app.phase(), SessionPhase::Expired);
        assert!(matches!(
            app.view().last_notice(),
            Some(Notice::SubmitFailed(_))
        ));

        // Reopening restores the schema; the same result can then be saved.
        drop(StatsDb::open(&path).unwrap());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), SessionPhase::Submitted);
        assert_eq!(app.best_hint.map(|b| b.total_tests), Some(1));
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let (mut app, _rx) = app("abc", 60);
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(!app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }
}
