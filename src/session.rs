use crate::error::{TrialError, TrialResult};
use crate::scoring::{self, LiveMetrics, Scorecard};
use crate::stats::ResultStore;
use crate::word_generator::TextSource;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TRIAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    Running,
    Expired,
    Submitted,
}

impl SessionPhase {
    pub fn can_start(&self) -> bool {
        matches!(self, SessionPhase::Idle | SessionPhase::Submitted)
    }
}

/// What a timer tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale generation, or the session is not running.
    Ignored,
    Counted { remaining_secs: u64 },
    Expired,
}

/// Summary of a finished trial, built once at submission
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub username: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub cpm: u32,
    pub duration_secs: u64,
    pub timestamp: DateTime<Local>,
}

impl SessionResult {
    pub fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// A single user's typing trial and its lifecycle.
///
/// `Idle -> Running -> Expired -> Submitted`, with `Reset` returning to `Idle` from
/// anywhere. Every `Start` and `Reset` bumps the generation so ticks from an older
/// timer can be recognised and dropped.
pub struct Session {
    phase: SessionPhase,
    generation: u64,
    trial: Duration,
    text_source: Box<dyn TextSource>,
    target: String,
    typed: String,
    username: Option<String>,
    started_at: Option<Instant>,
    remaining_secs: u64,
    scorecard: Scorecard,
    metrics: LiveMetrics,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("username", &self.username)
            .field("remaining_secs", &self.remaining_secs)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(trial: Duration, mut text_source: Box<dyn TextSource>) -> TrialResult<Self> {
        let target = text_source.generate()?;
        let scorecard = scoring::classify(&target, "");

        Ok(Self {
            phase: SessionPhase::Idle,
            generation: 0,
            trial,
            text_source,
            target,
            typed: String::new(),
            username: None,
            started_at: None,
            remaining_secs: trial.as_secs(),
            scorecard,
            metrics: LiveMetrics::cleared(trial),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trial(&self) -> Duration {
        self.trial
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    pub fn metrics(&self) -> LiveMetrics {
        self.metrics
    }

    pub fn start(&mut self, username: &str) -> TrialResult<u64> {
        self.start_at(username, Instant::now())
    }

    /// Begin a new trial. Returns the generation the trial's timer must carry.
    pub fn start_at(&mut self, username: &str, now: Instant) -> TrialResult<u64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TrialError::validation(
                "Please enter your name before starting the test.",
            ));
        }
        if !self.phase.can_start() {
            return Err(TrialError::validation(format!(
                "Cannot start a test while {}",
                self.phase
            )));
        }

        self.target = self.text_source.generate()?;
        self.generation += 1;
        self.phase = SessionPhase::Running;
        self.username = Some(username.to_string());
        self.started_at = Some(now);
        self.clear_progress();

        info!(
            "session {} started for {} ({}s)",
            self.generation,
            username,
            self.trial.as_secs()
        );
        Ok(self.generation)
    }

    /// Whether typed input is still being accepted at `now`.
    pub fn accepts_input_at(&self, now: Instant) -> bool {
        match (self.phase, self.started_at) {
            (SessionPhase::Running, Some(started)) => {
                now.saturating_duration_since(started) < self.trial
            }
            _ => false,
        }
    }

    pub fn input_changed(&mut self, buffer: &str) -> Option<LiveMetrics> {
        self.input_changed_at(buffer, Instant::now())
    }

    /// Replace the typed buffer and rescore. `None` when input is not accepted.
    pub fn input_changed_at(&mut self, buffer: &str, now: Instant) -> Option<LiveMetrics> {
        if !self.accepts_input_at(now) {
            return None;
        }
        let elapsed = self
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();

        self.typed.clear();
        self.typed.push_str(buffer);
        self.scorecard = scoring::classify(&self.target, &self.typed);
        self.metrics = LiveMetrics {
            wpm: scoring::live_wpm(self.scorecard.correct, elapsed),
            accuracy: self.scorecard.accuracy(),
            total_chars: self.scorecard.total_typed,
            remaining_secs: self.remaining_secs,
        };

        Some(self.metrics)
    }

    /// Count down one second for the trial tagged `generation`.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation || self.phase != SessionPhase::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.metrics.remaining_secs = self.remaining_secs;

        if self.remaining_secs == 0 {
            self.phase = SessionPhase::Expired;
            info!("session {} expired", self.generation);
            TickOutcome::Expired
        } else {
            TickOutcome::Counted {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    pub fn submit(&mut self, store: &mut dyn ResultStore) -> TrialResult<SessionResult> {
        self.submit_at(store, Local::now())
    }

    /// Score the finished trial and persist it. On a store failure the session stays
    /// `Expired` so the submit can be retried.
    pub fn submit_at(
        &mut self,
        store: &mut dyn ResultStore,
        timestamp: DateTime<Local>,
    ) -> TrialResult<SessionResult> {
        if self.phase != SessionPhase::Expired {
            return Err(TrialError::validation(
                "Please complete the test before submitting.",
            ));
        }

        let result = self.final_result(timestamp);
        if let Err(e) = store.save(&result) {
            warn!("submit of session {} failed: {}", self.generation, e);
            return Err(e);
        }

        self.phase = SessionPhase::Submitted;
        info!(
            "session {} submitted: {} wpm, {}% accuracy",
            self.generation, result.wpm, result.accuracy
        );
        Ok(result)
    }

    fn final_result(&self, timestamp: DateTime<Local>) -> SessionResult {
        let card = &self.scorecard;

        SessionResult {
            username: self.username.clone().unwrap_or_default(),
            wpm: scoring::final_wpm(card.correct, self.trial),
            accuracy: card.accuracy(),
            total_chars: card.total_typed,
            correct_chars: card.correct,
            incorrect_chars: card.incorrect,
            cpm: scoring::cpm(card.total_typed, self.trial),
            duration_secs: self.trial.as_secs(),
            timestamp,
        }
    }

    /// Abandon whatever is in progress and get ready for a new start.
    pub fn reset(&mut self) -> TrialResult<()> {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.started_at = None;
        let regenerated = self.text_source.generate();
        if let Ok(target) = &regenerated {
            self.target.clone_from(target);
        }
        self.clear_progress();

        regenerated.map(|_| ())
    }

    fn clear_progress(&mut self) {
        self.typed.clear();
        self.remaining_secs = self.trial.as_secs();
        self.scorecard = scoring::classify(&self.target, "");
        self.metrics = LiveMetrics::cleared(self.trial);
    }
}
