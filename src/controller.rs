use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::{TrialError, TrialResult};
use crate::rating::PerformanceTier;
use crate::runtime::{SessionEvent, Tick, TimerHandle};
use crate::session::{Session, SessionResult, TickOutcome};
use crate::stats::{BestStats, ResultStore, SessionRecord};
use crate::surface::{Notice, RenderSurface};

/// Names shorter than this do not trigger a personal-best lookup.
pub const MIN_HINT_NAME_LEN: usize = 3;

/// Applies session events one at a time.
///
/// This is the only place session state is mutated: keystrokes and timer ticks both
/// arrive as [`SessionEvent`]s on one queue and are handled here in order. Timers send
/// into `tick_tx`, which feeds that same queue.
pub struct Controller<S, R, E> {
    session: Session,
    store: S,
    surface: R,
    tick_tx: Sender<E>,
    tick_interval: Duration,
    timer: Option<TimerHandle>,
}

impl<S, R, E> Controller<S, R, E>
where
    S: ResultStore,
    R: RenderSurface,
    E: From<Tick> + Send + 'static,
{
    pub fn new(
        session: Session,
        store: S,
        surface: R,
        tick_tx: Sender<E>,
        tick_interval: Duration,
    ) -> Self {
        let mut controller = Self {
            session,
            store,
            surface,
            tick_tx,
            tick_interval,
            timer: None,
        };
        controller.render();
        controller
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Generation of the running countdown, if any.
    pub fn timer_generation(&self) -> Option<u64> {
        self.timer.as_ref().map(TimerHandle::generation)
    }

    pub fn handle(&mut self, event: SessionEvent) -> TrialResult<()> {
        match event {
            SessionEvent::Start { username } => self.start(&username),
            SessionEvent::InputChanged(buffer) => {
                self.input_changed(&buffer);
                Ok(())
            }
            SessionEvent::Tick(tick) => {
                self.tick(tick);
                Ok(())
            }
            SessionEvent::Submit => self.submit().map(|_| ()),
            SessionEvent::Reset => self.reset(),
        }
    }

    fn start(&mut self, username: &str) -> TrialResult<()> {
        match self.session.start(username) {
            Ok(generation) => {
                // Replacing the handle retires any timer from an older generation.
                self.timer = Some(TimerHandle::spawn(
                    self.tick_tx.clone(),
                    generation,
                    self.tick_interval,
                ));
                self.render();
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn input_changed(&mut self, buffer: &str) {
        match self.session.input_changed(buffer) {
            Some(metrics) => {
                self.surface
                    .render_classification(&self.session.scorecard().chars);
                self.surface.render_metrics(&metrics);
            }
            None => debug!("input ignored in {} state", self.session.phase()),
        }
    }

    fn tick(&mut self, tick: Tick) {
        match self.session.tick(tick.generation) {
            TickOutcome::Ignored => {
                debug!(
                    "ignored tick for generation {} (current {})",
                    tick.generation,
                    self.session.generation()
                );
            }
            TickOutcome::Counted { .. } => {
                self.surface.render_metrics(&self.session.metrics());
            }
            TickOutcome::Expired => {
                self.stop_timer();
                self.surface.render_metrics(&self.session.metrics());
                self.surface.notify(Notice::TimeUp);
            }
        }
    }

    fn submit(&mut self) -> TrialResult<SessionResult> {
        let result = match self.session.submit(&mut self.store) {
            Ok(result) => result,
            Err(e) => return Err(self.report(e)),
        };

        let best = self
            .store
            .best_stats(&result.username)
            .unwrap_or_else(|e| {
                warn!("could not load best stats for {}: {}", result.username, e);
                BestStats::default()
            });
        self.surface.notify(Notice::Submitted {
            tier: PerformanceTier::for_result(result.wpm, result.accuracy),
            result: result.clone(),
            best,
        });

        Ok(result)
    }

    fn reset(&mut self) -> TrialResult<()> {
        self.stop_timer();
        let reset = self.session.reset();
        self.render();
        reset.map_err(|e| self.report(e))
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn render(&mut self) {
        self.surface
            .render_classification(&self.session.scorecard().chars);
        self.surface.render_metrics(&self.session.metrics());
    }

    fn report(&mut self, e: TrialError) -> TrialError {
        match &e {
            TrialError::Validation(msg) => self.surface.notify(Notice::Rejected(msg.clone())),
            TrialError::EmptyCorpus => error!("{}", e),
            other => self.surface.notify(Notice::SubmitFailed(other.to_string())),
        }
        e
    }

    /// Personal bests for the name being typed, once it is long enough to look up.
    pub fn best_stats_for(&self, name: &str) -> Option<BestStats> {
        let name = name.trim();
        if name.chars().count() < MIN_HINT_NAME_LEN {
            return None;
        }
        self.store
            .best_stats(name)
            .map_err(|e| warn!("best stats lookup failed: {}", e))
            .ok()
    }

    pub fn history(&self, username: Option<&str>) -> TrialResult<Vec<SessionRecord>> {
        self.store.query_by_user(username)
    }
}
