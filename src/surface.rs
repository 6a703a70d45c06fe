use crate::rating::PerformanceTier;
use crate::scoring::{ClassifiedChar, LiveMetrics};
use crate::session::SessionResult;
use crate::stats::BestStats;
use std::time::Duration;

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A command was refused; the session did not change.
    Rejected(String),
    TimeUp,
    Submitted {
        result: SessionResult,
        tier: PerformanceTier,
        best: BestStats,
    },
    /// The result could not be stored; submit may be retried.
    SubmitFailed(String),
}

/// Display side of a typing trial. The controller pushes every recompute here.
pub trait RenderSurface {
    fn render_classification(&mut self, chars: &[ClassifiedChar]);
    fn render_metrics(&mut self, metrics: &LiveMetrics);
    fn notify(&mut self, notice: Notice);
}

/// Keeps the latest rendered values so a frontend can draw them at its own pace
#[derive(Debug, Clone)]
pub struct ViewState {
    pub classification: Vec<ClassifiedChar>,
    pub metrics: LiveMetrics,
    pub notices: Vec<Notice>,
}

impl ViewState {
    pub fn new(trial: Duration) -> Self {
        Self {
            classification: Vec::new(),
            metrics: LiveMetrics::cleared(trial),
            notices: Vec::new(),
        }
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }
}

impl RenderSurface for ViewState {
    fn render_classification(&mut self, chars: &[ClassifiedChar]) {
        self.classification.clear();
        self.classification.extend_from_slice(chars);
    }

    fn render_metrics(&mut self, metrics: &LiveMetrics) {
        self.metrics = *metrics;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
