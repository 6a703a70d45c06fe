/// Verdict shown alongside a submitted result
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PerformanceTier {
    Master,
    Great,
    Good,
    KeepPracticing,
}

impl PerformanceTier {
    pub fn for_result(wpm: u32, accuracy: u32) -> Self {
        match (wpm, accuracy) {
            (w, a) if w >= 40 && a >= 95 => PerformanceTier::Master,
            (w, a) if w >= 30 && a >= 90 => PerformanceTier::Great,
            (w, a) if w >= 20 && a >= 80 => PerformanceTier::Good,
            _ => PerformanceTier::KeepPracticing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PerformanceTier::Master => "Excellent! You're a typing master!",
            PerformanceTier::Great => "Great job! You're doing well!",
            PerformanceTier::Good => "Good work! Keep practicing!",
            PerformanceTier::KeepPracticing => "Keep practicing to improve!",
        }
    }
}
