use itertools::{EitherOrBoth, Itertools};
use std::time::Duration;

/// Characters per "word" when converting character counts into WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Correct,
    Incorrect,
    /// The next character to type.
    Current,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedChar {
    pub char: char,
    pub class: Classification,
}

/// Result of comparing the typed buffer against the target text.
///
/// Holds no state of its own; it is rebuilt from scratch on every input change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scorecard {
    pub chars: Vec<ClassifiedChar>,
    pub correct: usize,
    pub incorrect: usize,
    /// Every typed character, including any typed past the end of the target.
    pub total_typed: usize,
}

impl Scorecard {
    /// Characters typed beyond the end of the target text.
    pub fn overrun(&self) -> usize {
        self.total_typed - (self.correct + self.incorrect)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.chars
            .iter()
            .position(|c| c.class == Classification::Current)
    }

    pub fn accuracy(&self) -> u32 {
        accuracy(self.correct, self.total_typed)
    }
}

/// Classify every target character against the typed buffer.
///
/// Comparison is per codepoint and case-sensitive. Typed characters past the end of the
/// target are not classified but still count towards `total_typed`.
pub fn classify(target: &str, typed: &str) -> Scorecard {
    let mut card = Scorecard::default();
    let mut current_assigned = false;

    for pair in target.chars().zip_longest(typed.chars()) {
        match pair {
            EitherOrBoth::Both(expected, actual) => {
                card.total_typed += 1;
                let class = if expected == actual {
                    card.correct += 1;
                    Classification::Correct
                } else {
                    card.incorrect += 1;
                    Classification::Incorrect
                };
                card.chars.push(ClassifiedChar {
                    char: expected,
                    class,
                });
            }
            EitherOrBoth::Left(expected) => {
                let class = if current_assigned {
                    Classification::Pending
                } else {
                    current_assigned = true;
                    Classification::Current
                };
                card.chars.push(ClassifiedChar {
                    char: expected,
                    class,
                });
            }
            EitherOrBoth::Right(_) => card.total_typed += 1,
        }
    }

    card
}

fn per_minute(count: f64, secs: f64) -> u32 {
    if secs <= 0.0 {
        return 0;
    }
    (count / secs * 60.0).round() as u32
}

/// Running estimate: correct characters over wall-clock time since start.
pub fn live_wpm(correct: usize, elapsed: Duration) -> u32 {
    per_minute(correct as f64 / CHARS_PER_WORD, elapsed.as_secs_f64())
}

/// Final score: correct characters over the fixed trial length, not the elapsed time.
pub fn final_wpm(correct: usize, trial: Duration) -> u32 {
    per_minute(correct as f64 / CHARS_PER_WORD, trial.as_secs_f64())
}

/// Percentage of typed characters that were correct; 100 when nothing was typed.
pub fn accuracy(correct: usize, total_typed: usize) -> u32 {
    if total_typed == 0 {
        return 100;
    }
    (correct as f64 / total_typed as f64 * 100.0).round() as u32
}

pub fn cpm(total_typed: usize, duration: Duration) -> u32 {
    per_minute(total_typed as f64, duration.as_secs_f64())
}

/// Values shown in the stats row while a trial is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveMetrics {
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub remaining_secs: u64,
}

impl LiveMetrics {
    /// The cleared display: `WPM 0`, `Accuracy 100%`, `Chars 0`, full time remaining.
    pub fn cleared(trial: Duration) -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            total_chars: 0,
            remaining_secs: trial.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(card: &Scorecard) -> Vec<Classification> {
        card.chars.iter().map(|c| c.class).collect()
    }

    #[test]
    fn test_exact_match() {
        let card = classify("the cat sat", "the cat sat");

        assert_eq!(card.correct, 11);
        assert_eq!(card.incorrect, 0);
        assert_eq!(card.total_typed, 11);
        assert_eq!(card.accuracy(), 100);
        assert_eq!(card.current_index(), None);
    }

    #[test]
    fn test_partial_mismatch() {
        let card = classify("the cat sat", "the bat sat");

        assert_eq!(card.chars[4].class, Classification::Incorrect);
        assert_eq!(card.chars[4].char, 'c');
        assert_eq!(card.correct, 10);
        assert_eq!(card.incorrect, 1);
        assert_eq!(card.accuracy(), 91);
        assert!(card
            .chars
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 4)
            .all(|(_, c)| c.class == Classification::Correct));
    }

    #[test]
    fn test_overrun_uses_full_typed_length() {
        let card = classify("hello", "hellxabc");

        assert_eq!(card.chars.len(), 5);
        assert_eq!(card.total_typed, 8);
        assert_eq!(card.correct, 4);
        assert_eq!(card.incorrect, 1);
        assert_eq!(card.overrun(), 3);
        assert_eq!(card.accuracy(), 50);
    }

    #[test]
    fn test_empty_buffer() {
        let card = classify("abc", "");

        assert_eq!(
            classes(&card),
            vec![
                Classification::Current,
                Classification::Pending,
                Classification::Pending
            ]
        );
        assert_eq!(card.total_typed, 0);
        assert_eq!(card.accuracy(), 100);
    }

    #[test]
    fn test_partial_progress() {
        let card = classify("abcd", "ax");

        assert_eq!(
            classes(&card),
            vec![
                Classification::Correct,
                Classification::Incorrect,
                Classification::Current,
                Classification::Pending
            ]
        );
        assert_eq!(card.current_index(), Some(2));
    }

    #[test]
    fn test_case_sensitive() {
        let card = classify("The", "the");
        assert_eq!(card.chars[0].class, Classification::Incorrect);
    }

    #[test]
    fn test_multibyte_compares_by_codepoint() {
        let card = classify("café au lait", "café");

        assert_eq!(card.correct, 4);
        assert_eq!(card.current_index(), Some(4));
    }

    #[test]
    fn test_live_wpm_zero_elapsed() {
        assert_eq!(live_wpm(25, Duration::ZERO), 0);
    }

    #[test]
    fn test_live_wpm() {
        // 50 correct chars = 10 words in 30s
        assert_eq!(live_wpm(50, Duration::from_secs(30)), 20);
        assert_eq!(live_wpm(0, Duration::from_secs(12)), 0);
    }

    #[test]
    fn test_final_wpm_uses_trial_length() {
        assert_eq!(final_wpm(200, Duration::from_secs(60)), 40);
        assert_eq!(final_wpm(203, Duration::from_secs(60)), 41);
        assert_eq!(final_wpm(10, Duration::ZERO), 0);
    }

    #[test]
    fn test_accuracy_rounds() {
        assert_eq!(accuracy(0, 0), 100);
        assert_eq!(accuracy(2, 3), 67);
        assert_eq!(accuracy(0, 4), 0);
    }

    #[test]
    fn test_cpm() {
        assert_eq!(cpm(250, Duration::from_secs(60)), 250);
        assert_eq!(cpm(250, Duration::from_secs(30)), 500);
        assert_eq!(cpm(5, Duration::ZERO), 0);
    }

    #[test]
    fn test_cleared_metrics() {
        let m = LiveMetrics::cleared(Duration::from_secs(60));
        assert_eq!(m.wpm, 0);
        assert_eq!(m.accuracy, 100);
        assert_eq!(m.total_chars, 0);
        assert_eq!(m.remaining_secs, 60);
    }
}
