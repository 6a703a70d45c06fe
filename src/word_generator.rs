use crate::error::{TrialError, TrialResult};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Built-in practice corpus of common English words.
pub const COMMON_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "dad",
    "mom", "red", "big", "box", "yes", "yet", "run", "sun", "fun", "cat", "dog", "car", "eat",
    "got", "lot", "hot", "sit", "bit", "hit", "fit", "win", "end", "far", "off", "own", "try",
    "why", "ask", "men", "cut", "job", "eye", "oil", "six", "war", "lay", "may", "few", "pop",
    "top", "bad", "bag", "bed", "leg", "egg", "add", "age", "ago", "air", "arm", "art", "about",
    "after", "again", "against", "among", "another", "any", "around", "because", "before",
    "being", "between", "both", "came", "come", "could", "each", "even", "every", "first",
    "from", "give", "going", "good", "great", "group", "hand", "hard", "have", "here", "high",
    "home", "into", "just", "know", "large", "last", "left", "life", "like", "line", "little",
    "long", "look", "made", "make", "many", "most", "move", "much", "must", "name", "need",
    "next", "night", "number", "only", "open", "order", "other", "over", "part", "people",
    "place", "point", "right", "said", "same", "school", "seem", "several", "should", "show",
    "since", "small", "some", "still", "such", "system", "take", "than", "them", "there",
    "these", "they", "thing", "think", "this", "those", "three", "through", "time", "today",
    "together", "turn", "under", "until", "very", "water", "well", "went", "were", "what",
    "when", "where", "which", "while", "will", "with", "without", "work", "world", "would",
    "write", "year", "young", "your", "house", "never", "found", "help", "want",
];

/// Produces the target text for a new session.
pub trait TextSource: Send {
    fn generate(&mut self) -> TrialResult<String>;
}

/// Configuration for word generation
#[derive(Debug, Clone)]
pub struct WordGenConfig {
    pub sentence_count: usize,
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for WordGenConfig {
    fn default() -> Self {
        Self {
            sentence_count: 8,
            min_words: 4,
            max_words: 8,
        }
    }
}

/// Random sentences drawn from a word list
pub struct WordGenerator {
    config: WordGenConfig,
    words: Vec<&'static str>,
    rng: StdRng,
}

impl WordGenerator {
    pub fn new(config: WordGenConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic generator, mostly useful in tests.
    pub fn with_seed(config: WordGenConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WordGenConfig, rng: StdRng) -> Self {
        Self {
            config,
            words: COMMON_WORDS.to_vec(),
            rng,
        }
    }

    pub fn with_words(mut self, words: Vec<&'static str>) -> Self {
        self.words = words;
        self
    }

    fn sentence(&mut self) -> String {
        let len = self
            .rng
            .gen_range(self.config.min_words..=self.config.max_words);
        let words: Vec<&str> = (0..len)
            .filter_map(|_| self.words.choose(&mut self.rng).copied())
            .collect();

        capitalize(&format!("{}.", words.join(" ")))
    }
}

impl TextSource for WordGenerator {
    fn generate(&mut self) -> TrialResult<String> {
        let c = &self.config;
        if self.words.is_empty()
            || c.sentence_count == 0
            || c.min_words == 0
            || c.min_words > c.max_words
        {
            return Err(TrialError::EmptyCorpus);
        }

        let sentences: Vec<String> = (0..self.config.sentence_count)
            .map(|_| self.sentence())
            .collect();

        Ok(sentences.join(" "))
    }
}

/// Replays the same caller-supplied text for every session
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub String);

impl TextSource for FixedPrompt {
    fn generate(&mut self) -> TrialResult<String> {
        if self.0.is_empty() {
            return Err(TrialError::EmptyCorpus);
        }
        Ok(self.0.clone())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
