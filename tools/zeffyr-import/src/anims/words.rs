//! Splitting run-together animation names (`idleplay` -> `idle play`)

use hashbrown::HashMap;

/// Splits a concatenated lowercase name into words
pub trait WordSplitter {
    fn split(&self, text: &str) -> Vec<String>;

    /// Words joined with `_`
    fn snake_case(&self, text: &str) -> String {
        self.split(text).join("_")
    }
}

/// Common animation vocabulary, most frequent first
pub const DEFAULT_WORDS: &[&str] = &[
    "idle", "walk", "run", "jump", "fall", "land", "climb", "look", "up", "down", "left", "right",
    "front", "back", "side", "to", "from", "in", "out", "on", "off", "play", "ladder", "vine",
    "ledge", "grab", "push", "pull", "drop", "lift", "throw", "carry", "heavy", "light", "turn",
    "around", "open", "door", "enter", "exit", "slide", "swim", "dive", "sleep", "wake", "talk",
    "read", "sit", "stand", "stop", "start", "teeter", "shimmy", "hurt", "die", "death", "spin",
    "bomb", "key", "chest", "treasure", "find", "get", "cube", "bit", "warp", "gate", "rotate",
    "yawn", "blink", "fly", "hang", "wall", "edge", "lower", "raise", "big", "small", "wave",
    "hello", "bye", "happy", "sad", "angry", "scared", "dance", "eat", "drink", "fish", "hat",
];

/// Cost assigned to a single character no word covers
const UNKNOWN_COST: f64 = 1.0e3;

/// Minimum-cost segmentation over a ranked dictionary.
///
/// A word of rank `r` costs `ln((r + 1) * ln(n))`, so frequent and long words
/// win. Characters no word covers are kept and merged into one token.
#[derive(Debug, Clone)]
pub struct DictionarySplitter {
    words: HashMap<String, f64>,
    longest: usize,
}

impl DictionarySplitter {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        let n = (words.len().max(2)) as f64;
        let mut costs = HashMap::new();
        let mut longest = 0;
        for (rank, word) in words.iter().enumerate() {
            let word = word.as_ref().to_lowercase();
            if word.is_empty() || costs.contains_key(&word) {
                continue;
            }
            longest = longest.max(word.chars().count());
            costs.insert(word, ((rank + 1) as f64 * n.ln()).ln());
        }
        Self {
            words: costs,
            longest,
        }
    }

    /// Configured words ranked ahead of the defaults
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Self {
        let words: Vec<&str> = extra
            .iter()
            .map(|w| w.as_ref())
            .chain(DEFAULT_WORDS.iter().copied())
            .collect();
        Self::new(&words)
    }
}

impl Default for DictionarySplitter {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS)
    }
}

impl WordSplitter for DictionarySplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let lower: Vec<char> = text.to_lowercase().chars().collect();
        if chars.is_empty() || chars.len() != lower.len() {
            return vec![text.to_string()];
        }

        // best[i] = (cost, start of last token, last token is a word)
        let mut best: Vec<(f64, usize, bool)> = vec![(0.0, 0, true); chars.len() + 1];
        for end in 1..=chars.len() {
            let mut choice = (best[end - 1].0 + UNKNOWN_COST, end - 1, false);
            for start in end.saturating_sub(self.longest)..end {
                let candidate: String = lower[start..end].iter().collect();
                if let Some(cost) = self.words.get(&candidate) {
                    let total = best[start].0 + cost;
                    if total < choice.0 {
                        choice = (total, start, true);
                    }
                }
            }
            best[end] = choice;
        }

        let mut tokens: Vec<(usize, usize, bool)> = Vec::new();
        let mut end = chars.len();
        while end > 0 {
            let (_, start, known) = best[end];
            match tokens.last_mut() {
                Some(next) if !known && !next.2 => next.0 = start,
                _ => tokens.push((start, end, known)),
            }
            end = start;
        }

        tokens
            .iter()
            .rev()
            .map(|&(start, end, _)| chars[start..end].iter().collect())
            .collect()
    }
}
