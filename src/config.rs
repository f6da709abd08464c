//! Engine configuration.
//!
//! All tunables have deployment-tested defaults; [`EngineConfig::from_env`]
//! resolves overrides from the environment (loading `.env` first), and the
//! `with_*` setters support programmatic construction.

use std::time::Duration;

/// Tunables shared across the document store, query engine, cache, and
/// orchestrator.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Minimum 0-1 proximity for a semantic cache hit. Biased high: a false
    /// negative costs a recomputation, a false positive is a correctness bug.
    pub min_proximity: f32,
    /// Number of chunk matches requested per similarity query.
    pub top_k: usize,
    /// Chunks embedded and upserted per batch during indexing.
    pub batch_size: usize,
    /// Characters of neighbor text stitched onto each side of a match.
    pub stitch_window: usize,
    /// Lower token bound handed to the chunk splitter.
    pub min_split_tokens: usize,
    /// Upper token bound handed to the chunk splitter.
    pub max_split_tokens: usize,
    /// Flashcards requested per flashcard-set generation.
    pub flashcard_count: usize,
    /// Questions requested per quiz generation.
    pub quiz_question_count: usize,
    /// Character bound forwarded in the short-post prompt. Prompt-level
    /// only: the engine never truncates generated text.
    pub short_post_char_limit: usize,
    /// Deadline applied to every external capability call.
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_proximity: 0.97,
            top_k: 3,
            batch_size: 128,
            stitch_window: 400,
            min_split_tokens: 100,
            max_split_tokens: 500,
            flashcard_count: 5,
            quiz_question_count: 5,
            short_post_char_limit: 1000,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Builds a config from defaults overridden by `STUDYGRAPH_*` environment
    /// variables, loading a `.env` file when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(value) = env_parse::<f32>("STUDYGRAPH_MIN_PROXIMITY") {
            config.min_proximity = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_TOP_K") {
            config.top_k = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_BATCH_SIZE") {
            config.batch_size = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_STITCH_WINDOW") {
            config.stitch_window = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_MIN_SPLIT_TOKENS") {
            config.min_split_tokens = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_MAX_SPLIT_TOKENS") {
            config.max_split_tokens = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_FLASHCARD_COUNT") {
            config.flashcard_count = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_QUIZ_QUESTION_COUNT") {
            config.quiz_question_count = value;
        }
        if let Some(value) = env_parse::<usize>("STUDYGRAPH_SHORT_POST_CHAR_LIMIT") {
            config.short_post_char_limit = value;
        }
        if let Some(value) = env_parse::<u64>("STUDYGRAPH_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(value);
        }
        config
    }

    #[must_use]
    pub fn with_min_proximity(mut self, min_proximity: f32) -> Self {
        self.min_proximity = min_proximity;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_split_tokens(mut self, min_tokens: usize, max_tokens: usize) -> Self {
        self.min_split_tokens = min_tokens;
        self.max_split_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}
