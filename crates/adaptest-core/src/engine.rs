//! The adaptive testing engine.
//!
//! One engine drives one session: it draws items near the current level,
//! resolves answers against shuffled option layouts, moves the level with
//! probabilistic hysteresis, tracks the running score, and decides when to
//! stop. The bank is shared read-only; all mutable state lives in
//! [`SessionState`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::config::EngineConfig;
use crate::error::CatError;
use crate::model::{levels, Item, OptionMap, ResponseRecord, TerminationReason, MAX_LEVEL, MIN_LEVEL};
use crate::scoring::{round_to, Scorer, ScoringStrategy};
use crate::statistics::{
    breakdown_by_category, breakdown_by_level, percent, recent_score_range, FinalStatistics,
};

/// Where the session is in the item/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingItem,
    AwaitingResponse,
    Terminated,
}

/// Mutable per-session state. Serializable so a session can be persisted
/// and resumed with [`AdaptiveEngine::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_difficulty: u8,
    /// Every item id ever issued; never shrinks.
    pub used_item_ids: HashSet<String>,
    /// Append-only, chronological.
    pub responses: Vec<ResponseRecord>,
    /// One running score per response.
    pub score_history: Vec<f64>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Item issued by `next_item` and not yet answered.
    #[serde(default)]
    pub pending_item_id: Option<String>,
    /// Set once the bank could not supply any item.
    #[serde(default)]
    pub bank_exhausted: bool,
}

impl SessionState {
    fn new(initial_difficulty: u8) -> Self {
        Self {
            current_difficulty: initial_difficulty,
            used_item_ids: HashSet::new(),
            responses: Vec::new(),
            score_history: Vec::new(),
            correct_count: 0,
            incorrect_count: 0,
            pending_item_id: None,
            bank_exhausted: false,
        }
    }

    /// Check the invariants a resumed session relies on.
    fn check(&self, bank: &QuestionBank) -> Result<(), CatError> {
        const CONTEXT: &str = "session snapshot";

        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.current_difficulty) {
            return Err(CatError::validation(
                CONTEXT,
                "current_difficulty",
                format!("must be between {MIN_LEVEL} and {MAX_LEVEL}"),
            ));
        }
        if self.score_history.len() != self.responses.len() {
            return Err(CatError::validation(
                CONTEXT,
                "score_history",
                "must hold one score per response",
            ));
        }
        let mut answered = HashSet::new();
        for r in &self.responses {
            if !answered.insert(r.item_id.as_str()) {
                return Err(CatError::validation(
                    CONTEXT,
                    "responses",
                    format!("item {} answered twice", r.item_id),
                ));
            }
            if !self.used_item_ids.contains(&r.item_id) {
                return Err(CatError::validation(
                    CONTEXT,
                    "used_item_ids",
                    format!("missing answered item {}", r.item_id),
                ));
            }
        }
        let correct = self.responses.iter().filter(|r| r.is_correct).count() as u32;
        if correct != self.correct_count
            || self.responses.len() as u32 - correct != self.incorrect_count
        {
            return Err(CatError::validation(
                CONTEXT,
                "correct_count",
                "counts do not match the response log",
            ));
        }
        if let Some(id) = &self.pending_item_id {
            if bank.get(id).is_none() || !self.used_item_ids.contains(id) || answered.contains(id.as_str()) {
                return Err(CatError::validation(
                    CONTEXT,
                    "pending_item_id",
                    format!("{id} is not an issued, unanswered bank item"),
                ));
            }
        }
        Ok(())
    }
}

/// Read-only progress snapshot for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based number of the next (or pending) question.
    pub question_number: u32,
    pub answered: u32,
    pub current_difficulty: u8,
    pub correct: u32,
    pub incorrect: u32,
    /// Latest running score, two decimals; 0.0 before the first answer.
    pub latest_score: f64,
}

/// Adaptive test session.
///
/// Randomness (item choice, option shuffling, hysteresis coin-flips) comes
/// from `R`, so a seeded generator makes a session reproducible.
pub struct AdaptiveEngine<R: Rng = StdRng> {
    config: EngineConfig,
    bank: Arc<QuestionBank>,
    strategy: ScoringStrategy,
    state: SessionState,
    rng: R,
}

impl AdaptiveEngine<StdRng> {
    /// Start a session with an entropy-seeded generator.
    pub fn new(config: EngineConfig, bank: Arc<QuestionBank>) -> Result<Self, CatError> {
        Self::with_rng(config, bank, StdRng::from_entropy())
    }

    /// Start a reproducible session.
    pub fn seeded(config: EngineConfig, bank: Arc<QuestionBank>, seed: u64) -> Result<Self, CatError> {
        Self::with_rng(config, bank, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AdaptiveEngine<R> {
    /// Start a session using `rng` for every random decision.
    ///
    /// Fails if the parameters are out of range or the scoring strategy
    /// cannot be built.
    pub fn with_rng(config: EngineConfig, bank: Arc<QuestionBank>, rng: R) -> Result<Self, CatError> {
        config.parameters.validate()?;
        let strategy = ScoringStrategy::from_config(&config.scoring)?;
        let state = SessionState::new(config.parameters.initial_difficulty);

        tracing::debug!(
            strategy = %strategy.kind(),
            items = bank.len(),
            initial_difficulty = state.current_difficulty,
            "session started"
        );

        Ok(Self {
            config,
            bank,
            strategy,
            state,
            rng,
        })
    }

    /// Resume a session from a snapshot taken with [`Self::snapshot`].
    pub fn restore(
        config: EngineConfig,
        bank: Arc<QuestionBank>,
        state: SessionState,
        rng: R,
    ) -> Result<Self, CatError> {
        let mut engine = Self::with_rng(config, bank, rng)?;
        state.check(&engine.bank)?;
        engine.state = state;
        Ok(engine)
    }

    /// Draw the next item at (or near) the current level.
    ///
    /// While an item is pending, returns that same item again. Returns `None`
    /// once the session has terminated or no unused item remains at any level.
    pub fn next_item(&mut self) -> Option<Item> {
        if self.should_terminate() {
            return None;
        }
        if let Some(id) = &self.state.pending_item_id {
            return self.bank.get(id).cloned();
        }

        let selected = self
            .bank
            .select(
                self.state.current_difficulty as i64,
                &self.state.used_item_ids,
                &mut self.rng,
            )
            .cloned();

        match selected {
            Some(item) => {
                self.state.used_item_ids.insert(item.id.clone());
                self.state.pending_item_id = Some(item.id.clone());
                Some(item)
            }
            None => {
                self.state.bank_exhausted = true;
                tracing::info!(
                    answered = self.state.responses.len(),
                    "item bank exhausted, ending session"
                );
                None
            }
        }
    }

    /// A fresh random presentation of the item's options.
    ///
    /// Keys keep their sorted order while the texts are permuted, so the same
    /// text can appear under a different key on every call.
    pub fn present_options(&mut self, item: &Item) -> OptionMap {
        let mut texts: Vec<String> = item.options.values().cloned().collect();
        texts.shuffle(&mut self.rng);
        item.options.keys().cloned().zip(texts).collect()
    }

    /// Record the answer to the pending item and return whether it was
    /// correct.
    ///
    /// Correctness compares option *texts*: the text shown under
    /// `chosen_key` against the text of the bank item's own correct key.
    /// Only `item.id` is taken from the caller; everything else is read from
    /// the bank.
    pub fn record_response(
        &mut self,
        item: &Item,
        chosen_key: &str,
        shown: &OptionMap,
    ) -> Result<bool, CatError> {
        if let Some(reason) = self.termination_reason() {
            return Err(CatError::Session(format!(
                "session has ended ({reason}), item {} cannot be answered",
                item.id
            )));
        }
        if self.state.pending_item_id.as_deref() != Some(item.id.as_str()) {
            return Err(CatError::Session(format!(
                "item {} is not awaiting a response",
                item.id
            )));
        }
        let bank = Arc::clone(&self.bank);
        let item = bank
            .get(&item.id)
            .ok_or_else(|| CatError::Session(format!("item {} is not in the bank", item.id)))?;
        if !same_texts(&item.options, shown) {
            return Err(CatError::Session(format!(
                "shown options do not match item {}",
                item.id
            )));
        }
        let chosen_text = shown.get(chosen_key).ok_or_else(|| {
            CatError::Session(format!("key `{chosen_key}` was not shown for item {}", item.id))
        })?;

        let is_correct = chosen_text == item.correct_text();
        let difficulty_at_time = self.state.current_difficulty;

        self.state.responses.push(ResponseRecord {
            item_id: item.id.clone(),
            difficulty: item.difficulty,
            category: item.category.clone(),
            is_correct,
            difficulty_at_time,
        });
        if is_correct {
            self.state.correct_count += 1;
        } else {
            self.state.incorrect_count += 1;
        }

        self.adjust_difficulty(is_correct, item.difficulty);

        let running = self.strategy.partial_score(&self.state.responses);
        self.state.score_history.push(running);
        self.state.pending_item_id = None;

        tracing::debug!(
            item = %item.id,
            is_correct,
            difficulty_at_time,
            next_difficulty = self.state.current_difficulty,
            running_score = running,
            "response recorded"
        );

        if let Some(reason) = self.termination_reason() {
            tracing::info!(
                answered = self.state.responses.len(),
                %reason,
                score = running,
                "session complete"
            );
        }

        Ok(is_correct)
    }

    /// Move the level one step after an answer.
    ///
    /// A correct answer on an item at or above the current level always
    /// moves up; on an easier item it moves up only with the configured
    /// probability. Misses mirror this downwards.
    fn adjust_difficulty(&mut self, is_correct: bool, item_difficulty: u8) {
        let current = self.state.current_difficulty;
        let strong_evidence = if is_correct {
            item_difficulty >= current
        } else {
            item_difficulty <= current
        };
        let moves = strong_evidence
            || self
                .rng
                .gen_bool(self.config.parameters.level_change_probability);

        if moves {
            self.state.current_difficulty = if is_correct {
                (current + 1).min(MAX_LEVEL)
            } else {
                current.saturating_sub(1).max(MIN_LEVEL)
            };
        }
    }

    /// Why the session should stop now, if it should.
    ///
    /// Rules, in order: never before the first answer; the hard ceiling; the
    /// hard floor; a stable running score over the window; no item left at
    /// any level.
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        let params = &self.config.parameters;
        let answered = self.state.responses.len();

        if answered == 0 {
            return None;
        }
        if answered >= params.max_questions as usize {
            return Some(TerminationReason::MaxQuestionsReached);
        }
        if answered < params.min_questions as usize {
            return None;
        }
        if let Some(range) = recent_score_range(&self.state.score_history, params.stabilization_window)
        {
            if range <= params.stabilization_threshold {
                return Some(TerminationReason::ScoreStabilized);
            }
        }

        let used = &self.state.used_item_ids;
        if levels().all(|level| !self.bank.has_available(level as i64, used)) {
            return Some(TerminationReason::BankExhausted);
        }

        None
    }

    pub fn should_terminate(&self) -> bool {
        self.termination_reason().is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.state.bank_exhausted || self.should_terminate() {
            Phase::Terminated
        } else if self.state.pending_item_id.is_some() {
            Phase::AwaitingResponse
        } else {
            Phase::AwaitingItem
        }
    }

    /// Final report. Uses the strategy's `score`, not `partial_score`.
    pub fn final_statistics(&self) -> FinalStatistics {
        let responses = &self.state.responses;
        let answered = responses.len() as u32;
        let termination_reason = self
            .termination_reason()
            .unwrap_or(TerminationReason::BankExhausted);

        FinalStatistics {
            strategy: self.strategy.kind(),
            answered,
            correct: self.state.correct_count,
            incorrect: self.state.incorrect_count,
            percent_correct: percent(self.state.correct_count, answered),
            final_score: round_to(self.strategy.score(responses), 2),
            final_difficulty: self.state.current_difficulty,
            score_history: self.state.score_history.clone(),
            diagnostics: self.strategy.diagnostics(responses),
            by_level: breakdown_by_level(responses),
            by_category: breakdown_by_category(responses),
            difficulty_progression: responses.iter().map(|r| r.difficulty_at_time).collect(),
            item_ids: responses.iter().map(|r| r.item_id.clone()).collect(),
            termination_reason,
        }
    }

    pub fn progress(&self) -> Progress {
        let answered = self.state.responses.len() as u32;
        Progress {
            question_number: answered + 1,
            answered,
            current_difficulty: self.state.current_difficulty,
            correct: self.state.correct_count,
            incorrect: self.state.incorrect_count,
            latest_score: self
                .state
                .score_history
                .last()
                .map(|s| round_to(*s, 2))
                .unwrap_or(0.0),
        }
    }

    /// Copy of the session state, for external persistence.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn current_difficulty(&self) -> u8 {
        self.state.current_difficulty
    }

    pub fn question_number(&self) -> u32 {
        self.state.responses.len() as u32 + 1
    }

    pub fn correct_count(&self) -> u32 {
        self.state.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.state.incorrect_count
    }

    pub fn responses(&self) -> &[ResponseRecord] {
        &self.state.responses
    }

    pub fn score_history(&self) -> &[f64] {
        &self.state.score_history
    }

    pub fn used_item_ids(&self) -> &HashSet<String> {
        &self.state.used_item_ids
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

/// Whether `shown` carries exactly the item's option texts under the
/// item's keys.
fn same_texts(original: &OptionMap, shown: &OptionMap) -> bool {
    if original.len() != shown.len() || original.keys().ne(shown.keys()) {
        return false;
    }
    let mut counts: HashMap<&str, i32> = HashMap::new();
    for text in original.values() {
        *counts.entry(text.as_str()).or_default() += 1;
    }
    for text in shown.values() {
        *counts.entry(text.as_str()).or_default() -= 1;
    }
    counts.values().all(|&c| c == 0)
}
