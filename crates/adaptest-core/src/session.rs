//! Driving a session to completion.
//!
//! The engine only knows how to pose items and record answers; who answers
//! them is a [`Responder`]. The simulated examinee lets a bank and a scoring
//! setup be exercised end to end without a human at the keyboard.

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::engine::{AdaptiveEngine, Progress};
use crate::error::CatError;
use crate::model::{Item, OptionMap};
use crate::scoring::irt::probability_correct;
use crate::statistics::FinalStatistics;

/// Something that answers items.
pub trait Responder {
    /// Pick one of the keys in `shown`.
    fn choose(&mut self, item: &Item, shown: &OptionMap) -> String;
}

/// Answers like an examinee of fixed ability under the 1PL model.
pub struct SimulatedExaminee<R: Rng> {
    ability: f64,
    rng: R,
}

impl<R: Rng> SimulatedExaminee<R> {
    pub fn new(ability: f64, rng: R) -> Self {
        Self { ability, rng }
    }

    pub fn ability(&self) -> f64 {
        self.ability
    }
}

impl<R: Rng> Responder for SimulatedExaminee<R> {
    fn choose(&mut self, item: &Item, shown: &OptionMap) -> String {
        let p = probability_correct(self.ability, item.difficulty);
        let wants_correct = self.rng.gen_bool(p.clamp(0.0, 1.0));
        pick_key(shown, item.correct_text(), wants_correct, &mut self.rng)
    }
}

/// Plays back a fixed correct/incorrect pattern, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedResponder {
    pattern: Vec<bool>,
    position: usize,
}

impl ScriptedResponder {
    pub fn new(pattern: Vec<bool>) -> Self {
        Self {
            pattern,
            position: 0,
        }
    }

    pub fn always(correct: bool) -> Self {
        Self::new(vec![correct])
    }
}

impl Responder for ScriptedResponder {
    fn choose(&mut self, item: &Item, shown: &OptionMap) -> String {
        let wants_correct = if self.pattern.is_empty() {
            false
        } else {
            self.pattern[self.position % self.pattern.len()]
        };
        self.position += 1;

        let correct = item.correct_text();
        let key = if wants_correct {
            shown.iter().find(|(_, text)| text.as_str() == correct)
        } else {
            shown.iter().find(|(_, text)| text.as_str() != correct)
        };
        key.or_else(|| shown.iter().next())
            .map(|(k, _)| k.clone())
            .unwrap_or_default()
    }
}

fn pick_key<R: Rng>(shown: &OptionMap, correct: &str, wants_correct: bool, rng: &mut R) -> String {
    shown
        .iter()
        .filter(|(_, text)| (text.as_str() == correct) == wants_correct)
        .map(|(k, _)| k)
        .choose(rng)
        .or_else(|| shown.keys().next())
        .cloned()
        .unwrap_or_default()
}

/// Session progress callbacks.
pub trait ProgressReporter: Send + Sync {
    fn on_item_presented(&self, progress: &Progress, item: &Item, shown: &OptionMap);
    fn on_response_recorded(&self, item: &Item, is_correct: bool, progress: &Progress);
    fn on_session_complete(&self, stats: &FinalStatistics);
}

/// Reporter that ignores every event.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_item_presented(&self, _: &Progress, _: &Item, _: &OptionMap) {}
    fn on_response_recorded(&self, _: &Item, _: bool, _: &Progress) {}
    fn on_session_complete(&self, _: &FinalStatistics) {}
}

/// Run `engine` until it terminates, answering with `responder`.
///
/// Stops on any termination rule or when the bank can no longer supply an
/// item. Fails only if the responder picks a key that was not shown.
pub fn administer<R: Rng>(
    engine: &mut AdaptiveEngine<R>,
    responder: &mut dyn Responder,
    reporter: &dyn ProgressReporter,
) -> Result<FinalStatistics, CatError> {
    while !engine.should_terminate() {
        let Some(item) = engine.next_item() else {
            break;
        };
        let shown = engine.present_options(&item);
        reporter.on_item_presented(&engine.progress(), &item, &shown);

        let key = responder.choose(&item, &shown);
        let is_correct = engine.record_response(&item, &key, &shown)?;
        reporter.on_response_recorded(&item, is_correct, &engine.progress());
    }

    let stats = engine.final_statistics();
    reporter.on_session_complete(&stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::bank::QuestionBank;
    use crate::config::{EngineConfig, ExamParameters};
    use crate::model::fixtures::{item, items_per_level};
    use crate::model::TerminationReason;

    fn engine(min: u32, max: u32, seed: u64) -> AdaptiveEngine {
        let config = EngineConfig {
            parameters: ExamParameters {
                min_questions: min,
                max_questions: max,
                ..Default::default()
            },
            ..Default::default()
        };
        let bank = Arc::new(QuestionBank::from_items(items_per_level(5)).unwrap());
        AdaptiveEngine::seeded(config, bank, seed).unwrap()
    }

    #[derive(Default)]
    struct CountingReporter {
        presented: AtomicU32,
        recorded: AtomicU32,
        completed: AtomicU32,
    }

    impl ProgressReporter for CountingReporter {
        fn on_item_presented(&self, progress: &Progress, _: &Item, _: &OptionMap) {
            let seen = self.presented.fetch_add(1, Ordering::SeqCst);
            assert_eq!(progress.question_number, seen + 1);
        }
        fn on_response_recorded(&self, _: &Item, _: bool, _: &Progress) {
            self.recorded.fetch_add(1, Ordering::SeqCst);
        }
        fn on_session_complete(&self, _: &FinalStatistics) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn scripted_responder_cycles() {
        let it = item("q", 3, "x");
        let shown = it.options.clone();
        let mut responder = ScriptedResponder::new(vec![true, false]);
        assert_eq!(responder.choose(&it, &shown), "c");
        assert_ne!(responder.choose(&it, &shown), "c");
        assert_eq!(responder.choose(&it, &shown), "c");
    }

    #[test]
    fn simulated_extremes() {
        let it = item("q", 3, "x");
        let shown = it.options.clone();
        let mut strong = SimulatedExaminee::new(50.0, StdRng::seed_from_u64(1));
        let mut weak = SimulatedExaminee::new(-50.0, StdRng::seed_from_u64(1));
        for _ in 0..20 {
            assert_eq!(strong.choose(&it, &shown), "c");
            assert_ne!(weak.choose(&it, &shown), "c");
        }
    }

    #[test]
    fn administer_runs_to_stabilization() {
        let mut e = engine(5, 20, 1);
        let reporter = CountingReporter::default();
        let stats = administer(&mut e, &mut ScriptedResponder::always(true), &reporter).unwrap();

        assert_eq!(stats.answered, 5);
        assert_eq!(stats.termination_reason, TerminationReason::ScoreStabilized);
        assert_eq!(reporter.presented.load(Ordering::SeqCst), 5);
        assert_eq!(reporter.recorded.load(Ordering::SeqCst), 5);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn administer_stops_on_exhaustion() {
        let items = (1..=2).map(|n| item(&format!("x{n}"), 2, "x")).collect();
        let bank = Arc::new(QuestionBank::from_items(items).unwrap());
        let config = EngineConfig {
            parameters: ExamParameters {
                min_questions: 5,
                max_questions: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut e = AdaptiveEngine::seeded(config, bank, 2).unwrap();
        let stats = administer(&mut e, &mut ScriptedResponder::always(false), &NoopReporter).unwrap();
        assert_eq!(stats.answered, 2);
        assert_eq!(stats.termination_reason, TerminationReason::BankExhausted);
    }

    #[test]
    fn simulated_session_is_reproducible() {
        let run = || {
            let mut e = engine(10, 20, 7);
            let mut examinee = SimulatedExaminee::new(0.5, StdRng::seed_from_u64(8));
            administer(&mut e, &mut examinee, &NoopReporter).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.item_ids, b.item_ids);
        assert_eq!(a.final_score, b.final_score);
        assert!(a.answered >= 10 && a.answered <= 20);
    }

    struct Rogue;

    impl Responder for Rogue {
        fn choose(&mut self, _: &Item, _: &OptionMap) -> String {
            "z".into()
        }
    }

    #[test]
    fn unknown_key_aborts_session() {
        let mut e = engine(2, 4, 3);
        let err = administer(&mut e, &mut Rogue, &NoopReporter).unwrap_err();
        assert!(matches!(err, CatError::Session(_)));
    }
}
