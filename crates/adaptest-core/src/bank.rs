//! Immutable question bank with level-aware sampling.
//!
//! The bank never tracks usage. Callers pass the ids they want excluded on
//! every call, so one bank can be shared read-only across sessions.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::model::{clamp_level, levels, Item, ItemRecord, MAX_LEVEL, MIN_LEVEL};

/// Level offsets probed, in order, when the requested level has no unused item.
pub const FALLBACK_OFFSETS: [i64; 4] = [1, -1, 2, -2];

/// The validated item pool, indexed by difficulty level.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    items: Vec<Item>,
    /// Positions into `items`, one bucket per level (index 0 = level 1).
    by_level: [Vec<usize>; MAX_LEVEL as usize],
}

impl QuestionBank {
    /// Validate raw records and build the bank.
    ///
    /// Fails on the first record that is structurally invalid, or on a
    /// duplicated id.
    pub fn load(records: impl IntoIterator<Item = ItemRecord>) -> Result<Self, CatError> {
        let items = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.validate(position))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_items(items)
    }

    /// Build the bank from already-validated items.
    pub fn from_items(items: Vec<Item>) -> Result<Self, CatError> {
        let mut seen = HashSet::new();
        let mut by_level: [Vec<usize>; MAX_LEVEL as usize] = Default::default();

        for (position, item) in items.iter().enumerate() {
            if !seen.insert(item.id.as_str()) {
                return Err(CatError::validation(
                    format!("item {}", item.id),
                    "id",
                    "is duplicated in the bank",
                ));
            }
            if !(MIN_LEVEL..=MAX_LEVEL).contains(&item.difficulty) {
                return Err(CatError::validation(
                    format!("item {}", item.id),
                    "difficulty",
                    format!("must be between {MIN_LEVEL} and {MAX_LEVEL}"),
                ));
            }
            by_level[bucket(item.difficulty)].push(position);
        }

        Ok(Self { items, by_level })
    }

    /// Pick an unused item as close to `difficulty` as possible.
    ///
    /// Tries the clamped level, then offsets `[+1, -1, +2, -2]` from it
    /// (skipping out-of-range levels), then any unused item at all. The choice
    /// within the first non-empty candidate set is uniform.
    pub fn select<R: Rng + ?Sized>(
        &self,
        difficulty: i64,
        excluded_ids: &HashSet<String>,
        rng: &mut R,
    ) -> Option<&Item> {
        let candidates = match self.nearest_candidates(difficulty, excluded_ids) {
            Some(candidates) => candidates,
            None => {
                let any: Vec<&Item> = self
                    .items
                    .iter()
                    .filter(|item| !excluded_ids.contains(&item.id))
                    .collect();
                if !any.is_empty() {
                    tracing::debug!(
                        difficulty,
                        remaining = any.len(),
                        "no unused item near requested level, falling back to any level"
                    );
                }
                any
            }
        };

        candidates.choose(rng).copied()
    }

    /// Whether `select` would find an item without the any-level fallback.
    pub fn has_available(&self, difficulty: i64, excluded_ids: &HashSet<String>) -> bool {
        self.nearest_candidates(difficulty, excluded_ids).is_some()
    }

    fn nearest_candidates(
        &self,
        difficulty: i64,
        excluded_ids: &HashSet<String>,
    ) -> Option<Vec<&Item>> {
        let level = clamp_level(difficulty) as i64;

        std::iter::once(level)
            .chain(FALLBACK_OFFSETS.iter().map(|offset| level + offset))
            .filter(|probe| (MIN_LEVEL as i64..=MAX_LEVEL as i64).contains(probe))
            .map(|probe| self.unused_at(probe as u8, excluded_ids))
            .find(|candidates| !candidates.is_empty())
    }

    fn unused_at(&self, level: u8, excluded_ids: &HashSet<String>) -> Vec<&Item> {
        self.by_level[bucket(level)]
            .iter()
            .map(|&position| &self.items[position])
            .filter(|item| !excluded_ids.contains(&item.id))
            .collect()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All items, in load order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items at a level (zero for out-of-range levels).
    pub fn count_at(&self, level: u8) -> usize {
        if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            self.by_level[bucket(level)].len()
        } else {
            0
        }
    }

    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.items.iter().map(|i| i.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Items whose category matches `category`, ignoring case.
    pub fn items_in_category(&self, category: &str) -> Vec<&Item> {
        let wanted = category.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.category.to_lowercase() == wanted)
            .collect()
    }

    /// Counts by level and by category.
    pub fn summary(&self) -> BankSummary {
        let mut per_category = BTreeMap::new();
        for item in &self.items {
            *per_category.entry(item.category.clone()).or_insert(0) += 1;
        }

        BankSummary {
            total_items: self.items.len(),
            per_level: levels().map(|l| (l, self.count_at(l))).collect(),
            per_category,
            levels_available: levels().filter(|&l| self.count_at(l) > 0).collect(),
        }
    }

    /// Check that every level holds enough items for a session of
    /// `min_questions`. A level is short when it has fewer than
    /// `max(3, min_questions / 5)` items.
    pub fn coverage(&self, min_questions: u32) -> CoverageReport {
        let recommended = (min_questions as usize / 5).max(3);
        let shortfalls: Vec<LevelShortfall> = levels()
            .filter_map(|level| {
                let available = self.count_at(level);
                (available < recommended).then_some(LevelShortfall {
                    level,
                    available,
                    recommended,
                })
            })
            .collect();

        CoverageReport {
            is_sufficient: shortfalls.is_empty(),
            total_items: self.items.len(),
            shortfalls,
        }
    }
}

fn bucket(level: u8) -> usize {
    (level - MIN_LEVEL) as usize
}

/// Item counts for a bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSummary {
    pub total_items: usize,
    /// Always contains all five levels.
    pub per_level: BTreeMap<u8, usize>,
    pub per_category: BTreeMap<String, usize>,
    /// Levels with at least one item.
    pub levels_available: Vec<u8>,
}

/// A level with fewer items than recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelShortfall {
    pub level: u8,
    pub available: usize,
    pub recommended: usize,
}

/// Per-level coverage check. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub is_sufficient: bool,
    pub total_items: usize,
    pub shortfalls: Vec<LevelShortfall>,
}
