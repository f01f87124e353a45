//! Search strategies: pure logic that decides what to search next.
//!
//! Three strategies cover the registry's search space:
//!
//! - [`AdaptiveStrategy`] starts at the 26 single letters and drills deeper
//!   only where the result count hits the page limit (or a known
//!   high-volume stem), keeping the total query count low.
//! - [`ComprehensiveStrategy`] pre-plans every prefix at every depth for
//!   coverage guarantees independent of per-unit result volume.
//! - [`MultiDimensionalStrategy`] enumerates profession × state ×
//!   (suburb ×) prefix combinations at fixed granularity.
//!
//! The active strategy is chosen once at construction via the
//! [`SearchStrategy`] enum; orchestration code never branches on mode flags.

use crate::unit::{SearchMode, SearchUnit};
use regscout_core::directory::{
    major_suburbs, ALPHABET, HIGH_VOLUME_PREFIXES, HIGH_VOLUME_STATES, PROFESSIONS, STATES,
};
use std::collections::{BTreeMap, HashSet};

/// Generates and expands name prefixes up to a maximum depth.
#[derive(Debug, Clone)]
pub struct PrefixSpace {
    alphabet: Vec<char>,
    max_depth: usize,
}

impl PrefixSpace {
    /// Create a prefix space over the registry alphabet.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            alphabet: ALPHABET.chars().collect(),
            max_depth,
        }
    }

    /// Maximum prefix depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// All prefixes at exactly `depth` characters, in lexicographic order.
    #[must_use]
    pub fn at_depth(&self, depth: usize) -> Vec<String> {
        let mut prefixes = vec![String::new()];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(prefixes.len() * self.alphabet.len());
            for prefix in &prefixes {
                for &c in &self.alphabet {
                    let mut child = prefix.clone();
                    child.push(c);
                    next.push(child);
                }
            }
            prefixes = next;
        }
        prefixes
    }

    /// One-character-longer children of `prefix`, in alphabetical order.
    ///
    /// Empty when the prefix has already reached the maximum depth.
    #[must_use]
    pub fn children(&self, prefix: &str) -> Vec<String> {
        if prefix.chars().count() >= self.max_depth {
            return Vec::new();
        }
        self.alphabet
            .iter()
            .map(|&c| {
                let mut child = prefix.to_string();
                child.push(c);
                child
            })
            .collect()
    }

    /// Number of prefixes at a given depth (26^depth).
    #[must_use]
    pub fn count_at_depth(&self, depth: usize) -> usize {
        self.alphabet.len().pow(u32::try_from(depth).unwrap_or(0))
    }
}

/// Adaptive recursive prefix search.
///
/// A unit expands into its 26 children iff its result count reached the
/// page limit (the registry truncates, so coverage is incomplete) or its
/// key is a known high-volume stem, and it has not hit the depth bound.
#[derive(Debug, Clone)]
pub struct AdaptiveStrategy {
    space: PrefixSpace,
    page_result_limit: usize,
    high_volume: HashSet<String>,
}

impl AdaptiveStrategy {
    /// Create an adaptive strategy.
    #[must_use]
    pub fn new(max_depth: usize, page_result_limit: usize) -> Self {
        Self {
            space: PrefixSpace::new(max_depth),
            page_result_limit,
            high_volume: HIGH_VOLUME_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Replace the high-volume allow-list (used by tests).
    #[must_use]
    pub fn with_high_volume(mut self, prefixes: &[&str]) -> Self {
        self.high_volume = prefixes.iter().map(ToString::to_string).collect();
        self
    }

    fn initial_units(&self, completed: &HashSet<String>) -> Vec<SearchUnit> {
        self.space
            .at_depth(1)
            .into_iter()
            .filter(|p| !completed.contains(p))
            .map(SearchUnit::prefix)
            .collect()
    }

    fn should_expand(&self, prefix: &str, result_count: usize) -> bool {
        if prefix.chars().count() >= self.space.max_depth() {
            return false;
        }
        result_count >= self.page_result_limit || self.high_volume.contains(prefix)
    }

    fn on_result(
        &self,
        unit: &SearchUnit,
        result_count: usize,
        completed: &HashSet<String>,
    ) -> Vec<SearchUnit> {
        let prefix = unit.prefix_str();
        if !self.should_expand(prefix, result_count) {
            return Vec::new();
        }

        let children: Vec<SearchUnit> = self
            .space
            .children(prefix)
            .into_iter()
            .filter(|p| !completed.contains(p))
            .map(SearchUnit::prefix)
            .collect();

        tracing::info!(
            prefix = %prefix,
            result_count,
            children = children.len(),
            "expanding prefix"
        );
        children
    }
}

/// Comprehensive prefix search: the full space at every depth, pre-planned.
#[derive(Debug, Clone)]
pub struct ComprehensiveStrategy {
    space: PrefixSpace,
}

impl ComprehensiveStrategy {
    /// Create a comprehensive strategy covering depths 1..=`max_depth`.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            space: PrefixSpace::new(max_depth),
        }
    }

    fn initial_units(&self, completed: &HashSet<String>) -> Vec<SearchUnit> {
        let mut plan = Vec::new();
        for depth in 1..=self.space.max_depth() {
            let at_depth = self.space.at_depth(depth);
            let total = at_depth.len();
            let remaining: Vec<String> = at_depth
                .into_iter()
                .filter(|p| !completed.contains(p))
                .collect();
            tracing::info!(
                depth,
                remaining = remaining.len(),
                total,
                "planned prefixes at depth"
            );
            plan.extend(remaining.into_iter().map(SearchUnit::prefix));
        }
        plan
    }
}

/// Multi-dimensional search over profession × state × suburb × prefix.
///
/// Cardinality is absorbed by the product itself: `on_result` never expands.
/// Suburb-level units are emitted only when suburb mode is enabled and the
/// state is in the configured high-volume subset.
#[derive(Debug, Clone)]
pub struct MultiDimensionalStrategy {
    professions: Vec<String>,
    states: Vec<String>,
    high_volume_states: Vec<String>,
    suburbs: BTreeMap<String, Vec<String>>,
    include_suburbs: bool,
    test_prefix: Option<String>,
}

impl MultiDimensionalStrategy {
    /// Create a multi-dimensional strategy over the registry directory.
    #[must_use]
    pub fn new(include_suburbs: bool, test_prefix: Option<String>) -> Self {
        let suburbs = STATES
            .iter()
            .map(|&s| {
                (
                    s.to_string(),
                    major_suburbs(s).iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        Self {
            professions: PROFESSIONS.iter().map(ToString::to_string).collect(),
            states: STATES.iter().map(ToString::to_string).collect(),
            high_volume_states: HIGH_VOLUME_STATES.iter().map(ToString::to_string).collect(),
            suburbs,
            include_suburbs,
            test_prefix,
        }
    }

    /// Replace the profession set (used by tests).
    #[must_use]
    pub fn with_professions(mut self, professions: &[&str]) -> Self {
        self.professions = professions.iter().map(ToString::to_string).collect();
        self
    }

    /// Replace the state set (used by tests).
    #[must_use]
    pub fn with_states(mut self, states: &[&str]) -> Self {
        self.states = states.iter().map(ToString::to_string).collect();
        self
    }

    /// Replace the high-volume state subset (used by tests).
    #[must_use]
    pub fn with_high_volume_states(mut self, states: &[&str]) -> Self {
        self.high_volume_states = states.iter().map(ToString::to_string).collect();
        self
    }

    /// Replace the suburb list for one state (used by tests).
    #[must_use]
    pub fn with_suburbs(mut self, state: &str, suburbs: &[&str]) -> Self {
        self.suburbs.insert(
            state.to_string(),
            suburbs.iter().map(ToString::to_string).collect(),
        );
        self
    }

    fn prefixes(&self) -> Vec<String> {
        match &self.test_prefix {
            Some(p) => vec![p.clone()],
            None => PrefixSpace::new(1).at_depth(1),
        }
    }

    /// Total combinations this strategy will enumerate (before completion
    /// filtering), for progress reporting.
    #[must_use]
    pub fn total_combinations(&self) -> usize {
        let prefixes = self.prefixes().len();
        let base = self.professions.len() * self.states.len() * prefixes;
        let suburb = if self.include_suburbs {
            self.professions.len()
                * self
                    .states
                    .iter()
                    .filter(|s| self.high_volume_states.contains(*s))
                    .map(|s| self.suburbs.get(s).map_or(0, Vec::len))
                    .sum::<usize>()
                * prefixes
        } else {
            0
        };
        base + suburb
    }

    fn initial_units(&self, completed: &HashSet<String>) -> Vec<SearchUnit> {
        let prefixes = self.prefixes();
        let mut units = Vec::new();

        for profession in &self.professions {
            for state in &self.states {
                for prefix in &prefixes {
                    let unit = SearchUnit::combination(profession, state, None, prefix);
                    if !completed.contains(&unit.key()) {
                        units.push(unit);
                    }
                }

                if self.include_suburbs && self.high_volume_states.contains(state) {
                    let state_suburbs = self.suburbs.get(state).map_or(&[][..], Vec::as_slice);
                    for suburb in state_suburbs {
                        for prefix in &prefixes {
                            let unit = SearchUnit::combination(
                                profession,
                                state,
                                Some(suburb.clone()),
                                prefix,
                            );
                            if !completed.contains(&unit.key()) {
                                units.push(unit);
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(combinations = units.len(), "planned multi-dimensional units");
        units
    }
}

/// Per-depth completion statistics for prefix-mode progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthProgress {
    /// Prefixes that exist at this depth.
    pub total: usize,
    /// Prefixes completed at this depth.
    pub completed: usize,
}

/// The active search strategy, chosen once at construction.
#[derive(Debug, Clone)]
pub enum SearchStrategy {
    /// Expand on demand when results hit the page limit.
    Adaptive(AdaptiveStrategy),
    /// Pre-planned full coverage at every depth.
    Comprehensive(ComprehensiveStrategy),
    /// Fixed-granularity profession × state × suburb × prefix product.
    MultiDimensional(MultiDimensionalStrategy),
}

impl SearchStrategy {
    /// The search space this strategy operates in.
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        match self {
            Self::Adaptive(_) | Self::Comprehensive(_) => SearchMode::Prefix,
            Self::MultiDimensional(_) => SearchMode::Combination,
        }
    }

    /// Ordered units to seed the frontier, minus already-completed keys.
    #[must_use]
    pub fn initial_units(&self, completed: &HashSet<String>) -> Vec<SearchUnit> {
        match self {
            Self::Adaptive(s) => s.initial_units(completed),
            Self::Comprehensive(s) => s.initial_units(completed),
            Self::MultiDimensional(s) => s.initial_units(completed),
        }
    }

    /// Child units spawned by a finished search, or empty to mark the unit
    /// complete. Only the adaptive strategy ever expands.
    #[must_use]
    pub fn on_result(
        &self,
        unit: &SearchUnit,
        result_count: usize,
        completed: &HashSet<String>,
    ) -> Vec<SearchUnit> {
        match self {
            Self::Adaptive(s) => s.on_result(unit, result_count, completed),
            Self::Comprehensive(_) | Self::MultiDimensional(_) => Vec::new(),
        }
    }

    /// Per-depth completion breakdown for prefix-mode strategies.
    ///
    /// Empty for the multi-dimensional strategy, whose progress is a flat
    /// combination count.
    #[must_use]
    pub fn progress_by_depth(&self, completed: &HashSet<String>) -> BTreeMap<usize, DepthProgress> {
        let space = match self {
            Self::Adaptive(s) => &s.space,
            Self::Comprehensive(s) => &s.space,
            Self::MultiDimensional(_) => return BTreeMap::new(),
        };

        let mut progress = BTreeMap::new();
        for depth in 1..=space.max_depth() {
            let done = completed
                .iter()
                .filter(|p| p.chars().count() == depth)
                .count();
            progress.insert(
                depth,
                DepthProgress {
                    total: space.count_at_depth(depth),
                    completed: done,
                },
            );
        }
        progress
    }
}
