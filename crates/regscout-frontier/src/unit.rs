//! The atomic unit of search work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator joining the fields of a combination key.
///
/// Keys are persisted in checkpoints, so this must never change.
const KEY_SEPARATOR: char = '|';

/// Which search space a unit (and its completed-set) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Name-prefix search (adaptive or comprehensive).
    Prefix,
    /// Profession × state × suburb × prefix search.
    Combination,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Combination => write!(f, "combination"),
        }
    }
}

/// An immutable description of one atomic registry query.
///
/// Units are keyed deterministically from their fields, so a unit
/// re-derived after a restart always matches its entry in the persisted
/// completed-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchUnit {
    /// A bare name-prefix query.
    Prefix {
        /// The leading name substring to search for.
        prefix: String,
    },
    /// A query filtered to a profession, state and optionally a suburb.
    Combination {
        /// Profession filter.
        profession: String,
        /// State filter.
        state: String,
        /// Optional suburb filter.
        suburb: Option<String>,
        /// The leading name substring to search for.
        prefix: String,
    },
}

impl SearchUnit {
    /// Create a prefix-mode unit.
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix {
            prefix: prefix.into(),
        }
    }

    /// Create a combination-mode unit.
    #[must_use]
    pub fn combination(
        profession: impl Into<String>,
        state: impl Into<String>,
        suburb: Option<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self::Combination {
            profession: profession.into(),
            state: state.into(),
            suburb,
            prefix: prefix.into(),
        }
    }

    /// The unit's stable key, used for dedup and the completed-set.
    ///
    /// Prefix units key on the prefix itself; combination units join their
    /// fields in declared order (profession, state, suburb, prefix).
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Prefix { prefix } => prefix.clone(),
            Self::Combination {
                profession,
                state,
                suburb,
                prefix,
            } => match suburb {
                Some(suburb) => format!(
                    "{profession}{sep}{state}{sep}{suburb}{sep}{prefix}",
                    sep = KEY_SEPARATOR
                ),
                None => {
                    format!("{profession}{sep}{state}{sep}{prefix}", sep = KEY_SEPARATOR)
                }
            },
        }
    }

    /// Which search space this unit belongs to.
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        match self {
            Self::Prefix { .. } => SearchMode::Prefix,
            Self::Combination { .. } => SearchMode::Combination,
        }
    }

    /// The name prefix this unit searches for.
    #[must_use]
    pub fn prefix_str(&self) -> &str {
        match self {
            Self::Prefix { prefix } | Self::Combination { prefix, .. } => prefix,
        }
    }

    /// Prefix depth (character count).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.prefix_str().chars().count()
    }
}

impl fmt::Display for SearchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
