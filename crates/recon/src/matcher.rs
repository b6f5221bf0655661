use crate::error::ReconError;
use crate::lookup::LookupIndex;
use crate::model::{LookupRecord, MatchResult, MatchStatistics, MatchStatus};
use crate::normalize::{normalize, NormalizedName};
use crate::similarity::token_sort_ratio;

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 80;

/// Matches query names against a [`LookupIndex`], exact first, then fuzzy.
///
/// The index and threshold are fixed at construction. Statistics accumulate
/// across calls until [`MatchingEngine::reset_statistics`].
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    index: LookupIndex,
    fuzzy_threshold: u8,
    stats: MatchStatistics,
}

impl MatchingEngine {
    pub fn new(index: LookupIndex) -> Self {
        Self {
            index,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            stats: MatchStatistics::default(),
        }
    }

    pub fn with_threshold(index: LookupIndex, threshold: i64) -> Result<Self, ReconError> {
        let fuzzy_threshold = validate_threshold(threshold)?;
        Ok(Self {
            index,
            fuzzy_threshold,
            stats: MatchStatistics::default(),
        })
    }

    pub fn threshold(&self) -> u8 {
        self.fuzzy_threshold
    }

    pub fn index(&self) -> &LookupIndex {
        &self.index
    }

    /// Resolve one name. Precedence: existing id, invalid name, exact key,
    /// fuzzy candidate at or above the threshold, no match.
    pub fn match_name(&mut self, name: Option<&str>, existing_id: Option<&str>) -> MatchResult {
        if let Some(id) = existing_id.map(str::trim).filter(|id| !id.is_empty()) {
            self.stats.already_had_id += 1;
            return MatchResult {
                matched_id: Some(id.to_string()),
                status: MatchStatus::AlreadyHadId,
                confidence: 100,
            };
        }

        let key = normalize(name);
        if key.is_empty() {
            self.stats.no_match += 1;
            return MatchResult {
                matched_id: None,
                status: MatchStatus::InvalidName,
                confidence: 0,
            };
        }

        if let Some(record) = self.index.lookup(&key) {
            self.stats.exact += 1;
            return MatchResult {
                matched_id: Some(record.id.clone()),
                status: MatchStatus::ExactMatch,
                confidence: 100,
            };
        }

        let candidate = self.best_candidate(&key).map(|(record, score)| (record.id.clone(), score));
        if let Some((id, score)) = candidate {
            if score >= self.fuzzy_threshold {
                self.stats.fuzzy += 1;
                return MatchResult {
                    matched_id: Some(id),
                    status: MatchStatus::FuzzyMatch,
                    confidence: score,
                };
            }
        }

        self.stats.no_match += 1;
        MatchResult {
            matched_id: None,
            status: MatchStatus::NoMatch,
            confidence: 0,
        }
    }

    /// Highest-scoring index record for `key`. Ties go to the lexicographically
    /// smallest key. `None` only when the index is empty.
    pub fn best_candidate(&self, key: &NormalizedName) -> Option<(&LookupRecord, u8)> {
        let mut best: Option<(&LookupRecord, u8)> = None;
        for record in self.index.records() {
            let score = token_sort_ratio(key.as_str(), record.normalized_name.as_str());
            // Strict comparison keeps the first (smallest) key on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((record, score));
                if score == 100 {
                    break;
                }
            }
        }
        best
    }

    pub fn statistics(&self) -> MatchStatistics {
        self.stats
    }

    /// Zero all four counters.
    pub fn reset_statistics(&mut self) {
        self.stats = MatchStatistics::default();
    }
}

pub fn validate_threshold(threshold: i64) -> Result<u8, ReconError> {
    u8::try_from(threshold)
        .ok()
        .filter(|t| *t <= 100)
        .ok_or(ReconError::InvalidThreshold(threshold))
}
