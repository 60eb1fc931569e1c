use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use super::dataset::ALL_ECO;
use super::types::OpeningRecord;

/// Placeholder at the top of the opening selector.
pub const NO_SELECTION: &str = "---";

/// Names containing this word are counted in the summary by default.
pub const DEFAULT_KEYWORD: &str = "Gambit";

/// Case-insensitive literal substring match on opening names.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    pattern: Option<Regex>,
}

impl NameMatcher {
    /// An empty query matches everything.
    pub fn new(query: &str) -> Result<Self, regex::Error> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn any() -> Self {
        Self { pattern: None }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.as_ref().is_none_or(|p| p.is_match(name))
    }
}

/// ECO selector plus name search; both must pass.
#[derive(Debug, Clone)]
pub struct OpeningFilter {
    eco: Option<String>,
    query: String,
    name: NameMatcher,
}

impl Default for OpeningFilter {
    fn default() -> Self {
        Self {
            eco: None,
            query: String::new(),
            name: NameMatcher::any(),
        }
    }
}

impl OpeningFilter {
    pub fn new(eco: &str, query: &str) -> Result<Self, regex::Error> {
        let mut filter = Self::default();
        filter.set_eco(eco);
        filter.set_query(query)?;
        Ok(filter)
    }

    /// `All` (any case) or an empty value clears the ECO constraint.
    pub fn set_eco(&mut self, eco: &str) {
        let eco = eco.trim();
        self.eco = if eco.is_empty() || eco.eq_ignore_ascii_case(ALL_ECO) {
            None
        } else {
            Some(eco.to_string())
        };
    }

    pub fn set_query(&mut self, query: &str) -> Result<(), regex::Error> {
        self.name = NameMatcher::new(query)?;
        self.query = query.trim().to_string();
        Ok(())
    }

    pub fn eco(&self) -> &str {
        self.eco.as_deref().unwrap_or(ALL_ECO)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self, record: &OpeningRecord) -> bool {
        if let Some(eco) = &self.eco
            && record.eco != *eco
        {
            return false;
        }
        self.name.is_match(&record.name)
    }
}

/// `---` followed by the filtered names, in dataset order.
pub fn opening_choices(filtered: &[&OpeningRecord]) -> Vec<String> {
    std::iter::once(NO_SELECTION.to_string())
        .chain(filtered.iter().map(|r| r.name.clone()))
        .collect()
}

/// Counters shown next to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub per_eco: BTreeMap<String, usize>,
    pub keyword_matches: usize,
}

impl Summary {
    pub fn new(filtered: &[&OpeningRecord], keyword: &NameMatcher) -> Self {
        let mut per_eco = BTreeMap::new();
        let mut keyword_matches = 0;

        for record in filtered {
            *per_eco.entry(record.eco.clone()).or_insert(0) += 1;
            if keyword.is_match(&record.name) {
                keyword_matches += 1;
            }
        }

        Self {
            total: filtered.len(),
            per_eco,
            keyword_matches,
        }
    }

    /// Histogram rows, most frequent first; ties by code.
    pub fn histogram(&self) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .per_eco
            .iter()
            .map(|(code, count)| (code.as_str(), *count))
            .collect();
        rows.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        rows
    }
}
