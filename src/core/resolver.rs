//! Free-text entity resolution against the reference corpus.
//!
//! Resolution runs in three tiers:
//! 1. exact match on the normalized (or whitespace-free) canonical name or alias
//! 2. fuzzy match on substring containment and content-token overlap
//! 3. fallback to every entity of the requested kind, tagged `NoMatch`

use std::collections::{BTreeSet, HashMap};
use crate::corpus::ReferenceCorpus;
use crate::models::{EntityKind, MatchKind, ResolutionSummary};

/// Minimum fuzzy score for a candidate to be returned
const FUZZY_MIN_SCORE: f64 = 0.5;

/// Maximum number of fuzzy candidates returned
const FUZZY_MAX_RESULTS: usize = 5;

/// Score given to substring containment of the compact forms
const SUBSTRING_SCORE: f64 = 0.8;

/// Jaro-Winkler similarity at which two tokens count as the same word
const TOKEN_SIMILARITY: f64 = 0.92;

/// Tokens too generic to identify an entity on their own
const GENERIC_TOKENS: &[&str] = &[
    "cancer", "disease", "disorder", "syndrome", "of", "the", "and", "with", "in", "type",
    "chronic", "acute",
];

/// Lower-case, drop punctuation (hyphens included) and collapse whitespace.
///
/// `"PD-L1"` and `"PDL1"` both normalize to `"pdl1"`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.extend(ch.to_lowercase());
        }
    }

    out
}

/// Normalized form with all whitespace removed
pub fn compact(text: &str) -> String {
    normalize(text).chars().filter(|c| !c.is_whitespace()).collect()
}

/// Outcome of resolving one query
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Exact(Vec<String>),
    Fuzzy(Vec<String>),
    /// Nothing matched; carries the full entity list of the requested kind
    NoMatch { fallback: Vec<String> },
}

impl Resolution {
    pub fn entities(&self) -> &[String] {
        match self {
            Resolution::Exact(names) | Resolution::Fuzzy(names) => names,
            Resolution::NoMatch { fallback } => fallback,
        }
    }

    pub fn match_kind(&self) -> MatchKind {
        match self {
            Resolution::Exact(_) => MatchKind::Exact,
            Resolution::Fuzzy(_) => MatchKind::Fuzzy,
            Resolution::NoMatch { .. } => MatchKind::NoMatch,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::NoMatch { .. })
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.entities().iter().any(|e| e == canonical)
    }

    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary {
            match_kind: self.match_kind(),
            entities: self.entities().to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedTerm {
    compact: String,
    tokens: Vec<String>,
}

/// Lookup structure for one entity kind, built once per corpus snapshot
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    names: Vec<String>,
    keys: HashMap<String, BTreeSet<usize>>,
    terms: Vec<Vec<IndexedTerm>>,
}

impl EntityIndex {
    /// Build from `(canonical name, aliases)` pairs; names are sorted
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut entries: Vec<(&str, &[String])> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut index = EntityIndex::default();
        for (position, (name, aliases)) in entries.into_iter().enumerate() {
            index.names.push(name.to_string());

            let mut terms = Vec::with_capacity(aliases.len() + 1);
            for text in std::iter::once(name).chain(aliases.iter().map(String::as_str)) {
                let normalized = normalize(text);
                if normalized.is_empty() {
                    continue;
                }
                let compact_form: String =
                    normalized.chars().filter(|c| !c.is_whitespace()).collect();

                index.keys.entry(normalized.clone()).or_default().insert(position);
                index.keys.entry(compact_form.clone()).or_default().insert(position);

                terms.push(IndexedTerm {
                    compact: compact_form,
                    tokens: normalized.split(' ').map(str::to_string).collect(),
                });
            }
            index.terms.push(terms);
        }

        index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical names whose name or alias equals the query after normalization
    pub fn exact(&self, query: &str) -> Vec<String> {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return vec![];
        }
        let compact_form: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();

        let mut hits: BTreeSet<usize> = BTreeSet::new();
        for key in [&normalized, &compact_form] {
            if let Some(positions) = self.keys.get(key) {
                hits.extend(positions.iter().copied());
            }
        }
        hits.into_iter().map(|i| self.names[i].clone()).collect()
    }

    /// Fuzzy candidates with their scores, best first, ties by name
    pub fn fuzzy(&self, query: &str) -> Vec<(String, f64)> {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return vec![];
        }
        let query_compact: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
        let query_tokens = content_tokens(&normalized);

        let mut scored: Vec<(String, f64)> = self
            .terms
            .iter()
            .enumerate()
            .filter_map(|(position, terms)| {
                let best = terms
                    .iter()
                    .map(|term| term_score(&query_compact, &query_tokens, term))
                    .fold(0.0_f64, f64::max);
                (best >= FUZZY_MIN_SCORE).then(|| (self.names[position].clone(), best))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(FUZZY_MAX_RESULTS);
        scored
    }
}

/// Tokens of a normalized string minus generic words, unless nothing else is left
fn content_tokens(normalized: &str) -> Vec<String> {
    let all: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let content: Vec<&str> = all
        .iter()
        .copied()
        .filter(|t| !GENERIC_TOKENS.contains(t))
        .collect();
    let chosen = if content.is_empty() { all } else { content };
    chosen.into_iter().map(str::to_string).collect()
}

fn term_score(query_compact: &str, query_tokens: &[String], term: &IndexedTerm) -> f64 {
    let substring = if query_compact.len() >= 3 && term.compact.contains(query_compact) {
        SUBSTRING_SCORE
    } else if term.compact.len() >= 5 && query_compact.contains(term.compact.as_str()) {
        SUBSTRING_SCORE
    } else {
        0.0
    };

    if query_tokens.is_empty() {
        return substring;
    }

    let matched = query_tokens
        .iter()
        .filter(|q| term.tokens.iter().any(|t| tokens_match(q, t)))
        .count();
    let overlap = matched as f64 / query_tokens.len() as f64;

    substring.max(overlap)
}

fn tokens_match(query_token: &str, term_token: &str) -> bool {
    if query_token == term_token {
        return true;
    }
    query_token.len() >= 4
        && term_token.len() >= 4
        && strsim::jaro_winkler(query_token, term_token) >= TOKEN_SIMILARITY
}

/// Resolve free text to canonical entities of one kind.
///
/// Never fails: a miss returns the full entity list as `NoMatch`.
pub fn resolve(corpus: &ReferenceCorpus, query: &str, kind: EntityKind) -> Resolution {
    let index = corpus.entity_index(kind);

    let exact = index.exact(query);
    if !exact.is_empty() {
        tracing::debug!("Resolved {} '{}' exactly to {:?}", kind, query, exact);
        return Resolution::Exact(exact);
    }

    let fuzzy = index.fuzzy(query);
    if !fuzzy.is_empty() {
        tracing::debug!("Resolved {} '{}' fuzzily to {:?}", kind, query, fuzzy);
        return Resolution::Fuzzy(fuzzy.into_iter().map(|(name, _)| name).collect());
    }

    tracing::warn!(
        "No {} matched '{}', falling back to all {} entities",
        kind,
        query,
        index.len()
    );
    Resolution::NoMatch {
        fallback: index.names().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> EntityIndex {
        let nsclc_aliases = vec!["NSCLC".to_string(), "non small cell lung carcinoma".to_string()];
        let sclc_aliases = vec!["SCLC".to_string()];
        let breast_aliases = vec!["BC".to_string()];
        let alz_aliases = vec!["AD".to_string(), "Alzheimer's".to_string()];
        EntityIndex::build(vec![
            ("Non-Small Cell Lung Cancer", nsclc_aliases.as_slice()),
            ("Small Cell Lung Cancer", sclc_aliases.as_slice()),
            ("Breast Cancer", breast_aliases.as_slice()),
            ("Alzheimer's Disease", alz_aliases.as_slice()),
        ])
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("PD-L1"), "pdl1");
        assert_eq!(normalize("PDL1"), "pdl1");
        assert_eq!(normalize("  Non-Small   Cell\tLung Cancer "), "nonsmall cell lung cancer");
        assert_eq!(normalize("Alzheimer's"), "alzheimers");
        assert_eq!(normalize("---"), "");
        assert_eq!(compact("PD L1"), "pdl1");
    }

    #[test]
    fn test_exact_is_case_insensitive_and_alias_symmetric() {
        let index = index();
        let by_name = index.exact("non-small cell lung cancer");
        let by_alias = index.exact("nsclc");
        let by_other_alias = index.exact("Non Small Cell Lung Carcinoma");
        assert_eq!(by_name, vec!["Non-Small Cell Lung Cancer".to_string()]);
        assert_eq!(by_name, by_alias);
        assert_eq!(by_alias, by_other_alias);
    }

    #[test]
    fn test_compact_key_matches_spacing_variants() {
        let index = index();
        assert_eq!(index.exact("S C L C"), vec!["Small Cell Lung Cancer".to_string()]);
    }

    #[test]
    fn test_fuzzy_token_overlap_ignores_generic_words() {
        let index = index();
        let hits: Vec<String> = index.fuzzy("lung cancer").into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            hits,
            vec!["Non-Small Cell Lung Cancer".to_string(), "Small Cell Lung Cancer".to_string()]
        );
    }

    #[test]
    fn test_fuzzy_absorbs_typos() {
        let index = index();
        let hits = index.fuzzy("alzhiemers");
        assert_eq!(hits.first().map(|h| h.0.as_str()), Some("Alzheimer's Disease"));
    }

    #[test]
    fn test_fuzzy_substring() {
        let index = index();
        let hits = index.fuzzy("breas");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "Breast Cancer");
    }

    #[test]
    fn test_unknown_text_has_no_candidates() {
        let index = index();
        assert!(index.exact("TOTALLY_UNKNOWN_XYZ").is_empty());
        assert!(index.fuzzy("TOTALLY_UNKNOWN_XYZ").is_empty());
        assert!(index.exact("").is_empty());
    }

    #[test]
    fn test_resolution_accessors() {
        let resolution = Resolution::NoMatch {
            fallback: vec!["A".to_string(), "B".to_string()],
        };
        assert!(resolution.is_fallback());
        assert_eq!(resolution.match_kind(), MatchKind::NoMatch);
        assert_eq!(resolution.entities().len(), 2);
        assert!(resolution.contains("B"));
    }
}
