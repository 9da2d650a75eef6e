//! Candidate filter pipeline
//!
//! An ordered list of filters, each narrowing the candidate list against the
//! shared selection context before a strategy picks one. Every filter
//! self-guards: if its result would be empty, it returns its input unchanged,
//! so the pipeline can restrict but never block selection entirely.

use crate::metadata::{Classification, MetadataStore};
use crate::select::SelectionContext;
use std::collections::HashSet;
use tracing::{debug, info};

/// The closed set of filters; order in the chain matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Exclusion,
    TimeBased,
    Luminosity,
    Recency,
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Exclusion => "exclusion",
            FilterKind::TimeBased => "time_based",
            FilterKind::Luminosity => "luminosity",
            FilterKind::Recency => "recency",
        }
    }
}

/// Ordered filter pipeline over candidate lists
pub struct FilterChain {
    filters: Vec<FilterKind>,
    excluded: HashSet<String>,
}

impl FilterChain {
    /// Default order: exclusion, time, luminosity, recency
    pub fn new(excluded: HashSet<String>) -> Self {
        Self {
            filters: vec![
                FilterKind::Exclusion,
                FilterKind::TimeBased,
                FilterKind::Luminosity,
                FilterKind::Recency,
            ],
            excluded,
        }
    }

    /// Run candidates through every filter in order. Each filter sees the
    /// previous filter's output and the same shared context.
    pub fn apply(
        &self,
        candidates: Vec<String>,
        ctx: &SelectionContext,
        store: &mut MetadataStore,
    ) -> Vec<String> {
        let initial = candidates.len();
        let mut current = candidates;

        for filter in &self.filters {
            let before = current.len();
            current = self.apply_one(*filter, current, ctx, store);
            debug!(
                filter = filter.name(),
                before,
                after = current.len(),
                "filter pass"
            );
        }

        if current.len() < initial {
            info!(
                initial,
                remaining = current.len(),
                "filter chain narrowed candidates"
            );
        }
        current
    }

    fn apply_one(
        &self,
        filter: FilterKind,
        candidates: Vec<String>,
        ctx: &SelectionContext,
        store: &mut MetadataStore,
    ) -> Vec<String> {
        match filter {
            FilterKind::Exclusion => apply_exclusion(candidates, &self.excluded),
            FilterKind::TimeBased => apply_time_based(candidates, ctx, store),
            FilterKind::Luminosity => apply_luminosity(candidates, ctx, store),
            FilterKind::Recency => apply_recency(candidates, ctx),
        }
    }
}

/// Keep `filtered` unless it is empty, in which case the original input wins.
/// Filters restrict the pool; they are never allowed to drain it.
fn fallback_to_original(
    filter: FilterKind,
    original: Vec<String>,
    filtered: Vec<String>,
) -> Vec<String> {
    if filtered.is_empty() && !original.is_empty() {
        info!(
            filter = filter.name(),
            "filter would empty the candidate list, using unfiltered input"
        );
        original
    } else {
        filtered
    }
}

/// Drop candidates on the configured exclusion list
fn apply_exclusion(candidates: Vec<String>, excluded: &HashSet<String>) -> Vec<String> {
    if excluded.is_empty() {
        return candidates;
    }
    let filtered: Vec<String> = candidates
        .iter()
        .filter(|c| !excluded.contains(c.as_str()))
        .cloned()
        .collect();
    fallback_to_original(FilterKind::Exclusion, candidates, filtered)
}

/// Keep candidates whose classification is active for the current time.
/// Passthrough unless time-based selection is enabled in the context.
fn apply_time_based(
    candidates: Vec<String>,
    ctx: &SelectionContext,
    store: &mut MetadataStore,
) -> Vec<String> {
    if !ctx.time_based_enabled {
        return candidates;
    }

    let suitable = store.images_for_time(ctx.now);
    if suitable.is_empty() {
        // Nothing known for this time (e.g. empty store): no restriction
        return candidates;
    }

    let filtered: Vec<String> = candidates
        .iter()
        .filter(|c| suitable.contains(c.as_str()))
        .cloned()
        .collect();
    fallback_to_original(FilterKind::TimeBased, candidates, filtered)
}

/// Keep candidates matching the requested luminosity classification.
/// Unanalyzed images count as `medium`, the default bucket.
fn apply_luminosity(
    candidates: Vec<String>,
    ctx: &SelectionContext,
    store: &MetadataStore,
) -> Vec<String> {
    let Some(wanted) = ctx.luminosity_filter else {
        return candidates;
    };

    let filtered: Vec<String> = candidates
        .iter()
        .filter(|c| {
            let classification = store
                .get_record(c)
                .map(|r| r.classification)
                .unwrap_or(Classification::Medium);
            classification == wanted
        })
        .cloned()
        .collect();
    fallback_to_original(FilterKind::Luminosity, candidates, filtered)
}

/// Drop candidates in the strategy's recent set
fn apply_recency(candidates: Vec<String>, ctx: &SelectionContext) -> Vec<String> {
    if !ctx.filter_recent || ctx.recent.is_empty() {
        return candidates;
    }
    let recent: HashSet<&str> = ctx.recent.iter().map(String::as_str).collect();
    let filtered: Vec<String> = candidates
        .iter()
        .filter(|c| !recent.contains(c.as_str()))
        .cloned()
        .collect();
    fallback_to_original(FilterKind::Recency, candidates, filtered)
}
