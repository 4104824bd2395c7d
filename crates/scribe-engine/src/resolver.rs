// OverlapResolver: reduce a multi-provider candidate list to a conflict-free
// subset.

use std::collections::BTreeMap;

use scribe_core::{Span, Suggestion};
use tracing::debug;

/// Greedy, priority-ordered overlap resolution.
///
/// Candidates are visited in `(source_rank, start)` order; a candidate is
/// kept iff it overlaps nothing already kept. Rejected candidates are
/// discarded, never merged. The kept set is returned ascending by start.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapResolver;

impl OverlapResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, mut candidates: Vec<Suggestion>) -> Vec<Suggestion> {
        let total = candidates.len();
        // Stable: same-rank, same-start candidates keep their input order.
        candidates.sort_by_key(|s| (s.source_rank, s.span.start));

        // Kept spans keyed by start. Kept spans never overlap each other, so
        // only the nearest neighbour on each side can conflict.
        let mut kept: BTreeMap<usize, Suggestion> = BTreeMap::new();
        for candidate in candidates {
            if candidate.span.is_empty() || conflicts(&kept, candidate.span) {
                continue;
            }
            kept.insert(candidate.span.start, candidate);
        }

        let resolved: Vec<Suggestion> = kept.into_values().collect();
        if resolved.len() < total {
            debug!(
                candidates = total,
                kept = resolved.len(),
                "resolver dropped overlapping candidates"
            );
        }
        resolved
    }
}

fn conflicts(kept: &BTreeMap<usize, Suggestion>, span: Span) -> bool {
    let before = kept.range(..=span.start).next_back();
    let after = kept.range(span.start..).next();
    before
        .into_iter()
        .chain(after)
        .any(|(_, other)| other.span.overlaps(&span))
}
