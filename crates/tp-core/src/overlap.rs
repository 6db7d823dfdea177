//! Overlap detection across a trip's sections.
//!
//! Recomputed in full on every section mutation. The section count per trip
//! is tens at most, so the pairwise pass is the whole algorithm; there is no
//! incremental path to keep consistent.

use std::collections::HashSet;

use crate::range::DateRange;
use crate::types::SectionId;

/// A section's date range tagged with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRange {
    pub id: SectionId,
    pub range: DateRange,
}

/// Result of checking a not-yet-persisted candidate range against existing
/// sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCheck {
    /// Existing sections the candidate range collides with.
    pub overlapping: HashSet<SectionId>,
    /// Whether the candidate overlaps at least one existing section.
    pub candidate_overlaps: bool,
}

/// Returns the ids of all sections whose range overlaps at least one sibling.
///
/// Uses the inclusive-bounds intersection test of [`DateRange::overlaps`]:
/// sections touching at a shared boundary day are flagged.
#[must_use]
pub fn detect_overlaps(sections: &[TaggedRange]) -> HashSet<SectionId> {
    let mut overlapping = HashSet::new();

    for (i, a) in sections.iter().enumerate() {
        for b in &sections[i + 1..] {
            if a.range.overlaps(&b.range) {
                overlapping.insert(a.id.clone());
                overlapping.insert(b.id.clone());
            }
        }
    }

    overlapping
}

/// Checks a candidate range (a section being created or edited, not yet
/// persisted) against the trip's existing sections.
///
/// The candidate has no identity key yet, so its collisions are reported as a
/// boolean; the existing sections it collides with are reported by id so
/// their warning flags can be refreshed in the same write.
#[must_use]
pub fn check_candidate(existing: &[TaggedRange], candidate: DateRange) -> CandidateCheck {
    let mut overlapping = HashSet::new();
    let mut candidate_overlaps = false;

    for section in existing {
        if section.range.overlaps(&candidate) {
            overlapping.insert(section.id.clone());
            candidate_overlaps = true;
        }
    }

    CandidateCheck {
        overlapping,
        candidate_overlaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).expect("valid test date")
    }

    fn tagged(id: &str, start: (u32, u32), end: (u32, u32)) -> TaggedRange {
        TaggedRange {
            id: SectionId::new(id).expect("valid test id"),
            range: DateRange::new(d(start.0, start.1), d(end.0, end.1)),
        }
    }

    fn id(s: &str) -> SectionId {
        SectionId::new(s).expect("valid test id")
    }

    #[test]
    fn disjoint_sections_have_no_overlaps() {
        let sections = vec![
            tagged("a", (1, 1), (1, 5)),
            tagged("b", (1, 7), (1, 10)),
            tagged("c", (1, 12), (1, 15)),
        ];
        assert!(detect_overlaps(&sections).is_empty());
    }

    #[test]
    fn both_ends_of_a_collision_are_flagged() {
        // A(Jan1-Jan5), B(Jan4-Jan8), C(Jan10-Jan12): A and B overlap, C is clear.
        let sections = vec![
            tagged("a", (1, 1), (1, 5)),
            tagged("b", (1, 4), (1, 8)),
            tagged("c", (1, 10), (1, 12)),
        ];
        let overlapping = detect_overlaps(&sections);
        assert_eq!(overlapping, HashSet::from([id("a"), id("b")]));
    }

    #[test]
    fn boundary_touch_counts_as_overlap() {
        let sections = vec![tagged("a", (1, 1), (1, 5)), tagged("b", (1, 5), (1, 9))];
        let overlapping = detect_overlaps(&sections);
        assert_eq!(overlapping, HashSet::from([id("a"), id("b")]));
    }

    #[test]
    fn chain_of_overlaps_flags_every_member() {
        let sections = vec![
            tagged("a", (1, 1), (1, 5)),
            tagged("b", (1, 5), (1, 9)),
            tagged("c", (1, 9), (1, 12)),
        ];
        let overlapping = detect_overlaps(&sections);
        assert_eq!(overlapping, HashSet::from([id("a"), id("b"), id("c")]));
    }

    #[test]
    fn empty_and_single_inputs() {
        assert!(detect_overlaps(&[]).is_empty());
        assert!(detect_overlaps(&[tagged("a", (1, 1), (1, 5))]).is_empty());
    }

    #[test]
    fn recompute_is_idempotent() {
        let sections = vec![
            tagged("a", (1, 1), (1, 5)),
            tagged("b", (1, 4), (1, 8)),
            tagged("c", (1, 10), (1, 12)),
        ];
        let first = detect_overlaps(&sections);
        let second = detect_overlaps(&sections);
        assert_eq!(first, second);
    }

    #[test]
    fn candidate_marks_existing_and_reports_boolean() {
        let existing = vec![tagged("a", (1, 1), (1, 5)), tagged("b", (1, 10), (1, 12))];
        let check = check_candidate(&existing, DateRange::new(d(1, 4), d(1, 6)));
        assert!(check.candidate_overlaps);
        assert_eq!(check.overlapping, HashSet::from([id("a")]));
    }

    #[test]
    fn clear_candidate_reports_nothing() {
        let existing = vec![tagged("a", (1, 1), (1, 5))];
        let check = check_candidate(&existing, DateRange::new(d(1, 7), d(1, 9)));
        assert!(!check.candidate_overlaps);
        assert!(check.overlapping.is_empty());
    }
}
