//! Derived-state recomputation for a trip's section set.
//!
//! Category and overlap flags are derived data. Rather than patching them
//! incrementally at each mutation site, every committed edit to a section or
//! its activities reruns this single pass over the loaded aggregate and
//! persists the result in the same transaction.

use std::collections::HashMap;

use crate::category::ActivityCategory;
use crate::classify::infer_section_category;
use crate::overlap::{TaggedRange, detect_overlaps};
use crate::trip::{ScheduledActivity, Section};
use crate::types::SectionId;

/// Freshly derived state for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedSection {
    pub category: ActivityCategory,
    pub has_overlap_warning: bool,
}

/// Recomputes category and overlap flags for every section of one trip.
///
/// `activities` must hold all instances of all listed sections. The pass is
/// a pure function of its inputs: running it twice on unchanged data yields
/// identical output.
#[must_use]
pub fn recompute_sections(
    sections: &[Section],
    activities: &[ScheduledActivity],
) -> HashMap<SectionId, DerivedSection> {
    let ranges: Vec<TaggedRange> = sections
        .iter()
        .map(|section| TaggedRange {
            id: section.id.clone(),
            range: section.range(),
        })
        .collect();
    let overlapping = detect_overlaps(&ranges);
    tracing::debug!(
        sections = sections.len(),
        flagged = overlapping.len(),
        "recomputed overlap flags"
    );

    let mut categories_by_section: HashMap<&SectionId, Vec<ActivityCategory>> = HashMap::new();
    for activity in activities {
        categories_by_section
            .entry(&activity.section_id)
            .or_default()
            .push(activity.catalog_category);
    }

    sections
        .iter()
        .map(|section| {
            let categories = categories_by_section
                .get(&section.id)
                .map_or(&[][..], Vec::as_slice);
            let derived = DerivedSection {
                category: infer_section_category(categories),
                has_overlap_warning: overlapping.contains(&section.id),
            };
            (section.id.clone(), derived)
        })
        .collect()
}
