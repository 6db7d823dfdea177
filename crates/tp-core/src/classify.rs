//! Section classification from activity categories.

use crate::category::ActivityCategory;

/// Infers a section's category from the categories of its activity instances.
///
/// Counts occurrences per category and returns the one with the maximum
/// count. Ties resolve to the first category in declaration order
/// (TRAVEL, STAY, EXPERIENCE, BUFFER), so the result is stable regardless of
/// input order. A section with no activities is BUFFER.
#[must_use]
pub fn infer_section_category(categories: &[ActivityCategory]) -> ActivityCategory {
    if categories.is_empty() {
        return ActivityCategory::Buffer;
    }

    let mut counts = [0_usize; ActivityCategory::ALL.len()];
    for category in categories {
        counts[category.index()] += 1;
    }

    // Strictly-greater keeps the earliest category on ties.
    let mut dominant = ActivityCategory::Buffer;
    let mut dominant_count = 0;
    for (category, count) in ActivityCategory::ALL.into_iter().zip(counts) {
        if count > dominant_count {
            dominant = category;
            dominant_count = count;
        }
    }
    dominant
}
