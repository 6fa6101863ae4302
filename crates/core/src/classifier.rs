//! Age-banded tachycardia classification.
//!
//! Pure logic. Band upper bounds are inclusive: a 6-year-old uses the
//! youngest band, a 17-year-old the adolescent band.

use crate::types::HeartRate;

/// Oldest age (inclusive) in the young-child band.
pub const CHILD_MAX_AGE: u32 = 6;
/// Oldest age (inclusive) in the adolescent band.
pub const ADOLESCENT_MAX_AGE: u32 = 17;

/// Tachycardia threshold (bpm, inclusive) for ages `0..=6`.
pub const CHILD_THRESHOLD_BPM: HeartRate = 160;
/// Tachycardia threshold (bpm, inclusive) for ages `7..=17`.
pub const ADOLESCENT_THRESHOLD_BPM: HeartRate = 120;
/// Tachycardia threshold (bpm, inclusive) for ages 18 and over.
pub const ADULT_THRESHOLD_BPM: HeartRate = 100;

/// Lowest heart rate considered tachycardic for the given age.
pub fn threshold_for_age(age: u32) -> HeartRate {
    if age <= CHILD_MAX_AGE {
        CHILD_THRESHOLD_BPM
    } else if age <= ADOLESCENT_MAX_AGE {
        ADOLESCENT_THRESHOLD_BPM
    } else {
        ADULT_THRESHOLD_BPM
    }
}

pub fn is_tachycardic(age: u32, heart_rate: HeartRate) -> bool {
    heart_rate >= threshold_for_age(age)
}
