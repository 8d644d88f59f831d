//! One-submission rule for assessments.
//!
//! Unless an assessment has `submit_multiple` set, it accepts a single result
//! in total. The count is per assessment, not per student.

/// Whether one more result may be recorded for an assessment that already has
/// `existing_results`.
pub fn submission_allowed(submit_multiple: bool, existing_results: i64) -> bool {
    submit_multiple || existing_results == 0
}
