use crate::workflow::types::ObjectTags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    NotProcessed,
    AlreadyProcessed,
}

/// Decide from the stored tags whether the object still needs work.
pub fn check_processed(tags: &ObjectTags) -> GuardDecision {
    if tags.is_processed() {
        GuardDecision::AlreadyProcessed
    } else {
        GuardDecision::NotProcessed
    }
}
