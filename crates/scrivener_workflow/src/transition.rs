//! Routing between steps.
//!
//! Kept free of I/O so the retry ceiling and the decision fallback can be
//! tested directly.

use scrivener_core::{HumanDecision, ReviewOutcome, Step, WorkflowState, WorkflowStatus};

/// Where the workflow goes after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReview {
    /// Loop back for another rewrite attempt
    Retry,
    /// Suspend at the decision gate
    Decide,
    /// Stop; the retry ceiling was reached
    Exhausted,
}

/// Route after a review and update the retry bookkeeping.
///
/// `retry_count` counts retries already granted, so the ceiling is
/// exclusive: with `max_retries = 2` a run makes at most three rewrite
/// attempts and `retry_count` never exceeds `max_retries`.
pub fn after_review(state: &mut WorkflowState) -> AfterReview {
    match state.review_outcome {
        ReviewOutcome::Passed => AfterReview::Decide,
        _ if state.can_retry() => {
            state.retry_count += 1;
            tracing::debug!(
                retry_count = state.retry_count,
                max_retries = state.max_retries,
                "Review failed, retrying rewrite"
            );
            AfterReview::Retry
        }
        _ => {
            tracing::warn!(
                retry_count = state.retry_count,
                score = state.review_score,
                "Retry ceiling reached, ending workflow"
            );
            state.status = WorkflowStatus::RetriesExhausted;
            AfterReview::Exhausted
        }
    }
}

/// Step taken for a human decision. Anything but a manual edit goes to the cover.
pub fn after_decision(decision: HumanDecision) -> Step {
    match decision {
        HumanDecision::ManualEdit => Step::ManualEdit,
        HumanDecision::SkipToCover => Step::Cover,
        HumanDecision::Pending => {
            tracing::warn!("No decision supplied, defaulting to cover");
            Step::Cover
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::WorkflowInput;

    fn state(max_retries: u32) -> WorkflowState {
        let input = WorkflowInput::builder()
            .source_article("原文")
            .style_id(1)
            .max_retries(max_retries)
            .build()
            .unwrap();
        WorkflowState::new(&input)
    }

    #[test]
    fn passed_review_goes_to_decision() {
        let mut state = state(3);
        state.review_outcome = ReviewOutcome::Passed;
        assert_eq!(after_review(&mut state), AfterReview::Decide);
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn failed_reviews_retry_until_ceiling() {
        let mut state = state(2);
        state.review_outcome = ReviewOutcome::Failed;
        assert_eq!(after_review(&mut state), AfterReview::Retry);
        assert_eq!(after_review(&mut state), AfterReview::Retry);
        assert_eq!(state.retry_count, 2);
        assert_eq!(after_review(&mut state), AfterReview::Exhausted);
        assert_eq!(state.retry_count, 2);
        assert_eq!(state.status, WorkflowStatus::RetriesExhausted);
    }

    #[test]
    fn zero_ceiling_never_retries() {
        let mut state = state(0);
        state.review_outcome = ReviewOutcome::Failed;
        assert_eq!(after_review(&mut state), AfterReview::Exhausted);
    }

    #[test]
    fn unset_outcome_is_treated_as_failure() {
        let mut state = state(1);
        assert_eq!(after_review(&mut state), AfterReview::Retry);
    }

    #[test]
    fn decisions_route_with_cover_fallback() {
        assert_eq!(after_decision(HumanDecision::ManualEdit), Step::ManualEdit);
        assert_eq!(after_decision(HumanDecision::SkipToCover), Step::Cover);
        assert_eq!(after_decision(HumanDecision::Pending), Step::Cover);
        assert_eq!(
            after_decision(HumanDecision::parse_lenient("publish_now")),
            Step::Cover
        );
    }
}
