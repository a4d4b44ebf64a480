use super::common::*;
use crate::workflows::intake::domain::ApplicationStatus;
use crate::workflows::intake::repository::ApplicationStatusView;
use crate::workflows::intake::status::{present, StatusView};

#[test]
fn no_application_renders_a_fresh_tier_one_form() {
    assert_eq!(present(None), StatusView::Form { tier: 1 });
}

#[test]
fn in_review_blocks_the_form() {
    let record = record(ApplicationStatus::InReview, 1);
    let view = present(Some(&record));
    assert_eq!(view, StatusView::PendingReview);
    assert_eq!(view.form_tier(), None);
}

#[test]
fn approval_advances_the_effective_tier() {
    let record = record(ApplicationStatus::Approved, 1);
    assert_eq!(record.effective_tier(), 2);
    assert_eq!(present(Some(&record)), StatusView::Form { tier: 2 });
}

#[test]
fn approved_tier_two_does_not_advance_further() {
    let record = record(ApplicationStatus::Approved, 2);
    assert_eq!(record.effective_tier(), 2);
    assert_eq!(present(Some(&record)), StatusView::Form { tier: 2 });
}

#[test]
fn tier_three_is_terminal() {
    let record = record(ApplicationStatus::Approved, 3);
    assert_eq!(present(Some(&record)), StatusView::FullyApproved);
}

#[test]
fn rejection_offers_a_fresh_tier_one_form_with_a_notice() {
    for status in [ApplicationStatus::Rejected, ApplicationStatus::Cancelled] {
        let record = record(status, 1);
        let view = present(Some(&record));
        assert_eq!(view, StatusView::ReapplyForm { status });
        assert_eq!(view.form_tier(), Some(1));
    }
}

#[test]
fn status_view_projection_carries_both_tiers() {
    let record = record(ApplicationStatus::Approved, 1);
    let view = ApplicationStatusView::for_record(Some(&record));
    assert_eq!(view.current_tier, 1);
    assert_eq!(view.effective_tier, 2);
    assert_eq!(view.status, Some("approved"));

    let fresh = ApplicationStatusView::for_record(None);
    assert_eq!(fresh.current_tier, 1);
    assert!(fresh.status.is_none());
}
