use serde::Serialize;

use super::domain::{ApplicationRecord, ApplicationStatus};

/// Tier used as the "fully complete" signal. The form only actively manages
/// tiers 1 and 2; records never store a tier past 2 today, so the terminal branch
/// is reached only by future data.
const COMPLETED_TIER: u8 = 3;

/// What the applicant-facing surface should render for a (chef, location)
/// pair.
///
/// This is a strict decision table over the fetched application, not a state
/// machine: every transition happens server-side through manager review and
/// is observed by re-fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StatusView {
    /// Live form at the given tier; no notice.
    Form { tier: u8 },
    /// Blocking notice; no form, no edit affordance.
    PendingReview,
    /// Terminal notice: every tier approved, booking unlocked.
    FullyApproved,
    /// Non-blocking notice rendered above a fresh tier-1 form. Prior answers
    /// still preload; rejection clears status, not data.
    ReapplyForm { status: ApplicationStatus },
}

pub fn present(existing: Option<&ApplicationRecord>) -> StatusView {
    let Some(record) = existing else {
        return StatusView::Form { tier: 1 };
    };

    match record.status {
        ApplicationStatus::InReview => StatusView::PendingReview,
        ApplicationStatus::Approved if record.current_tier >= COMPLETED_TIER => {
            StatusView::FullyApproved
        }
        ApplicationStatus::Approved => StatusView::Form {
            tier: record.effective_tier(),
        },
        ApplicationStatus::Rejected | ApplicationStatus::Cancelled => StatusView::ReapplyForm {
            status: record.status,
        },
    }
}

impl StatusView {
    /// The tier a rendered form should use, when a form is shown at all.
    pub fn form_tier(&self) -> Option<u8> {
        match self {
            StatusView::Form { tier } => Some(*tier),
            StatusView::ReapplyForm { .. } => Some(1),
            StatusView::PendingReview | StatusView::FullyApproved => None,
        }
    }
}
