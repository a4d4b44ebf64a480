use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, FieldKey, FieldValue,
    FormValues,
};
use super::form::AttachedFiles;
use super::repository::{
    ApplicationRepository, ApplicationStatusView, RepositoryError, RequirementsStore,
};
use super::requirements::{FieldKind, FixedField, RequirementsDocument, SpecError};
use super::schema::build_schema;
use super::status::present;
use super::submission::{assemble, SubmissionError};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// One submission as received by the intake surface. The engine performs the
/// same schema validation and gates server-side that the form ran client-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSubmission {
    pub chef_id: String,
    #[serde(default)]
    pub profile: Option<ApplicantProfile>,
    /// Defaults to the tier the status view would render: the effective tier
    /// after an approval, tier 1 after a rejection or cancellation.
    #[serde(default)]
    pub tier: Option<u8>,
    #[serde(deserialize_with = "deserialize_values")]
    pub values: FormValues,
    #[serde(default)]
    pub attachments: AttachedFiles,
}

fn deserialize_values<'de, D>(deserializer: D) -> Result<FormValues, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, FieldValue>::deserialize(deserializer)?;
    let mut values = FormValues::new();
    for (key, value) in raw {
        let parsed = key.parse::<FieldKey>().map_err(serde::de::Error::custom)?;
        values.insert(parsed, value);
    }
    Ok(values)
}

/// Manager decision over a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
    Cancel,
}

/// Service composing the requirements store, repository, and intake engine.
pub struct KitchenApplicationService<R, S> {
    repository: Arc<R>,
    requirements: Arc<S>,
}

impl<R, S> KitchenApplicationService<R, S>
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    pub fn new(repository: Arc<R>, requirements: Arc<S>) -> Self {
        Self {
            repository,
            requirements,
        }
    }

    /// The document a form session should use: the configured one, or the
    /// conservative fallback when none exists.
    pub fn requirements_for(&self, location_id: &str) -> Result<RequirementsDocument, ServiceError> {
        Ok(self
            .requirements
            .get(location_id)?
            .unwrap_or_else(RequirementsDocument::fallback))
    }

    pub fn configured_requirements(
        &self,
        location_id: &str,
    ) -> Result<Option<RequirementsDocument>, ServiceError> {
        Ok(self.requirements.get(location_id)?)
    }

    /// Accepts a manager-configured document after checking its structural
    /// invariants.
    pub fn configure_requirements(
        &self,
        location_id: &str,
        document: RequirementsDocument,
    ) -> Result<(), ServiceError> {
        document.check()?;
        self.requirements.put(location_id, document)?;
        Ok(())
    }

    pub fn status(
        &self,
        chef_id: &str,
        location_id: &str,
    ) -> Result<ApplicationStatusView, ServiceError> {
        let existing = self.repository.fetch(chef_id, location_id)?;
        Ok(ApplicationStatusView::for_record(existing.as_ref()))
    }

    /// Validates and persists one submission, advancing or re-opening the
    /// record as the tier workflow dictates.
    pub fn submit(
        &self,
        location_id: &str,
        submission: IntakeSubmission,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, ServiceError> {
        let existing = self.repository.fetch(&submission.chef_id, location_id)?;

        if let Some(record) = &existing {
            match record.status {
                ApplicationStatus::InReview => return Err(ServiceError::PendingReview),
                ApplicationStatus::Approved if record.current_tier >= 3 => {
                    return Err(ServiceError::AlreadyApproved)
                }
                _ => {}
            }
        }

        // A rejected or cancelled record re-opens at tier 1, not at the tier
        // it was refused at, so the default follows the presenter.
        let tier = match submission.tier {
            Some(tier) => tier,
            None => present(existing.as_ref()).form_tier().unwrap_or(1),
        };
        if !(1..=2).contains(&tier) {
            return Err(ServiceError::InvalidTier(tier));
        }

        let requirements = self.requirements_for(location_id)?;
        let schema = build_schema(&requirements, tier);
        let errors = schema.validate(&submission.values);
        if !errors.is_empty() {
            return Err(ServiceError::Gate(SubmissionError::Invalid(errors)));
        }
        // Runs the pre-submission gates; the assembled payload itself is the
        // client's wire format and is not stored.
        assemble(
            location_id,
            &submission.values,
            tier,
            &requirements,
            &submission.attachments,
            now.date_naive(),
        )?;

        let answers = tier_answers(&submission.values, tier, &requirements);
        let documents = submitted_documents(location_id, &submission);

        let record = match existing {
            None => {
                let record = fresh_record(
                    next_application_id(),
                    location_id,
                    &submission,
                    tier,
                    answers,
                    documents,
                );
                self.repository.insert(record)?
            }
            Some(mut record) => {
                match record.status {
                    // Re-application starts the workflow over; prior answers
                    // were already offered as defaults by the resolver.
                    ApplicationStatus::Rejected | ApplicationStatus::Cancelled => {
                        record = fresh_record(
                            record.id.clone(),
                            location_id,
                            &submission,
                            tier,
                            answers,
                            documents,
                        );
                    }
                    ApplicationStatus::Approved => {
                        record.status = ApplicationStatus::InReview;
                        record.current_tier = tier;
                        apply_contact_fields(&mut record, &submission.values);
                        record.business_info = business_blob(&submission.values);
                        record.tier_responses.insert(tier, answers);
                        record.documents.extend(documents);
                    }
                    ApplicationStatus::InReview => unreachable!("rejected above"),
                }
                self.repository.update(record.clone())?;
                record
            }
        };

        Ok(record)
    }

    /// Applies a manager decision. Approval stamps the completion timestamp
    /// for the tier under review.
    pub fn review(
        &self,
        chef_id: &str,
        location_id: &str,
        action: ReviewAction,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, ServiceError> {
        let mut record = self
            .repository
            .fetch(chef_id, location_id)?
            .ok_or(RepositoryError::NotFound)?;

        match action {
            ReviewAction::Approve => {
                record.status = ApplicationStatus::Approved;
                match record.current_tier {
                    1 => record.tier_one_completed_at = Some(now),
                    _ => record.tier_two_completed_at = Some(now),
                }
            }
            ReviewAction::Reject => record.status = ApplicationStatus::Rejected,
            ReviewAction::Cancel => record.status = ApplicationStatus::Cancelled,
        }

        self.repository.update(record.clone())?;
        Ok(record)
    }
}

fn fresh_record(
    id: ApplicationId,
    location_id: &str,
    submission: &IntakeSubmission,
    tier: u8,
    answers: BTreeMap<String, FieldValue>,
    documents: Vec<super::domain::SubmittedDocument>,
) -> ApplicationRecord {
    let mut record = ApplicationRecord {
        id,
        chef_id: submission.chef_id.clone(),
        location_id: location_id.to_string(),
        status: ApplicationStatus::InReview,
        current_tier: tier,
        tier_one_completed_at: None,
        tier_two_completed_at: None,
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone: String::new(),
        business_info: business_blob(&submission.values),
        documents,
        tier_responses: BTreeMap::new(),
    };
    apply_contact_fields(&mut record, &submission.values);
    record.tier_responses.insert(tier, answers);
    record
}

fn fixed_text(values: &FormValues, field: FixedField) -> String {
    values
        .get(&FieldKey::Fixed(field))
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

fn apply_contact_fields(record: &mut ApplicationRecord, values: &FormValues) {
    record.first_name = fixed_text(values, FixedField::FirstName);
    record.last_name = fixed_text(values, FixedField::LastName);
    record.email = fixed_text(values, FixedField::Email);
    record.phone = fixed_text(values, FixedField::Phone);
}

fn business_blob(values: &FormValues) -> String {
    let text = |field: FixedField| {
        let value = fixed_text(values, field);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    };
    let info = super::domain::BusinessInfo {
        business_name: text(FixedField::BusinessName),
        business_type: text(FixedField::BusinessType),
        experience: text(FixedField::Experience),
        description: text(FixedField::Description),
        usage_frequency: text(FixedField::UsageFrequency),
        session_duration: text(FixedField::SessionDuration),
        food_handler_cert_expiry: text(FixedField::FoodHandlerCertExpiry),
        food_establishment_cert_expiry: text(FixedField::FoodEstablishmentCertExpiry),
    };
    serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
}

/// Stored per-tier answers follow the same asymmetric inclusion rules as the
/// wire payload: nothing empty/false is persisted as if it were an answer.
fn tier_answers(
    values: &FormValues,
    tier: u8,
    requirements: &RequirementsDocument,
) -> BTreeMap<String, FieldValue> {
    let mut answers = BTreeMap::new();
    for spec in requirements.custom_fields_for(tier) {
        let key = FieldKey::custom(spec.id.clone());
        let Some(value) = values.get(&key) else {
            continue;
        };
        let keep = match spec.kind {
            FieldKind::CheckboxMulti => value.as_many().map(|items| !items.is_empty()),
            FieldKind::CheckboxBool => value.as_toggle(),
            FieldKind::Unsupported(_) => Some(false),
            _ => value.as_text().map(|text| !text.trim().is_empty()),
        }
        .unwrap_or(false);
        if keep {
            answers.insert(spec.id.clone(), value.clone());
        }
    }
    answers
}

fn submitted_documents(
    location_id: &str,
    submission: &IntakeSubmission,
) -> Vec<super::domain::SubmittedDocument> {
    use super::domain::{DocumentApproval, SubmittedDocument};

    let slot = |file: &super::form::AttachedFile| SubmittedDocument {
        name: file.name.clone(),
        url: format!(
            "uploads/{location_id}/{}/{}",
            submission.chef_id, file.name
        ),
        approval: DocumentApproval::Pending,
    };

    let attachments = &submission.attachments;
    attachments
        .food_handler
        .iter()
        .chain(attachments.food_establishment.iter())
        .chain(attachments.insurance.iter())
        .chain(attachments.custom.values())
        .map(slot)
        .collect()
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Gate(#[from] SubmissionError),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("an application is already under review for this location")]
    PendingReview,
    #[error("application is fully approved; there is nothing left to submit")]
    AlreadyApproved,
    #[error("tier {0} is outside the supported intake tiers")]
    InvalidTier(u8),
}
