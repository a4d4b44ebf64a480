use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::workflows::intake::domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, FieldKey, FieldValue,
    FormValues,
};
use crate::workflows::intake::form::{AttachedFile, AttachedFiles};
use crate::workflows::intake::repository::{
    ApplicationRepository, RepositoryError, RequirementsStore,
};
use crate::workflows::intake::requirements::{
    CustomFieldSpec, FieldKind, FixedField, RequirementsDocument,
};
use crate::workflows::intake::service::{IntakeSubmission, KitchenApplicationService};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

pub(super) fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).single().expect("valid timestamp")
}

pub(super) fn custom_field(id: &str, kind: FieldKind, required: bool) -> CustomFieldSpec {
    let options = match kind {
        FieldKind::Select | FieldKind::CheckboxMulti => {
            vec!["morning".to_string(), "evening".to_string()]
        }
        _ => Vec::new(),
    };
    CustomFieldSpec {
        id: id.to_string(),
        label: format!("Custom {id}"),
        kind,
        required,
        placeholder: None,
        options,
    }
}

/// Requirements with a representative spread of flags and custom fields.
pub(super) fn requirements() -> RequirementsDocument {
    RequirementsDocument {
        require_first_name: true,
        require_last_name: false,
        require_email: true,
        require_phone: false,
        require_business_name: true,
        require_business_type: false,
        require_experience: false,
        require_description: false,
        require_food_handler_cert: true,
        require_food_handler_cert_expiry: true,
        require_food_establishment_cert: false,
        require_food_establishment_cert_expiry: false,
        require_usage_frequency: false,
        require_session_duration: false,
        require_terms_agree: true,
        require_accuracy_agree: true,
        tier_one_fields: vec![
            custom_field("allergens", FieldKind::CheckboxMulti, false),
            custom_field("cuisine", FieldKind::Select, true),
        ],
        tier_two_fields: vec![
            custom_field("insurance_provider", FieldKind::Text, true),
            custom_field("walkthrough_date", FieldKind::Date, false),
        ],
    }
}

/// The minimal tier-1 document from the intake scenarios: only identity,
/// certificate, and agreement fields are mandatory.
pub(super) fn minimal_requirements() -> RequirementsDocument {
    RequirementsDocument {
        require_first_name: true,
        require_email: true,
        require_food_handler_cert: true,
        require_food_handler_cert_expiry: true,
        require_terms_agree: true,
        require_accuracy_agree: true,
        ..RequirementsDocument::default()
    }
}

pub(super) fn profile() -> ApplicantProfile {
    ApplicantProfile {
        full_name: "Maria del Carmen Ortiz".to_string(),
        email: "maria@ortizcatering.test".to_string(),
        phone: Some("515-555-0117".to_string()),
    }
}

pub(super) fn pdf_file(name: &str) -> AttachedFile {
    AttachedFile::from_bytes(name, "application/pdf", vec![0x25, 0x50, 0x44, 0x46])
}

pub(super) fn set_text(values: &mut FormValues, field: FixedField, text: &str) {
    values.insert(FieldKey::Fixed(field), FieldValue::text(text));
}

pub(super) fn accept(values: &mut FormValues, field: FixedField) {
    values.insert(FieldKey::Fixed(field), FieldValue::Toggle(true));
}

/// Values satisfying [`minimal_requirements`] with an expiry safely out.
pub(super) fn minimal_values() -> FormValues {
    let mut values = FormValues::new();
    set_text(&mut values, FixedField::FirstName, "Maria");
    set_text(&mut values, FixedField::Email, "maria@ortizcatering.test");
    set_text(&mut values, FixedField::FoodHandlerCertExpiry, "2026-12-01");
    accept(&mut values, FixedField::TermsAgree);
    accept(&mut values, FixedField::AccuracyAgree);
    values
}

pub(super) fn tier_one_attachments() -> AttachedFiles {
    AttachedFiles {
        food_handler: Some(pdf_file("handler-cert.pdf")),
        ..AttachedFiles::default()
    }
}

pub(super) fn record(status: ApplicationStatus, current_tier: u8) -> ApplicationRecord {
    let mut tier_responses = BTreeMap::new();
    tier_responses.insert(
        1,
        BTreeMap::from([
            (
                "allergens".to_string(),
                FieldValue::Many(vec!["nuts".to_string()]),
            ),
            ("cuisine".to_string(), FieldValue::text("morning")),
        ]),
    );
    ApplicationRecord {
        id: ApplicationId("app-000042".to_string()),
        chef_id: "chef-7".to_string(),
        location_id: "loc-des-moines".to_string(),
        status,
        current_tier,
        tier_one_completed_at: None,
        tier_two_completed_at: None,
        first_name: "Maria".to_string(),
        last_name: "Ortiz".to_string(),
        email: "maria@ortizcatering.test".to_string(),
        phone: "515-555-0117".to_string(),
        business_info: serde_json::json!({
            "businessName": "Ortiz Catering",
            "businessType": "catering",
            "experience": "6",
            "description": "Family catering outfit",
            "usageFrequency": "weekly",
            "sessionDuration": "4h",
            "foodHandlerCertExpiry": "2026-11-15",
            "foodEstablishmentCertExpiry": null,
        })
        .to_string(),
        documents: Vec::new(),
        tier_responses,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<(String, String), ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let key = (record.chef_id.clone(), record.location_id.clone());
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let key = (record.chef_id.clone(), record.location_id.clone());
        guard.insert(key, record);
        Ok(())
    }

    fn fetch(
        &self,
        chef_id: &str,
        location_id: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(&(chef_id.to_string(), location_id.to_string()))
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRequirements {
    documents: Arc<Mutex<HashMap<String, RequirementsDocument>>>,
}

impl RequirementsStore for MemoryRequirements {
    fn get(&self, location_id: &str) -> Result<Option<RequirementsDocument>, RepositoryError> {
        let guard = self.documents.lock().expect("store mutex poisoned");
        Ok(guard.get(location_id).cloned())
    }

    fn put(
        &self,
        location_id: &str,
        document: RequirementsDocument,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("store mutex poisoned");
        guard.insert(location_id.to_string(), document);
        Ok(())
    }
}

pub(super) fn build_service() -> (
    Arc<KitchenApplicationService<MemoryRepository, MemoryRequirements>>,
    MemoryRepository,
    MemoryRequirements,
) {
    let repository = MemoryRepository::default();
    let store = MemoryRequirements::default();
    let service = Arc::new(KitchenApplicationService::new(
        Arc::new(repository.clone()),
        Arc::new(store.clone()),
    ));
    (service, repository, store)
}

pub(super) fn minimal_submission(chef_id: &str) -> IntakeSubmission {
    IntakeSubmission {
        chef_id: chef_id.to_string(),
        profile: Some(profile()),
        tier: Some(1),
        values: minimal_values(),
        attachments: tier_one_attachments(),
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
