use chrono::NaiveDate;
use kitchen_intake::workflows::intake::{
    ApplicationRecord, ApplicationRepository, CustomFieldSpec, FieldKind, RepositoryError,
    RequirementsDocument, RequirementsStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<(String, String), ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        if guard.contains_key(&key) {
            guard.insert(key, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
pub(crate) struct InMemoryRequirementsStore {
    documents: Arc<Mutex<HashMap<String, RequirementsDocument>>>,
}

impl RequirementsStore for InMemoryRequirementsStore {
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

/// Requirements used when the process starts without a configured location,
/// mirroring a typical commissary kitchen setup.
pub(crate) fn demo_requirements() -> RequirementsDocument {
    RequirementsDocument {
        require_first_name: true,
        require_last_name: true,
        require_email: true,
        require_phone: true,
        require_business_name: true,
        require_food_handler_cert: true,
        require_food_handler_cert_expiry: true,
        require_usage_frequency: true,
        require_terms_agree: true,
        require_accuracy_agree: true,
        tier_one_fields: vec![
            CustomFieldSpec {
                id: "cuisine".to_string(),
                label: "Primary cuisine".to_string(),
                kind: FieldKind::Select,
                required: true,
                placeholder: None,
                options: vec![
                    "american".to_string(),
                    "mexican".to_string(),
                    "korean".to_string(),
                    "other".to_string(),
                ],
            },
            CustomFieldSpec {
                id: "allergen_protocols".to_string(),
                label: "Allergens handled".to_string(),
                kind: FieldKind::CheckboxMulti,
                required: false,
                placeholder: None,
                options: vec![
                    "nuts".to_string(),
                    "dairy".to_string(),
                    "shellfish".to_string(),
                ],
            },
        ],
        tier_two_fields: vec![CustomFieldSpec {
            id: "insurance_provider".to_string(),
            label: "Liability insurance provider".to_string(),
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("Provider name".to_string()),
            options: Vec::new(),
        }],
        ..RequirementsDocument::default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
