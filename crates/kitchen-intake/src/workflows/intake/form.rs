use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::defaults::resolve_defaults;
use super::domain::{ApplicantProfile, ApplicationRecord, FieldKey, FieldValue, FormValues};
use super::requirements::{FixedField, RequirementsDocument, Section};
use super::schema::{build_schema, ValidationSchema};
use super::submission::{assemble, MultipartPayload, SubmissionError};

const MAX_CERT_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
const MAX_DOCUMENT_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const CERT_CONTENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];
const DOCUMENT_EXTRA_CONTENT_TYPES: [&str; 2] = [
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// A file staged for submission. `bytes` may be empty when only metadata is
/// known (server-side revalidation of a declared upload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bytes: Vec<u8>,
}

impl AttachedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    pub fn declared(
        name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes,
            bytes: Vec::new(),
        }
    }
}

/// Upload slots recognized by the submission assembler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachedFiles {
    pub food_handler: Option<AttachedFile>,
    pub food_establishment: Option<AttachedFile>,
    pub insurance: Option<AttachedFile>,
    pub custom: BTreeMap<String, AttachedFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("file '{name}' is {size_bytes} bytes, over the {limit_bytes} byte limit")]
    TooLarge {
        name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },
    #[error("file '{name}' has unsupported content type '{content_type}'")]
    UnsupportedType { name: String, content_type: String },
}

fn check_upload(
    file: &AttachedFile,
    limit_bytes: u64,
    allow_word_documents: bool,
) -> Result<(), AttachmentError> {
    if file.size_bytes > limit_bytes {
        return Err(AttachmentError::TooLarge {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            limit_bytes,
        });
    }

    let essence = file
        .content_type
        .parse::<mime::Mime>()
        .map(|parsed| parsed.essence_str().to_string())
        .unwrap_or_else(|_| file.content_type.clone());
    let allowed = CERT_CONTENT_TYPES.contains(&essence.as_str())
        || (allow_word_documents && DOCUMENT_EXTRA_CONTENT_TYPES.contains(&essence.as_str()));
    if !allowed {
        return Err(AttachmentError::UnsupportedType {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
        });
    }
    Ok(())
}

/// Completion percentage for one fixed section grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionCompletion {
    pub section: Section,
    pub percent: u8,
}

/// Owns the live form state for one applicant session.
///
/// Field values mutate only through [`FormController::set_value`]; a
/// requirements or tier change goes through
/// [`FormController::apply_requirements`], which rebuilds the schema, resets
/// values to freshly resolved defaults, and revalidates everything so a field
/// that became required is never silently ignored.
#[derive(Debug, Clone)]
pub struct FormController {
    requirements: RequirementsDocument,
    tier: u8,
    schema: ValidationSchema,
    values: FormValues,
    errors: BTreeMap<FieldKey, String>,
    attachments: AttachedFiles,
}

impl FormController {
    pub fn new(
        requirements: RequirementsDocument,
        tier: u8,
        profile: Option<&ApplicantProfile>,
        existing: Option<&ApplicationRecord>,
    ) -> Self {
        let schema = build_schema(&requirements, tier);
        let values = resolve_defaults(&requirements, tier, profile, existing);
        let errors = schema.validate(&values);
        Self {
            requirements,
            tier,
            schema,
            values,
            errors,
            attachments: AttachedFiles::default(),
        }
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn requirements(&self) -> &RequirementsDocument {
        &self.requirements
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<FieldKey, String> {
        &self.errors
    }

    pub fn attachments(&self) -> &AttachedFiles {
        &self.attachments
    }

    /// Replaces the requirements document and/or tier, resetting field values
    /// to the new defaults. Attachments survive the reset; only derived field
    /// state is discarded.
    pub fn apply_requirements(
        &mut self,
        requirements: RequirementsDocument,
        tier: u8,
        profile: Option<&ApplicantProfile>,
        existing: Option<&ApplicationRecord>,
    ) {
        self.schema = build_schema(&requirements, tier);
        self.values = resolve_defaults(&requirements, tier, profile, existing);
        self.errors = self.schema.validate(&self.values);
        self.requirements = requirements;
        self.tier = tier;
    }

    /// Field-level change handler; revalidates only the touched field.
    pub fn set_value(&mut self, key: FieldKey, value: FieldValue) {
        match self.schema.validate_field(&key, Some(&value)) {
            Some(message) => {
                self.errors.insert(key.clone(), message);
            }
            None => {
                self.errors.remove(&key);
            }
        }
        self.values.insert(key, value);
    }

    pub fn attach_food_handler(&mut self, file: AttachedFile) -> Result<(), AttachmentError> {
        check_upload(&file, MAX_CERT_UPLOAD_BYTES, false)?;
        self.attachments.food_handler = Some(file);
        Ok(())
    }

    pub fn attach_food_establishment(&mut self, file: AttachedFile) -> Result<(), AttachmentError> {
        check_upload(&file, MAX_CERT_UPLOAD_BYTES, false)?;
        self.attachments.food_establishment = Some(file);
        Ok(())
    }

    pub fn attach_insurance(&mut self, file: AttachedFile) -> Result<(), AttachmentError> {
        check_upload(&file, MAX_DOCUMENT_UPLOAD_BYTES, false)?;
        self.attachments.insurance = Some(file);
        Ok(())
    }

    pub fn attach_custom(
        &mut self,
        field_id: impl Into<String>,
        file: AttachedFile,
    ) -> Result<(), AttachmentError> {
        check_upload(&file, MAX_DOCUMENT_UPLOAD_BYTES, true)?;
        self.attachments.custom.insert(field_id.into(), file);
        Ok(())
    }

    /// Re-runs full-form validation and reports whether the form is clean.
    pub fn validate_all(&mut self) -> bool {
        self.errors = self.schema.validate(&self.values);
        self.errors.is_empty()
    }

    /// Per-section completion: the ratio of filled slots to the section's
    /// slot count, rounded to the nearest percent. The certification section
    /// counts attached files and expiry dates as independent slots.
    pub fn section_completion(&self) -> Vec<SectionCompletion> {
        Section::ALL
            .into_iter()
            .map(|section| {
                let (filled, total) = self.section_slots(section);
                SectionCompletion {
                    section,
                    percent: percent_of(filled, total),
                }
            })
            .collect()
    }

    /// Arithmetic mean of the section percentages, rounded.
    pub fn overall_completion(&self) -> u8 {
        let sections = self.section_completion();
        if sections.is_empty() {
            return 0;
        }
        let sum: u32 = sections.iter().map(|entry| entry.percent as u32).sum();
        ((sum as f64) / (sections.len() as f64)).round() as u8
    }

    fn section_slots(&self, section: Section) -> (usize, usize) {
        if section == Section::Certification {
            return self.certification_slots();
        }

        let mut filled = 0;
        let mut total = 0;
        for field in FixedField::ALL {
            if field.section() != section {
                continue;
            }
            total += 1;
            if self.field_filled(field) {
                filled += 1;
            }
        }
        (filled, total)
    }

    fn certification_slots(&self) -> (usize, usize) {
        let mut slots = vec![
            self.attachments.food_handler.is_some(),
            self.field_filled(FixedField::FoodHandlerCertExpiry),
        ];
        if self.requirements.require_food_establishment_cert
            || self.requirements.require_food_establishment_cert_expiry
        {
            slots.push(self.attachments.food_establishment.is_some());
            slots.push(self.field_filled(FixedField::FoodEstablishmentCertExpiry));
        }
        let filled = slots.iter().filter(|slot| **slot).count();
        (filled, slots.len())
    }

    fn field_filled(&self, field: FixedField) -> bool {
        self.values
            .get(&FieldKey::Fixed(field))
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    /// Validates, applies the pre-submission gates, and assembles the
    /// multipart payload. Field values are left untouched on failure so the
    /// applicant can correct and retry without re-entering data.
    pub fn submit(
        &mut self,
        location_id: &str,
        today: NaiveDate,
    ) -> Result<MultipartPayload, SubmissionError> {
        if !self.validate_all() {
            return Err(SubmissionError::Invalid(self.errors.clone()));
        }
        assemble(
            location_id,
            &self.values,
            self.tier,
            &self.requirements,
            &self.attachments,
            today,
        )
    }

    /// Custom-field ids that carry an unsupported kind, for placeholder
    /// rendering.
    pub fn unsupported_fields(&self) -> &[(String, String)] {
        &self.schema.unsupported
    }

    /// Plan of the custom fields to render for the active tier.
    pub fn custom_field_plan(&self) -> impl Iterator<Item = &super::requirements::CustomFieldSpec> {
        self.requirements.custom_fields_for(self.tier).iter()
    }
}

fn percent_of(filled: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((filled as f64 / total as f64) * 100.0).round() as u8
}
