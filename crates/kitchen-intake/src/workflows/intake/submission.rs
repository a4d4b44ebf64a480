use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde_json::{json, Map, Value};

use super::domain::{FieldKey, FieldValue, FormValues};
use super::form::{AttachedFile, AttachedFiles};
use super::requirements::{FieldKind, FixedField, RequirementsDocument};

/// Fixed preference tag sent with every application.
pub const KITCHEN_PREFERENCE: &str = "commercial-kitchen";

/// Certificates must be valid this far past the submission date.
const MIN_EXPIRY_MONTHS: u32 = 6;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One part of the assembled multipart request body.
#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    Text(String),
    Json(Value),
    File(AttachedFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayloadPart {
    pub name: String,
    pub body: PartBody,
}

/// The assembled submission: form fields and file uploads travel in a single
/// multipart request, so there is no upload-then-reference phase to
/// coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    pub parts: Vec<PayloadPart>,
}

impl MultipartPayload {
    fn push_text(&mut self, name: &str, value: impl Into<String>) {
        self.parts.push(PayloadPart {
            name: name.to_string(),
            body: PartBody::Text(value.into()),
        });
    }

    fn push_json(&mut self, name: &str, value: Value) {
        self.parts.push(PayloadPart {
            name: name.to_string(),
            body: PartBody::Json(value),
        });
    }

    fn push_file(&mut self, name: &str, file: AttachedFile) {
        self.parts.push(PayloadPart {
            name: name.to_string(),
            body: PartBody::File(file),
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|part| part.name == name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.body {
            PartBody::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn json(&self, name: &str) -> Option<&Value> {
        self.parts.iter().find_map(|part| match &part.body {
            PartBody::Json(value) if part.name == name => Some(value),
            _ => None,
        })
    }

    pub fn file(&self, name: &str) -> Option<&AttachedFile> {
        self.parts.iter().find_map(|part| match &part.body {
            PartBody::File(file) if part.name == name => Some(file),
            _ => None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(BTreeMap<FieldKey, String>),
    #[error("a {field} file is required before submitting")]
    MissingCertificate { field: &'static str },
    #[error("{field} must be valid until at least {earliest}")]
    ExpiryTooSoon {
        field: &'static str,
        earliest: NaiveDate,
    },
    #[error("{field} has unparseable date '{raw}'")]
    InvalidDate { field: &'static str, raw: String },
}

/// Assembles the multipart submission payload for one application.
///
/// Tier-1 gates run before any part is built: a required food-handler
/// certificate must be attached, and its expiry (when supplied) must be at
/// least six months past `today`. The exact six-month date passes and one day
/// short fails.
pub fn assemble(
    location_id: &str,
    values: &FormValues,
    tier: u8,
    requirements: &RequirementsDocument,
    attachments: &AttachedFiles,
    today: NaiveDate,
) -> Result<MultipartPayload, SubmissionError> {
    if tier < 2 {
        run_tier_one_gates(values, requirements, attachments, today)?;
    }

    let mut payload = MultipartPayload::default();
    payload.push_text("locationId", location_id);
    payload.push_text("fullName", full_name(values));
    payload.push_text("email", fixed_text(values, FixedField::Email));
    payload.push_text("phone", fixed_text(values, FixedField::Phone));
    payload.push_text("kitchenPreference", KITCHEN_PREFERENCE);
    payload.push_json("businessInfo", business_info_json(values));

    if tier < 2 {
        if let Some(file) = &attachments.food_handler {
            payload.push_text("foodSafetyLicense", "yes");
            let expiry = fixed_text(values, FixedField::FoodHandlerCertExpiry);
            if !expiry.is_empty() {
                payload.push_text("foodSafetyLicenseExpiry", expiry);
            }
            payload.push_file("foodHandlerCertificate", file.clone());
        }
    }

    // The establishment certificate can appear at either tier; the handler
    // certificate above is tier-1-gated. Intentional asymmetry.
    if requirements.require_food_establishment_cert || attachments.food_establishment.is_some() {
        let attached = attachments.food_establishment.is_some();
        payload.push_text(
            "foodEstablishmentCert",
            if attached { "yes" } else { "no" },
        );
        let expiry = fixed_text(values, FixedField::FoodEstablishmentCertExpiry);
        if !expiry.is_empty() {
            payload.push_text("foodEstablishmentCertExpiry", expiry);
        }
        if let Some(file) = &attachments.food_establishment {
            payload.push_file("foodEstablishmentCertificate", file.clone());
        }
    }

    if tier >= 2 {
        payload.push_json(
            "tierData",
            json!({
                "tier": tier,
                "submittedAt": today.format(DATE_FORMAT).to_string(),
            }),
        );
        payload.push_text("currentTier", tier.to_string());
        if let Some(file) = &attachments.insurance {
            payload.push_file("insuranceDocument", file.clone());
        }
    }

    let custom = custom_fields_json(values, tier, requirements, attachments);
    if !custom.is_empty() {
        payload.push_json("customFields", Value::Object(custom));
    }
    for spec in requirements.custom_fields_for(tier) {
        if spec.kind != FieldKind::File {
            continue;
        }
        if let Some(file) = attachments.custom.get(&spec.id) {
            payload.push_file(&format!("customFile_{}", spec.id), file.clone());
        }
    }

    Ok(payload)
}

fn run_tier_one_gates(
    values: &FormValues,
    requirements: &RequirementsDocument,
    attachments: &AttachedFiles,
    today: NaiveDate,
) -> Result<(), SubmissionError> {
    if requirements.require_food_handler_cert && attachments.food_handler.is_none() {
        return Err(SubmissionError::MissingCertificate {
            field: "food handler certificate",
        });
    }

    let raw_expiry = fixed_text(values, FixedField::FoodHandlerCertExpiry);
    if !raw_expiry.is_empty() {
        let expiry = NaiveDate::parse_from_str(raw_expiry, DATE_FORMAT).map_err(|_| {
            SubmissionError::InvalidDate {
                field: "food handler certificate expiry",
                raw: raw_expiry.to_string(),
            }
        })?;
        let earliest = today
            .checked_add_months(Months::new(MIN_EXPIRY_MONTHS))
            .unwrap_or(NaiveDate::MAX);
        if expiry < earliest {
            return Err(SubmissionError::ExpiryTooSoon {
                field: "food handler certificate expiry",
                earliest,
            });
        }
    }

    Ok(())
}

fn fixed_text(values: &FormValues, field: FixedField) -> &str {
    values
        .get(&FieldKey::Fixed(field))
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .unwrap_or("")
}

fn full_name(values: &FormValues) -> String {
    let first = fixed_text(values, FixedField::FirstName);
    let last = fixed_text(values, FixedField::LastName);
    let joined = format!("{first} {last}").trim().to_string();
    if joined.is_empty() {
        "N/A".to_string()
    } else {
        joined
    }
}

fn business_info_json(values: &FormValues) -> Value {
    let entry = |field: FixedField| -> Value {
        let text = fixed_text(values, field);
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    };
    json!({
        "businessName": entry(FixedField::BusinessName),
        "businessType": entry(FixedField::BusinessType),
        "experience": entry(FixedField::Experience),
        "description": entry(FixedField::Description),
        "usageFrequency": entry(FixedField::UsageFrequency),
        "sessionDuration": entry(FixedField::SessionDuration),
        "foodHandlerCertExpiry": entry(FixedField::FoodHandlerCertExpiry),
        "foodEstablishmentCertExpiry": entry(FixedField::FoodEstablishmentCertExpiry),
    })
}

/// Custom answers keyed by raw field id. Inclusion is asymmetric on purpose:
/// empty lists, unticked checkboxes, and empty strings are not persisted as
/// if they were explicit answers.
fn custom_fields_json(
    values: &FormValues,
    tier: u8,
    requirements: &RequirementsDocument,
    attachments: &AttachedFiles,
) -> Map<String, Value> {
    let mut object = Map::new();
    for spec in requirements.custom_fields_for(tier) {
        let key = FieldKey::custom(spec.id.clone());
        match &spec.kind {
            FieldKind::CheckboxMulti => {
                if let Some(items) = values.get(&key).and_then(FieldValue::as_many) {
                    if !items.is_empty() {
                        object.insert(
                            spec.id.clone(),
                            Value::Array(
                                items.iter().cloned().map(Value::String).collect(),
                            ),
                        );
                    }
                }
            }
            FieldKind::CheckboxBool => {
                if values.get(&key).and_then(FieldValue::as_toggle) == Some(true) {
                    object.insert(spec.id.clone(), Value::Bool(true));
                }
            }
            FieldKind::File => {
                // The JSON carries only the declared name; bytes travel in a
                // dedicated customFile_<id> part.
                let name = attachments
                    .custom
                    .get(&spec.id)
                    .map(|file| file.name.clone())
                    .or_else(|| {
                        values
                            .get(&key)
                            .and_then(FieldValue::as_text)
                            .map(str::trim)
                            .filter(|text| !text.is_empty())
                            .map(str::to_string)
                    });
                if let Some(name) = name {
                    object.insert(spec.id.clone(), Value::String(name));
                }
            }
            FieldKind::Unsupported(_) => {}
            _ => {
                let text = values
                    .get(&key)
                    .and_then(FieldValue::as_text)
                    .map(str::trim)
                    .unwrap_or("");
                if !text.is_empty() {
                    object.insert(spec.id.clone(), Value::String(text.to_string()));
                }
            }
        }
    }
    object
}
