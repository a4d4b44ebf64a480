use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::requirements::FixedField;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// High level status tracked for a (chef, location) application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    InReview,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }
}

/// Per-document approval state for previously uploaded certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentApproval {
    Pending,
    Approved,
    Rejected,
}

/// A durable reference to an uploaded document plus its review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedDocument {
    pub name: String,
    pub url: String,
    pub approval: DocumentApproval,
}

/// Live form value for a single field.
///
/// Inputs arrive as strings (dates and numbers included; numeric parsing
/// happens at validation time), toggles as booleans, and multi-select
/// checkboxes as string lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Toggle(bool),
    Text(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub const fn empty_text() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Toggle(accepted) => !accepted,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Many(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            FieldValue::Toggle(accepted) => Some(*accepted),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[String]> {
        match self {
            FieldValue::Many(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Canonical key for a form field: a fixed field or a `custom_<id>` slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Fixed(FixedField),
    Custom(String),
}

impl FieldKey {
    pub fn custom(id: impl Into<String>) -> Self {
        FieldKey::Custom(id.into())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Fixed(field) => f.write_str(field.key()),
            FieldKey::Custom(id) => write!(f, "custom_{id}"),
        }
    }
}

/// Unknown keys are rejected rather than mapped to a catch-all, so typos in
/// client payloads surface as errors.
#[derive(Debug, thiserror::Error)]
#[error("unknown form field key '{0}'")]
pub struct UnknownFieldKey(pub String);

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(id) = raw.strip_prefix("custom_") {
            if id.is_empty() {
                return Err(UnknownFieldKey(raw.to_string()));
            }
            return Ok(FieldKey::Custom(id.to_string()));
        }
        FixedField::from_key(raw)
            .map(FieldKey::Fixed)
            .ok_or_else(|| UnknownFieldKey(raw.to_string()))
    }
}

/// The live, editable superset of all fields across both tiers.
pub type FormValues = BTreeMap<FieldKey, FieldValue>;

/// Authenticated-user profile used for default seeding only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ApplicantProfile {
    /// Splits the display name at the first whitespace boundary; the
    /// remainder, trimmed, becomes the last name.
    pub fn split_name(&self) -> (&str, &str) {
        match self.full_name.trim().split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest.trim_start()),
            None => (self.full_name.trim(), ""),
        }
    }
}

/// Business-profile answers historically serialized as one JSON string field
/// on the stored application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub experience: Option<String>,
    pub description: Option<String>,
    pub usage_frequency: Option<String>,
    pub session_duration: Option<String>,
    pub food_handler_cert_expiry: Option<String>,
    pub food_establishment_cert_expiry: Option<String>,
}

impl BusinessInfo {
    /// Lenient parse of the stored blob. A malformed blob is logged and
    /// treated as "no prior data" so default resolution keeps going.
    pub fn parse_blob(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(blob) {
            Ok(info) => info,
            Err(error) => {
                warn!(%error, "malformed business info blob, ignoring stored answers");
                Self::default()
            }
        }
    }
}

/// The persisted application for a (chef, location) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub chef_id: String,
    pub location_id: String,
    pub status: ApplicationStatus,
    pub current_tier: u8,
    pub tier_one_completed_at: Option<DateTime<Utc>>,
    pub tier_two_completed_at: Option<DateTime<Utc>>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Historical single-string JSON blob; see [`BusinessInfo::parse_blob`].
    pub business_info: String,
    pub documents: Vec<SubmittedDocument>,
    /// Submitted custom-field answers keyed by tier, then by raw field id.
    pub tier_responses: BTreeMap<u8, BTreeMap<String, FieldValue>>,
}

impl ApplicationRecord {
    /// Tier used for UI field-set selection. One ahead of the persisted tier
    /// immediately after an approval, so the applicant can begin the next
    /// tier's intake before the backend formally advances the stored tier.
    pub fn effective_tier(&self) -> u8 {
        if self.status == ApplicationStatus::Approved && self.current_tier < 2 {
            self.current_tier + 1
        } else {
            self.current_tier
        }
    }

    pub fn responses_for(&self, tier: u8) -> Option<&BTreeMap<String, FieldValue>> {
        self.tier_responses.get(&tier)
    }
}
