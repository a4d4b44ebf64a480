use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed intake fields shared by every location.
///
/// The variants carry their canonical wire keys via [`FixedField::key`]; the
/// same keys index [`FormValues`](super::domain::FormValues).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixedField {
    FirstName,
    LastName,
    Email,
    Phone,
    BusinessName,
    BusinessType,
    Experience,
    Description,
    FoodHandlerCertExpiry,
    FoodEstablishmentCertExpiry,
    UsageFrequency,
    SessionDuration,
    TermsAgree,
    AccuracyAgree,
}

impl FixedField {
    pub const ALL: [FixedField; 14] = [
        FixedField::FirstName,
        FixedField::LastName,
        FixedField::Email,
        FixedField::Phone,
        FixedField::BusinessName,
        FixedField::BusinessType,
        FixedField::Experience,
        FixedField::Description,
        FixedField::FoodHandlerCertExpiry,
        FixedField::FoodEstablishmentCertExpiry,
        FixedField::UsageFrequency,
        FixedField::SessionDuration,
        FixedField::TermsAgree,
        FixedField::AccuracyAgree,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            FixedField::FirstName => "firstName",
            FixedField::LastName => "lastName",
            FixedField::Email => "email",
            FixedField::Phone => "phone",
            FixedField::BusinessName => "businessName",
            FixedField::BusinessType => "businessType",
            FixedField::Experience => "experience",
            FixedField::Description => "description",
            FixedField::FoodHandlerCertExpiry => "foodHandlerCertExpiry",
            FixedField::FoodEstablishmentCertExpiry => "foodEstablishmentCertExpiry",
            FixedField::UsageFrequency => "usageFrequency",
            FixedField::SessionDuration => "sessionDuration",
            FixedField::TermsAgree => "termsAgree",
            FixedField::AccuracyAgree => "accuracyAgree",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Agreement toggles validate as must-accept; everything else is text.
    pub const fn is_agreement(self) -> bool {
        matches!(self, FixedField::TermsAgree | FixedField::AccuracyAgree)
    }

    /// Section grouping used for completion reporting.
    pub const fn section(self) -> Section {
        match self {
            FixedField::FirstName | FixedField::LastName | FixedField::Email | FixedField::Phone => {
                Section::Identity
            }
            FixedField::BusinessName
            | FixedField::BusinessType
            | FixedField::Experience
            | FixedField::Description => Section::BusinessProfile,
            FixedField::FoodHandlerCertExpiry | FixedField::FoodEstablishmentCertExpiry => {
                Section::Certification
            }
            FixedField::UsageFrequency | FixedField::SessionDuration => Section::Usage,
            FixedField::TermsAgree | FixedField::AccuracyAgree => Section::Agreements,
        }
    }
}

/// Fixed section groupings for completion percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Identity,
    BusinessProfile,
    Certification,
    Usage,
    Agreements,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Identity,
        Section::BusinessProfile,
        Section::Certification,
        Section::Usage,
        Section::Agreements,
    ];
}

/// Kind tag for a location-defined custom field.
///
/// The wire format uses a plain string; `checkbox` resolves to boolean or
/// multi-select depending on whether the field carries options. Unknown tags
/// survive as [`FieldKind::Unsupported`] so they can be rendered as an
/// explicit placeholder instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Select,
    CheckboxBool,
    CheckboxMulti,
    Date,
    File,
    Unsupported(String),
}

impl FieldKind {
    pub fn wire_tag(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Number => "number",
            FieldKind::Select => "select",
            FieldKind::CheckboxBool | FieldKind::CheckboxMulti => "checkbox",
            FieldKind::Date => "date",
            FieldKind::File => "file",
            FieldKind::Unsupported(raw) => raw.as_str(),
        }
    }

    fn from_wire(tag: &str, has_options: bool) -> Self {
        match tag {
            "text" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "number" => FieldKind::Number,
            "select" => FieldKind::Select,
            "checkbox" if has_options => FieldKind::CheckboxMulti,
            "checkbox" => FieldKind::CheckboxBool,
            "date" => FieldKind::Date,
            "file" => FieldKind::File,
            other => FieldKind::Unsupported(other.to_string()),
        }
    }
}

/// A location-defined form field, rendered and validated by kind tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldSpec {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCustomFieldSpec {
    id: String,
    label: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(default)]
    options: Vec<String>,
}

impl Serialize for CustomFieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawCustomFieldSpec {
            id: self.id.clone(),
            label: self.label.clone(),
            kind: self.kind.wire_tag().to_string(),
            required: self.required,
            placeholder: self.placeholder.clone(),
            options: self.options.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CustomFieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCustomFieldSpec::deserialize(deserializer)?;
        if raw.id.trim().is_empty() {
            return Err(D::Error::custom("custom field id must not be empty"));
        }
        let kind = FieldKind::from_wire(&raw.kind, !raw.options.is_empty());
        Ok(CustomFieldSpec {
            id: raw.id,
            label: raw.label,
            kind,
            required: raw.required,
            placeholder: raw.placeholder,
            options: raw.options,
        })
    }
}

impl CustomFieldSpec {
    /// Checks the structural invariant: option-driven kinds carry options.
    pub fn check(&self) -> Result<(), SpecError> {
        match self.kind {
            FieldKind::Select | FieldKind::CheckboxMulti if self.options.is_empty() => {
                Err(SpecError::MissingOptions {
                    field_id: self.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Structural problems in a configured requirements document.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("custom field '{field_id}' needs at least one option")]
    MissingOptions { field_id: String },
    #[error("duplicate custom field id '{field_id}' within a tier")]
    DuplicateId { field_id: String },
}

/// Per-location intake configuration, fetched once per location and treated
/// as immutable for the life of a form session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequirementsDocument {
    pub require_first_name: bool,
    pub require_last_name: bool,
    pub require_email: bool,
    pub require_phone: bool,
    pub require_business_name: bool,
    pub require_business_type: bool,
    pub require_experience: bool,
    pub require_description: bool,
    pub require_food_handler_cert: bool,
    pub require_food_handler_cert_expiry: bool,
    pub require_food_establishment_cert: bool,
    pub require_food_establishment_cert_expiry: bool,
    pub require_usage_frequency: bool,
    pub require_session_duration: bool,
    pub require_terms_agree: bool,
    pub require_accuracy_agree: bool,
    pub tier_one_fields: Vec<CustomFieldSpec>,
    pub tier_two_fields: Vec<CustomFieldSpec>,
}

impl RequirementsDocument {
    /// Conservative fallback when no configuration could be fetched: every
    /// fixed field is required and no custom fields exist.
    pub fn fallback() -> Self {
        Self {
            require_first_name: true,
            require_last_name: true,
            require_email: true,
            require_phone: true,
            require_business_name: true,
            require_business_type: true,
            require_experience: true,
            require_description: true,
            require_food_handler_cert: true,
            require_food_handler_cert_expiry: true,
            require_food_establishment_cert: true,
            require_food_establishment_cert_expiry: true,
            require_usage_frequency: true,
            require_session_duration: true,
            require_terms_agree: true,
            require_accuracy_agree: true,
            tier_one_fields: Vec::new(),
            tier_two_fields: Vec::new(),
        }
    }

    pub fn required_for(&self, field: FixedField) -> bool {
        match field {
            FixedField::FirstName => self.require_first_name,
            FixedField::LastName => self.require_last_name,
            FixedField::Email => self.require_email,
            FixedField::Phone => self.require_phone,
            FixedField::BusinessName => self.require_business_name,
            FixedField::BusinessType => self.require_business_type,
            FixedField::Experience => self.require_experience,
            FixedField::Description => self.require_description,
            FixedField::FoodHandlerCertExpiry => self.require_food_handler_cert_expiry,
            FixedField::FoodEstablishmentCertExpiry => self.require_food_establishment_cert_expiry,
            FixedField::UsageFrequency => self.require_usage_frequency,
            FixedField::SessionDuration => self.require_session_duration,
            FixedField::TermsAgree => self.require_terms_agree,
            FixedField::AccuracyAgree => self.require_accuracy_agree,
        }
    }

    /// Custom-field sequence for a tier. Tier selection is strictly scoped:
    /// tier 1 reads `tierOneFields`, anything past it reads `tierTwoFields`.
    pub fn custom_fields_for(&self, tier: u8) -> &[CustomFieldSpec] {
        if tier < 2 {
            &self.tier_one_fields
        } else {
            &self.tier_two_fields
        }
    }

    /// Validates both tier sequences for configuration-time acceptance.
    pub fn check(&self) -> Result<(), SpecError> {
        for sequence in [&self.tier_one_fields, &self.tier_two_fields] {
            let mut seen = std::collections::BTreeSet::new();
            for spec in sequence {
                spec.check()?;
                if !seen.insert(spec.id.as_str()) {
                    return Err(SpecError::DuplicateId {
                        field_id: spec.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
