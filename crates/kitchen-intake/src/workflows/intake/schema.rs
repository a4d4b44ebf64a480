use std::collections::BTreeMap;

use super::domain::{FieldKey, FieldValue, FormValues};
use super::requirements::{CustomFieldSpec, FieldKind, FixedField, RequirementsDocument};

/// Validation rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Non-empty trimmed text (also used for select, date, and file-name
    /// slots).
    TextRequired,
    TextOptional,
    /// Text that must parse as a number.
    NumberRequired,
    NumberOptional,
    /// A plain checkbox that must be ticked.
    MustAccept,
    ToggleOptional,
    /// Multi-select checkbox with at least one selection.
    ManyRequired,
    ManyOptional,
}

impl ValueRule {
    const fn is_required(self) -> bool {
        matches!(
            self,
            ValueRule::TextRequired
                | ValueRule::NumberRequired
                | ValueRule::MustAccept
                | ValueRule::ManyRequired
        )
    }
}

/// A single field's rule plus its display label for error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub label: String,
    pub rule: ValueRule,
}

/// The derived validation schema for one (requirements, tier) combination.
///
/// Unsupported custom-field kinds produce no rule; they are recorded in
/// `unsupported` so the rendering layer can show an explicit placeholder
/// instead of silently dropping the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSchema {
    pub rules: BTreeMap<FieldKey, FieldRule>,
    pub unsupported: Vec<(String, String)>,
}

impl ValidationSchema {
    pub fn is_required(&self, key: &FieldKey) -> bool {
        self.rules
            .get(key)
            .map(|field| field.rule.is_required())
            .unwrap_or(false)
    }

    /// Validates one field against its rule. `None` means valid (or no rule
    /// bound to the key).
    pub fn validate_field(&self, key: &FieldKey, value: Option<&FieldValue>) -> Option<String> {
        let field = self.rules.get(key)?;
        check_value(field, value)
    }

    /// Full-form validation; errors are field-scoped and independent.
    pub fn validate(&self, values: &FormValues) -> BTreeMap<FieldKey, String> {
        let mut errors = BTreeMap::new();
        for (key, field) in &self.rules {
            if let Some(message) = check_value(field, values.get(key)) {
                errors.insert(key.clone(), message);
            }
        }
        errors
    }
}

fn check_value(field: &FieldRule, value: Option<&FieldValue>) -> Option<String> {
    let label = field.label.as_str();
    match field.rule {
        ValueRule::TextRequired => match value {
            Some(FieldValue::Text(text)) if !text.trim().is_empty() => None,
            _ => Some(format!("{label} is required")),
        },
        ValueRule::TextOptional => None,
        ValueRule::NumberRequired => match value.and_then(FieldValue::as_text) {
            Some(text) if !text.trim().is_empty() => parse_number_error(label, text),
            _ => Some(format!("{label} is required")),
        },
        ValueRule::NumberOptional => match value.and_then(FieldValue::as_text) {
            Some(text) if !text.trim().is_empty() => parse_number_error(label, text),
            _ => None,
        },
        ValueRule::MustAccept => match value {
            Some(FieldValue::Toggle(true)) => None,
            _ => Some(format!("{label} must be accepted")),
        },
        ValueRule::ToggleOptional => None,
        ValueRule::ManyRequired => match value {
            Some(FieldValue::Many(items)) if !items.is_empty() => None,
            _ => Some(format!("select at least one option for {label}")),
        },
        ValueRule::ManyOptional => None,
    }
}

fn parse_number_error(label: &str, text: &str) -> Option<String> {
    if text.trim().parse::<f64>().is_ok() {
        None
    } else {
        Some(format!("{label} must be a number"))
    }
}

/// Derives the validation schema from a requirements document and the current
/// tier. Pure; rebuild whenever either input changes.
///
/// Fixed-field requiredness: `tier < 2 && require_flag`. Tier 2 relaxes every
/// tier-1 fixed field to optional (already captured and approved), except the
/// food-establishment expiry, which follows its own flag regardless of tier.
pub fn build_schema(requirements: &RequirementsDocument, tier: u8) -> ValidationSchema {
    let mut schema = ValidationSchema::default();

    for field in FixedField::ALL {
        let required = if field == FixedField::FoodEstablishmentCertExpiry {
            requirements.required_for(field)
        } else {
            tier < 2 && requirements.required_for(field)
        };
        let rule = fixed_rule(field, required);
        schema.rules.insert(
            FieldKey::Fixed(field),
            FieldRule {
                label: field.key().to_string(),
                rule,
            },
        );
    }

    for spec in requirements.custom_fields_for(tier) {
        match custom_rule(spec) {
            Some(rule) => {
                schema.rules.insert(
                    FieldKey::custom(spec.id.clone()),
                    FieldRule {
                        label: spec.label.clone(),
                        rule,
                    },
                );
            }
            None => {
                if let FieldKind::Unsupported(raw) = &spec.kind {
                    schema.unsupported.push((spec.id.clone(), raw.clone()));
                }
            }
        }
    }

    schema
}

const fn fixed_rule(field: FixedField, required: bool) -> ValueRule {
    if field.is_agreement() {
        if required {
            ValueRule::MustAccept
        } else {
            ValueRule::ToggleOptional
        }
    } else if required {
        ValueRule::TextRequired
    } else {
        ValueRule::TextOptional
    }
}

fn custom_rule(spec: &CustomFieldSpec) -> Option<ValueRule> {
    let rule = match spec.kind {
        FieldKind::Text
        | FieldKind::Textarea
        | FieldKind::Select
        | FieldKind::Date
        | FieldKind::File => {
            if spec.required {
                ValueRule::TextRequired
            } else {
                ValueRule::TextOptional
            }
        }
        FieldKind::Number => {
            if spec.required {
                ValueRule::NumberRequired
            } else {
                ValueRule::NumberOptional
            }
        }
        FieldKind::CheckboxBool => {
            if spec.required {
                ValueRule::MustAccept
            } else {
                ValueRule::ToggleOptional
            }
        }
        FieldKind::CheckboxMulti => {
            if spec.required {
                ValueRule::ManyRequired
            } else {
                ValueRule::ManyOptional
            }
        }
        FieldKind::Unsupported(_) => return None,
    };
    Some(rule)
}
