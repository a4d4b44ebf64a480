use super::domain::{
    ApplicantProfile, ApplicationRecord, BusinessInfo, FieldKey, FieldValue, FormValues,
};
use super::requirements::{FieldKind, FixedField, RequirementsDocument};

/// Resolves initial form values for a (requirements, tier) combination.
///
/// Precedence per field, highest first: the stored application value (the
/// business-info blob parses leniently; a malformed blob degrades to "no
/// prior data"), then the authenticated profile, then a type-appropriate
/// empty. Pure given its inputs, so it can be re-run synchronously whenever
/// requirements, tier, or the existing application change.
pub fn resolve_defaults(
    requirements: &RequirementsDocument,
    tier: u8,
    profile: Option<&ApplicantProfile>,
    existing: Option<&ApplicationRecord>,
) -> FormValues {
    let business = existing
        .map(|record| BusinessInfo::parse_blob(&record.business_info))
        .unwrap_or_default();

    let mut values = FormValues::new();
    for field in FixedField::ALL {
        let value = fixed_default(field, profile, existing, &business);
        values.insert(FieldKey::Fixed(field), value);
    }

    let stored = existing.and_then(|record| record.responses_for(tier));
    for spec in requirements.custom_fields_for(tier) {
        let key = FieldKey::custom(spec.id.clone());
        let value = stored
            .and_then(|answers| answers.get(&spec.id))
            .filter(|value| matches_kind(value, &spec.kind))
            .cloned()
            .unwrap_or_else(|| empty_for(&spec.kind));
        values.insert(key, value);
    }

    values
}

fn fixed_default(
    field: FixedField,
    profile: Option<&ApplicantProfile>,
    existing: Option<&ApplicationRecord>,
    business: &BusinessInfo,
) -> FieldValue {
    if field.is_agreement() {
        // Agreements are re-confirmed on every submission.
        return FieldValue::Toggle(false);
    }

    let stored = existing.and_then(|record| match field {
        FixedField::FirstName => non_empty(&record.first_name),
        FixedField::LastName => non_empty(&record.last_name),
        FixedField::Email => non_empty(&record.email),
        FixedField::Phone => non_empty(&record.phone),
        FixedField::BusinessName => business.business_name.clone(),
        FixedField::BusinessType => business.business_type.clone(),
        FixedField::Experience => business.experience.clone(),
        FixedField::Description => business.description.clone(),
        FixedField::UsageFrequency => business.usage_frequency.clone(),
        FixedField::SessionDuration => business.session_duration.clone(),
        FixedField::FoodHandlerCertExpiry => business.food_handler_cert_expiry.clone(),
        FixedField::FoodEstablishmentCertExpiry => business.food_establishment_cert_expiry.clone(),
        FixedField::TermsAgree | FixedField::AccuracyAgree => None,
    });
    if let Some(value) = stored {
        return FieldValue::Text(value);
    }

    if let Some(profile) = profile {
        let (first, last) = profile.split_name();
        let seeded = match field {
            FixedField::FirstName => non_empty(first),
            FixedField::LastName => non_empty(last),
            FixedField::Email => non_empty(&profile.email),
            FixedField::Phone => profile.phone.as_deref().and_then(non_empty),
            _ => None,
        };
        if let Some(value) = seeded {
            return FieldValue::Text(value);
        }
    }

    FieldValue::empty_text()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn matches_kind(value: &FieldValue, kind: &FieldKind) -> bool {
    match kind {
        FieldKind::CheckboxBool => matches!(value, FieldValue::Toggle(_)),
        FieldKind::CheckboxMulti => matches!(value, FieldValue::Many(_)),
        FieldKind::Unsupported(_) => false,
        _ => matches!(value, FieldValue::Text(_)),
    }
}

fn empty_for(kind: &FieldKind) -> FieldValue {
    match kind {
        FieldKind::CheckboxBool => FieldValue::Toggle(false),
        FieldKind::CheckboxMulti => FieldValue::Many(Vec::new()),
        _ => FieldValue::empty_text(),
    }
}
