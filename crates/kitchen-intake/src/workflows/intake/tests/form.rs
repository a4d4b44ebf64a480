use super::common::*;
use crate::workflows::intake::domain::{ApplicationStatus, FieldKey, FieldValue};
use crate::workflows::intake::form::{AttachedFile, AttachmentError, FormController};
use crate::workflows::intake::requirements::{FixedField, RequirementsDocument, Section};
use crate::workflows::intake::submission::SubmissionError;

fn controller() -> FormController {
    FormController::new(requirements(), 1, Some(&profile()), None)
}

#[test]
fn new_controller_validates_resolved_defaults() {
    let form = controller();
    // Profile seeds identity fields, so only the rest of the required set is
    // flagged.
    assert!(!form.errors().contains_key(&FieldKey::Fixed(FixedField::FirstName)));
    assert!(form.errors().contains_key(&FieldKey::Fixed(FixedField::BusinessName)));
    assert!(form.errors().contains_key(&FieldKey::Fixed(FixedField::TermsAgree)));
}

#[test]
fn set_value_revalidates_only_the_touched_field() {
    let mut form = controller();
    let business_error_before = form
        .errors()
        .get(&FieldKey::Fixed(FixedField::BusinessName))
        .cloned();

    form.set_value(
        FieldKey::Fixed(FixedField::TermsAgree),
        FieldValue::Toggle(true),
    );

    assert!(!form.errors().contains_key(&FieldKey::Fixed(FixedField::TermsAgree)));
    assert_eq!(
        form.errors()
            .get(&FieldKey::Fixed(FixedField::BusinessName))
            .cloned(),
        business_error_before,
        "unrelated errors must be untouched"
    );
}

#[test]
fn requirements_change_resets_values_and_revalidates() {
    let mut form = controller();
    form.set_value(
        FieldKey::Fixed(FixedField::BusinessName),
        FieldValue::text("Ortiz Catering"),
    );

    let mut stricter = requirements();
    stricter.require_description = true;
    form.apply_requirements(stricter, 1, Some(&profile()), None);

    // The edit was discarded along with the rest of the live values.
    assert_eq!(
        form.values().get(&FieldKey::Fixed(FixedField::BusinessName)),
        Some(&FieldValue::empty_text())
    );
    // The newly required field is flagged immediately, not silently ignored.
    assert!(form
        .errors()
        .contains_key(&FieldKey::Fixed(FixedField::Description)));
}

#[test]
fn attachments_survive_a_requirements_reset() {
    let mut form = controller();
    form.attach_food_handler(pdf_file("cert.pdf"))
        .expect("pdf accepted");

    form.apply_requirements(requirements(), 2, Some(&profile()), None);

    assert!(form.attachments().food_handler.is_some());
}

#[test]
fn oversized_and_foreign_uploads_are_rejected() {
    let mut form = controller();

    let oversized = AttachedFile::declared("huge.pdf", "application/pdf", 6 * 1024 * 1024);
    assert!(matches!(
        form.attach_food_handler(oversized),
        Err(AttachmentError::TooLarge { .. })
    ));

    let spreadsheet = AttachedFile::declared("sheet.xlsx", "application/vnd.ms-excel", 1024);
    assert!(matches!(
        form.attach_food_handler(spreadsheet),
        Err(AttachmentError::UnsupportedType { .. })
    ));

    // Word documents are allowed for generic custom file fields only.
    let word = AttachedFile::declared("menu.docx", DOCX_MIME, 1024);
    assert!(matches!(
        form.attach_food_establishment(word.clone()),
        Err(AttachmentError::UnsupportedType { .. })
    ));
    assert!(form.attach_custom("menu", word).is_ok());
}

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[test]
fn completion_percentages_round_per_section() {
    let mut form = FormController::new(minimal_requirements(), 1, None, None);
    form.set_value(
        FieldKey::Fixed(FixedField::FirstName),
        FieldValue::text("Maria"),
    );

    let sections = form.section_completion();
    let identity = sections
        .iter()
        .find(|entry| entry.section == Section::Identity)
        .expect("identity section");
    // One of four identity slots filled.
    assert_eq!(identity.percent, 25);

    let certification = sections
        .iter()
        .find(|entry| entry.section == Section::Certification)
        .expect("certification section");
    assert_eq!(certification.percent, 0);
}

#[test]
fn certification_counts_file_and_expiry_as_independent_slots() {
    let mut form = FormController::new(minimal_requirements(), 1, None, None);
    form.attach_food_handler(pdf_file("cert.pdf"))
        .expect("pdf accepted");

    let certification = form
        .section_completion()
        .into_iter()
        .find(|entry| entry.section == Section::Certification)
        .expect("certification section");
    assert_eq!(certification.percent, 50);

    form.set_value(
        FieldKey::Fixed(FixedField::FoodHandlerCertExpiry),
        FieldValue::text("2026-12-01"),
    );
    let certification = form
        .section_completion()
        .into_iter()
        .find(|entry| entry.section == Section::Certification)
        .expect("certification section");
    assert_eq!(certification.percent, 100);
}

#[test]
fn overall_completion_is_the_rounded_mean_of_sections() {
    let form = FormController::new(minimal_requirements(), 1, None, None);
    assert_eq!(form.overall_completion(), 0);

    let mut filled = FormController::new(minimal_requirements(), 1, None, None);
    for (key, value) in minimal_values() {
        filled.set_value(key, value);
    }
    filled
        .attach_food_handler(pdf_file("cert.pdf"))
        .expect("pdf accepted");

    let sections = filled.section_completion();
    let mean = sections.iter().map(|entry| entry.percent as u32).sum::<u32>() as f64
        / sections.len() as f64;
    assert_eq!(filled.overall_completion(), mean.round() as u8);
}

#[test]
fn submit_blocks_while_fields_are_invalid_and_preserves_values() {
    let mut form = controller();
    form.set_value(
        FieldKey::Fixed(FixedField::BusinessName),
        FieldValue::text("Ortiz Catering"),
    );

    let error = form
        .submit("loc-des-moines", today())
        .expect_err("incomplete form must not assemble");
    assert!(matches!(error, SubmissionError::Invalid(_)));
    assert_eq!(
        form.values().get(&FieldKey::Fixed(FixedField::BusinessName)),
        Some(&FieldValue::text("Ortiz Catering"))
    );
}

#[test]
fn unsupported_custom_fields_are_reported_for_placeholder_rendering() {
    let mut document = RequirementsDocument::default();
    document.tier_one_fields = vec![custom_field(
        "signature",
        crate::workflows::intake::requirements::FieldKind::Unsupported("signature-pad".into()),
        false,
    )];
    let form = FormController::new(document, 1, None, None);
    assert_eq!(
        form.unsupported_fields(),
        &[("signature".to_string(), "signature-pad".to_string())]
    );
}

#[test]
fn tier_reported_by_presenter_drives_controller_construction() {
    let record = record(ApplicationStatus::Approved, 1);
    let tier = record.effective_tier();
    assert_eq!(tier, 2);

    let form = FormController::new(requirements(), tier, Some(&profile()), Some(&record));
    assert!(form
        .values()
        .contains_key(&FieldKey::custom("insurance_provider")));
    assert!(!form.values().contains_key(&FieldKey::custom("allergens")));
}
