use crate::infra::{demo_requirements, InMemoryApplicationRepository, InMemoryRequirementsStore};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use kitchen_intake::error::AppError;
use kitchen_intake::workflows::intake::{
    ApplicantProfile, AttachedFile, AttachedFiles, FieldKey, FieldValue, FixedField,
    FormController, FormValues, IntakeSubmission, KitchenApplicationService, ReviewAction,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Location the scenario applies to
    #[arg(long, default_value = "loc-demo")]
    pub(crate) location: String,
    /// Chef identifier used for the scenario
    #[arg(long, default_value = "chef-demo")]
    pub(crate) chef: String,
    /// Override the scenario date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Stop after the tier 1 approval instead of completing tier 2
    #[arg(long)]
    pub(crate) skip_tier_two: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        location,
        chef,
        today,
        skip_tier_two,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let now = Utc.from_utc_datetime(&today.and_hms_opt(9, 0, 0).unwrap_or_default());

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let requirements = Arc::new(InMemoryRequirementsStore::default());
    let service = Arc::new(KitchenApplicationService::new(repository, requirements));
    service.configure_requirements(&location, demo_requirements())?;

    println!("Kitchen intake demo ({location}, evaluated {today})");

    let profile = ApplicantProfile {
        full_name: "Priya Raman".to_string(),
        email: "priya@spicetrail.test".to_string(),
        phone: Some("515-555-0190".to_string()),
    };
    let document = service.requirements_for(&location)?;
    let mut form = FormController::new(document, 1, Some(&profile), None);

    println!("\nForm session (tier 1)");
    println!("- Profile seeded: {}% complete", form.overall_completion());

    for (key, value) in tier_one_values(today) {
        form.set_value(key, value);
    }
    if let Err(err) = form.attach_food_handler(handler_certificate()) {
        println!("- Upload rejected: {err}");
        return Ok(());
    }
    println!("- Fields filled: {}% complete", form.overall_completion());
    for entry in form.section_completion() {
        println!("  - {:?}: {}%", entry.section, entry.percent);
    }

    println!("\nTier 1 submission");
    let submission = IntakeSubmission {
        chef_id: chef.clone(),
        profile: Some(profile.clone()),
        tier: Some(1),
        values: tier_one_values(today),
        attachments: AttachedFiles {
            food_handler: Some(handler_certificate()),
            ..AttachedFiles::default()
        },
    };
    let record = match service.submit(&location, submission, now) {
        Ok(record) => record,
        Err(err) => {
            println!("- Submission rejected: {err}");
            return Ok(());
        }
    };
    println!("- Accepted as {} (tier {})", record.id.0, record.current_tier);
    print_status(&service, &chef, &location)?;

    println!("\nManager approves tier 1");
    service.review(&chef, &location, ReviewAction::Approve, now)?;
    print_status(&service, &chef, &location)?;

    if skip_tier_two {
        return Ok(());
    }

    println!("\nTier 2 submission");
    let mut values = tier_one_values(today);
    values.insert(
        FieldKey::custom("insurance_provider"),
        FieldValue::text("Hawkeye Mutual"),
    );
    let submission = IntakeSubmission {
        chef_id: chef.clone(),
        profile: Some(profile),
        tier: Some(2),
        values,
        attachments: AttachedFiles {
            insurance: Some(AttachedFile::from_bytes(
                "liability-policy.pdf",
                "application/pdf",
                pdf_bytes(),
            )),
            ..AttachedFiles::default()
        },
    };
    match service.submit(&location, submission, now) {
        Ok(record) => println!(
            "- Accepted as {} (tier {})",
            record.id.0, record.current_tier
        ),
        Err(err) => {
            println!("- Submission rejected: {err}");
            return Ok(());
        }
    }

    println!("\nManager approves tier 2");
    service.review(&chef, &location, ReviewAction::Approve, now)?;
    print_status(&service, &chef, &location)?;

    Ok(())
}

fn print_status(
    service: &KitchenApplicationService<InMemoryApplicationRepository, InMemoryRequirementsStore>,
    chef: &str,
    location: &str,
) -> Result<(), AppError> {
    let view = service.status(chef, location)?;
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("- Status payload:\n{json}"),
        Err(err) => println!("- Status payload unavailable: {err}"),
    }
    Ok(())
}

fn tier_one_values(today: NaiveDate) -> FormValues {
    let expiry = today
        .checked_add_months(chrono::Months::new(12))
        .unwrap_or(today);
    let mut values = FormValues::new();
    let mut text = |field: FixedField, value: String| {
        values.insert(FieldKey::Fixed(field), FieldValue::Text(value));
    };
    text(FixedField::FirstName, "Priya".to_string());
    text(FixedField::LastName, "Raman".to_string());
    text(FixedField::Email, "priya@spicetrail.test".to_string());
    text(FixedField::Phone, "515-555-0190".to_string());
    text(FixedField::BusinessName, "Spice Trail Meals".to_string());
    text(FixedField::UsageFrequency, "weekly".to_string());
    text(
        FixedField::FoodHandlerCertExpiry,
        expiry.format("%Y-%m-%d").to_string(),
    );
    values.insert(
        FieldKey::Fixed(FixedField::TermsAgree),
        FieldValue::Toggle(true),
    );
    values.insert(
        FieldKey::Fixed(FixedField::AccuracyAgree),
        FieldValue::Toggle(true),
    );
    values.insert(FieldKey::custom("cuisine"), FieldValue::text("korean"));
    values.insert(
        FieldKey::custom("allergen_protocols"),
        FieldValue::Many(vec!["nuts".to_string()]),
    );
    values
}

fn handler_certificate() -> AttachedFile {
    AttachedFile::from_bytes("handler-cert.pdf", "application/pdf", pdf_bytes())
}

fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4 demo".to_vec()
}
