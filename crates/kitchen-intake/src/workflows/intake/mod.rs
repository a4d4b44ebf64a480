//! Tiered application intake for commercial kitchens.
//!
//! The engine is requirement-driven: each location publishes a
//! [`RequirementsDocument`] declaring which fixed fields are mandatory and
//! which custom fields exist per tier. Everything downstream, from the
//! validation schema and default values to completion reporting and the
//! assembled multipart submission, derives from that document plus the applicant's current
//! tier, so the modules here are pure functions or thin state holders over
//! explicit inputs.

pub mod client;
pub mod defaults;
pub mod domain;
pub mod form;
pub mod repository;
pub mod requirements;
pub mod router;
pub mod schema;
pub mod service;
pub mod status;
pub mod submission;

#[cfg(test)]
mod tests;

pub use client::{HttpRequirementsSource, RequirementsSource, SubmitError};
pub use defaults::resolve_defaults;
pub use domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, BusinessInfo,
    DocumentApproval, FieldKey, FieldValue, FormValues, SubmittedDocument,
};
pub use form::{AttachedFile, AttachedFiles, AttachmentError, FormController, SectionCompletion};
pub use repository::{
    ApplicationRepository, ApplicationStatusView, RepositoryError, RequirementsStore,
};
pub use requirements::{
    CustomFieldSpec, FieldKind, FixedField, RequirementsDocument, Section, SpecError,
};
pub use router::intake_router;
pub use schema::{build_schema, FieldRule, ValidationSchema, ValueRule};
pub use service::{IntakeSubmission, KitchenApplicationService, ReviewAction, ServiceError};
pub use status::{present, StatusView};
pub use submission::{assemble, MultipartPayload, PartBody, PayloadPart, SubmissionError};
