use std::sync::LazyLock;

use regex::Regex;

use crate::client::SubmitError;
use crate::models::{ApplicantRecord, CvFile, Field, StatusMessage, SubmissionStatus, ValidationErrors};

pub const SUCCESS_MESSAGE: &str = "Application submitted successfully! We will get back to you soon.";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Checks every required field of the record. Optional URLs are never checked.
pub fn validate(record: &ApplicantRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let required = |errors: &mut ValidationErrors, field: Field| {
        errors.insert(field, format!("{} is required", field.name()));
    };

    if record.full_name.is_empty() {
        required(&mut errors, Field::FullName);
    }
    if record.email.is_empty() {
        required(&mut errors, Field::Email);
    } else if !EMAIL_PATTERN.is_match(&record.email) {
        errors.insert(Field::Email, format!("{} is invalid", Field::Email.name()));
    }
    if record.date_of_birth.is_empty() {
        required(&mut errors, Field::DateOfBirth);
    }
    if record.whatsapp_number.is_empty() {
        required(&mut errors, Field::WhatsappNumber);
    }
    if record.job_position.is_empty() {
        required(&mut errors, Field::JobPosition);
    }
    if record.cv.is_none() {
        required(&mut errors, Field::Cv);
    }
    errors
}

/// Result of asking the controller to start a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStart {
    /// A submission is already in flight; nothing happened.
    Busy,
    /// Validation failed; the field is the first invalid one in form order.
    Invalid(Field),
    /// Snapshot of the record to hand to the submitter.
    Ready(ApplicantRecord),
}

#[derive(Debug, Default)]
pub struct FormController {
    record: ApplicantRecord,
    errors: ValidationErrors,
    submitting: bool,
    status: SubmissionStatus,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &ApplicantRecord {
        &self.record
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn on_field_change(&mut self, field: Field, value: String) {
        if !self.record.set_text(field, value) {
            return;
        }
        self.errors.clear_field(field);
    }

    /// A cancelled pick (`None`) leaves the current CV and errors alone.
    pub fn on_file_change(&mut self, file: Option<CvFile>) {
        let Some(file) = file else { return };
        tracing::debug!(file = %file.path.display(), size = file.size, "cv picked");
        self.record.cv = Some(file);
        self.errors.clear_field(Field::Cv);
    }

    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.submitting {
            return SubmitStart::Busy;
        }

        self.errors = validate(&self.record);
        if let Some(first) = self.errors.first() {
            tracing::debug!(invalid = self.errors.len(), first = %first, "validation failed");
            return SubmitStart::Invalid(first);
        }

        self.submitting = true;
        self.status = SubmissionStatus::Idle;
        SubmitStart::Ready(self.record.clone())
    }

    pub fn finish_submit(&mut self, outcome: Result<(), SubmitError>) {
        self.submitting = false;
        match outcome {
            Ok(()) => {
                tracing::info!("application submitted");
                self.record = ApplicantRecord::default();
                self.errors = ValidationErrors::default();
                self.status = SubmissionStatus::Success(StatusMessage::text(SUCCESS_MESSAGE));
            }
            Err(err) => {
                match &err {
                    SubmitError::Rejected(message) => tracing::warn!(%message, "submission rejected"),
                    SubmitError::Unreachable(detail) => tracing::warn!(%detail, "endpoint unreachable"),
                    SubmitError::Other(detail) => tracing::error!(%detail, "submission error"),
                }
                self.status = SubmissionStatus::Error(err.status_message());
            }
        }
    }

    #[cfg(test)]
    pub fn submit_with(&mut self, submitter: &dyn crate::client::Submitter) -> SubmitStart {
        let start = self.begin_submit();
        if let SubmitStart::Ready(record) = &start {
            let outcome = submitter.submit(record);
            self.finish_submit(outcome);
        }
        start
    }

    pub fn dismiss_status(&mut self) {
        self.status = SubmissionStatus::Idle;
    }
}
