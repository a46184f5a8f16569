use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{ApplicantRecord, StatusMessage};

pub const UNKNOWN_REJECTION: &str = "An unknown error occurred";
pub const GENERIC_FAILURE: &str = "An error occurred during submission. Please try again.";

// --- Demo contact ---

const CONTACT_NAME: &str = "Aditya";
const CONTACT_EMAIL: &str = "adity4n@gmail.com";
const CONTACT_SUBJECT: &str = "HR Candidate Screening Demo Request";
const CONTACT_BODY: &str = "Hi, I'd like to request a demo for the HR Candidate Screening solution.\n\
I'd also be interested in exploring the other workflow demos you offer, especially those related to \
recruitment and process automation. Please let me know the available time slots and any details I \
should prepare beforehand.";

/// Gmail compose link pre-filled with the demo request.
pub fn contact_link() -> String {
    let params = [
        ("view", "cm"),
        ("fs", "1"),
        ("to", CONTACT_EMAIL),
        ("su", CONTACT_SUBJECT),
        ("body", CONTACT_BODY),
    ];
    match Url::parse_with_params("https://mail.google.com/mail/", &params) {
        Ok(url) => url.to_string(),
        Err(_) => format!("mailto:{}", CONTACT_EMAIL),
    }
}

// --- Errors ---

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The endpoint answered with a non-success status.
    #[error("Submission failed: {0}")]
    Rejected(String),
    /// The request never reached the endpoint.
    #[error("endpoint could not be reached: {0}")]
    Unreachable(String),
    #[error("submission error: {0}")]
    Other(String),
}

impl SubmitError {
    pub fn status_message(&self) -> StatusMessage {
        match self {
            SubmitError::Rejected(_) => StatusMessage::text(self.to_string()),
            SubmitError::Unreachable(_) => {
                StatusMessage::text("The application endpoint could not be reached. Contact ")
                    .push_link(CONTACT_NAME, contact_link())
                    .push_text(" to request a demo.")
            }
            SubmitError::Other(_) => StatusMessage::text(GENERIC_FAILURE),
        }
    }
}

// --- Submitter trait ---

pub trait Submitter: Send + Sync {
    fn submit(&self, record: &ApplicantRecord) -> Result<(), SubmitError>;
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

// --- HTTP submitter ---

#[derive(Debug)]
pub struct HttpSubmitter {
    endpoint: Url,
    client: reqwest::blocking::Client,
}

impl HttpSubmitter {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid submission endpoint '{}'", endpoint))?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(record: &ApplicantRecord) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in record.text_parts() {
            form = form.text(name, value.to_string());
        }

        if let Some(cv) = &record.cv {
            let bytes = std::fs::read(&cv.path)
                .with_context(|| format!("Failed to read CV {}", cv.path.display()))?;
            let mime = mime_guess::from_path(&cv.path).first_or_octet_stream();
            let part = Part::bytes(bytes)
                .file_name(cv.file_name.clone())
                .mime_str(mime.as_ref())
                .context("Invalid CV content type")?;
            form = form.part("cv", part);
        }

        Ok(form)
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&self, record: &ApplicantRecord) -> Result<(), SubmitError> {
        let form = Self::build_form(record).map_err(|e| SubmitError::Other(format!("{:#}", e)))?;

        tracing::info!(endpoint = %self.endpoint, "submitting application");
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    SubmitError::Unreachable(e.to_string())
                } else {
                    SubmitError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%status, "endpoint accepted application");
            return Ok(());
        }

        let message = response
            .json::<RejectionBody>()
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| UNKNOWN_REJECTION.to_string());
        tracing::debug!(%status, %message, "endpoint rejected application");
        Err(SubmitError::Rejected(message))
    }
}
