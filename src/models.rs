use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Form fields in on-screen order. The derived ordering is also the order
/// in which invalid fields are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    FullName,
    Email,
    DateOfBirth,
    WhatsappNumber,
    Linkedin,
    JobPosition,
    Cv,
    Portfolio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Date,
    Tel,
    Url,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::FullName,
        Field::Email,
        Field::DateOfBirth,
        Field::WhatsappNumber,
        Field::Linkedin,
        Field::JobPosition,
        Field::Cv,
        Field::Portfolio,
    ];

    /// Element id, also used as the multipart part name.
    pub fn id(self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Email => "email",
            Field::DateOfBirth => "dob",
            Field::WhatsappNumber => "whatsappNumber",
            Field::Linkedin => "linkedin",
            Field::JobPosition => "jobPosition",
            Field::Cv => "cv",
            Field::Portfolio => "portfolio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::Email => "Email Address",
            Field::DateOfBirth => "Date of Birth",
            Field::WhatsappNumber => "WhatsApp Number",
            Field::Linkedin => "LinkedIn Profile URL",
            Field::JobPosition => "Applying for Position",
            Field::Cv => "Upload CV",
            Field::Portfolio => "Portfolio URL",
        }
    }

    /// Name used in validation messages.
    pub fn name(self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::Email => "Email",
            Field::DateOfBirth => "Date of Birth",
            Field::WhatsappNumber => "WhatsApp Number",
            Field::Linkedin => "LinkedIn",
            Field::JobPosition => "Job Position",
            Field::Cv => "CV",
            Field::Portfolio => "Portfolio",
        }
    }

    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            Field::FullName => Some("Enter your full name"),
            Field::Email => Some("example@email.com"),
            Field::DateOfBirth => Some("YYYY-MM-DD"),
            Field::WhatsappNumber => Some("+62 812 3456 7890"),
            Field::Linkedin => Some("https://linkedin.com/in/yourprofile"),
            Field::JobPosition => Some("Select a position"),
            Field::Cv => Some("Press Enter to choose a file (.pdf, .doc, .docx)"),
            Field::Portfolio => Some("https://yourportfolio.com"),
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Field::Linkedin | Field::Portfolio)
    }

    /// Input kind for single-line text fields; `None` for the selector and the file field.
    pub fn input_kind(self) -> Option<InputKind> {
        match self {
            Field::FullName => Some(InputKind::Text),
            Field::Email => Some(InputKind::Email),
            Field::DateOfBirth => Some(InputKind::Date),
            Field::WhatsappNumber => Some(InputKind::Tel),
            Field::Linkedin | Field::Portfolio => Some(InputKind::Url),
            Field::JobPosition | Field::Cv => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A picked CV file. Only the handle is kept; contents are read at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

impl CvFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        if !metadata.is_file() {
            return Err(anyhow!("{} is not a file", path.display()));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }

    pub fn display_size(&self) -> String {
        match self.size {
            s if s >= 1024 * 1024 => format!("{:.1} MB", s as f64 / (1024.0 * 1024.0)),
            s if s >= 1024 => format!("{:.1} KB", s as f64 / 1024.0),
            s => format!("{} B", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantRecord {
    pub email: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub whatsapp_number: String,
    pub linkedin_url: String,
    pub job_position: String,
    pub cv: Option<CvFile>,
    pub portfolio_url: String,
}

impl ApplicantRecord {
    /// Value of a string-valued field. `None` for the CV.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FullName => &self.full_name,
            Field::Email => &self.email,
            Field::DateOfBirth => &self.date_of_birth,
            Field::WhatsappNumber => &self.whatsapp_number,
            Field::Linkedin => &self.linkedin_url,
            Field::JobPosition => &self.job_position,
            Field::Portfolio => &self.portfolio_url,
            Field::Cv => return None,
        };
        Some(value.as_str())
    }

    /// Sets a string-valued field. Returns false for the CV, which is set via `cv`.
    pub fn set_text(&mut self, field: Field, value: String) -> bool {
        let slot = match field {
            Field::FullName => &mut self.full_name,
            Field::Email => &mut self.email,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::WhatsappNumber => &mut self.whatsapp_number,
            Field::Linkedin => &mut self.linkedin_url,
            Field::JobPosition => &mut self.job_position,
            Field::Portfolio => &mut self.portfolio_url,
            Field::Cv => return false,
        };
        *slot = value;
        true
    }

    /// Text parts in submission order.
    pub fn text_parts(&self) -> Vec<(&'static str, &str)> {
        [
            Field::Email,
            Field::FullName,
            Field::DateOfBirth,
            Field::WhatsappNumber,
            Field::Linkedin,
            Field::JobPosition,
            Field::Portfolio,
        ]
        .into_iter()
        .filter_map(|field| self.text(field).map(|value| (field.id(), value)))
        .collect()
    }
}

/// Fields that currently fail validation, keyed in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    /// Returns true if an entry was removed.
    pub fn clear_field(&mut self, field: Field) -> bool {
        self.errors.remove(&field).is_some()
    }

    pub fn first(&self) -> Option<Field> {
        self.errors.keys().next().copied()
    }

    #[cfg(test)]
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link { label: String, url: String },
}

/// Overlay message: plain text with optional embedded links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    pub segments: Vec<Segment>,
}

impl StatusMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(text.into())],
        }
    }

    pub fn push_text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    pub fn push_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.segments.push(Segment::Link {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    #[cfg(test)]
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Link { url, .. } => Some(url.as_str()),
            Segment::Text(_) => None,
        })
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Link { label, url } => write!(f, "{} <{}>", label, url)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Success(StatusMessage),
    Error(StatusMessage),
}

impl SubmissionStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, SubmissionStatus::Idle)
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        match self {
            SubmissionStatus::Idle => None,
            SubmissionStatus::Success(m) | SubmissionStatus::Error(m) => Some(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_puts_required_fields_in_report_order() {
        let required: Vec<&str> = Field::ALL
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.id())
            .collect();
        assert_eq!(
            required,
            vec!["fullName", "email", "dob", "whatsappNumber", "jobPosition", "cv"]
        );
    }

    #[test]
    fn test_text_parts_use_wire_names_and_skip_cv() {
        let record = ApplicantRecord {
            email: "a@b.co".to_string(),
            full_name: "Ana".to_string(),
            linkedin_url: "https://linkedin.com/in/ana".to_string(),
            ..Default::default()
        };
        let parts = record.text_parts();
        let names: Vec<&str> = parts.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["email", "fullName", "dob", "whatsappNumber", "linkedin", "jobPosition", "portfolio"]
        );
        assert_eq!(parts[4].1, "https://linkedin.com/in/ana");
        assert_eq!(parts[2].1, "");
    }

    #[test]
    fn test_set_text_rejects_cv() {
        let mut record = ApplicantRecord::default();
        assert!(!record.set_text(Field::Cv, "x".to_string()));
        assert!(record.set_text(Field::JobPosition, "Designer".to_string()));
        assert_eq!(record.job_position, "Designer");
    }

    #[test]
    fn test_validation_errors_first_follows_field_order() {
        let mut errors = ValidationErrors::default();
        errors.insert(Field::Cv, "CV is required");
        errors.insert(Field::Email, "Email is invalid");
        assert_eq!(errors.first(), Some(Field::Email));
        assert!(errors.clear_field(Field::Email));
        assert!(!errors.clear_field(Field::Email));
        assert_eq!(errors.first(), Some(Field::Cv));
    }

    #[test]
    fn test_status_message_display_includes_links() {
        let message = StatusMessage::text("Contact ")
            .push_link("us", "https://example.com/contact")
            .push_text(".");
        assert_eq!(message.to_string(), "Contact us <https://example.com/contact>.");
        assert_eq!(message.links().collect::<Vec<_>>(), vec!["https://example.com/contact"]);
    }

    #[test]
    fn test_cv_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let cv = CvFile::from_path(&path).unwrap();
        assert_eq!(cv.file_name, "resume.pdf");
        assert_eq!(cv.size, 2048);
        assert_eq!(cv.display_size(), "2.0 KB");

        assert!(CvFile::from_path(dir.path()).is_err());
        assert!(CvFile::from_path(&dir.path().join("missing.pdf")).is_err());
    }
}
