//! Plain-text certificates of completion.

use chrono::NaiveDate;
use thiserror::Error;

use crate::progress::Progress;

/// Footer used when no platform name is configured.
pub const DEFAULT_PLATFORM_NAME: &str = "MamaPlus Education Platform";

const RULE: &str = "═══════════════════════════════════════════════";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("certificate requires 100% progress (currently {0})")]
    Incomplete(Progress),
}

/// A rendered certificate and the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    file_name: String,
    body: String,
}

impl Certificate {
    /// Render a certificate for a finished course.
    ///
    /// A blank learner name is printed as `Student`.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::Incomplete` when `progress` is below 100%.
    pub fn issue(
        learner_name: &str,
        course_title: &str,
        progress: Progress,
        date: NaiveDate,
        platform_name: &str,
    ) -> Result<Self, CertificateError> {
        if !progress.is_complete() {
            return Err(CertificateError::Incomplete(progress));
        }
        let learner = match learner_name.trim() {
            "" => "Student",
            name => name,
        };
        let body = format!(
            "{RULE}\n            CERTIFICATE OF COMPLETION\n{RULE}\n\n\
             This is to certify that\n\n            {learner}\n\n\
             has successfully completed the course\n\n            \"{course_title}\"\n\n\
             with a progress of {value}%\n\n\
             Date: {date}\n\n\
             {RULE}\n              {platform_name}\n{RULE}\n",
            value = progress.value(),
            date = date.format("%Y-%m-%d"),
        );
        Ok(Self {
            file_name: certificate_file_name(course_title),
            body,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// `<title with whitespace runs as "_">_Certificate.txt`
#[must_use]
pub fn certificate_file_name(course_title: &str) -> String {
    let mut name = String::with_capacity(course_title.len() + 16);
    let mut in_space = false;
    for ch in course_title.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    name.push_str("_Certificate.txt");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn refuses_below_complete() {
        let err = Certificate::issue(
            "Jane",
            "Infant Nutrition",
            Progress::from_persisted(99),
            date(),
            DEFAULT_PLATFORM_NAME,
        )
        .unwrap_err();
        assert_eq!(err, CertificateError::Incomplete(Progress::from_persisted(99)));
    }

    #[test]
    fn complete_certificate_names_learner_and_course() {
        let cert = Certificate::issue(
            "Jane Doe",
            "Infant  Nutrition & Care",
            Progress::COMPLETE,
            date(),
            DEFAULT_PLATFORM_NAME,
        )
        .unwrap();
        assert!(cert.body().contains("Jane Doe"));
        assert!(cert.body().contains("\"Infant  Nutrition & Care\""));
        assert!(cert.body().contains("Date: 2026-03-14"));
        assert!(cert.body().contains("with a progress of 100%"));
        assert_eq!(cert.file_name(), "Infant_Nutrition_&_Care_Certificate.txt");
    }

    #[test]
    fn blank_learner_becomes_student() {
        let cert =
            Certificate::issue("  ", "Safety", Progress::COMPLETE, date(), "Acme Academy").unwrap();
        assert!(cert.body().contains("            Student\n"));
        assert!(cert.body().contains("Acme Academy"));
    }

    #[test]
    fn file_name_replaces_tabs_and_newlines() {
        assert_eq!(
            certificate_file_name("A\tB\n C"),
            "A_B_C_Certificate.txt"
        );
    }
}
