//! crates/docurp_core/src/validation.rs
//!
//! Local checks that run before any provider call: registration fields and
//! upload file names.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const STUDENT_CODE_LEN: usize = 9;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern is valid"));

/// Restricts registration to one institutional email domain.
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    domain: String,
}

impl EmailPolicy {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            domain: domain.trim_start_matches('@').to_lowercase(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Case-insensitive suffix match on `@{domain}`.
    pub fn is_institutional(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        EMAIL_SHAPE.is_match(&email) && email.ends_with(&format!("@{}", self.domain))
    }

    pub fn check(&self, email: &str) -> Result<(), ValidationError> {
        if self.is_institutional(email) {
            Ok(())
        } else {
            Err(ValidationError::EmailDomain {
                domain: self.domain.clone(),
            })
        }
    }
}

pub fn check_password_length(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn check_password_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn check_student_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == STUDENT_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::StudentCode {
            len: STUDENT_CODE_LEN,
        })
    }
}

//=========================================================================================
// Upload file names
//=========================================================================================

/// The file types accepted for upload. Detection looks at the extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedExtension {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
}

impl AllowedExtension {
    pub const ALL: [AllowedExtension; 5] = [
        AllowedExtension::Pdf,
        AllowedExtension::Docx,
        AllowedExtension::Doc,
        AllowedExtension::Xlsx,
        AllowedExtension::Xls,
    ];

    pub fn parse(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }

    /// MIME type used when the client did not declare a usable one.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// The `accept` attribute for the upload form input.
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .map(|e| format!(".{}", e.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// The text after the last `.` of a file name, if there is one.
pub fn extension_of(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Drops any directory part a browser may send along with the file name.
pub fn base_filename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn institutional_email_is_case_insensitive() {
        let policy = EmailPolicy::new("urp.edu.pe");
        assert!(policy.is_institutional("ana@urp.edu.pe"));
        assert!(policy.is_institutional("Ana.Perez@URP.EDU.PE"));
        assert!(!policy.is_institutional("ana@gmail.com"));
        assert!(!policy.is_institutional("ana@noturp.edu.pe"));
        assert!(!policy.is_institutional("@urp.edu.pe"));
        assert!(!policy.is_institutional("ana@urp.edu.pe.evil.com"));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(check_password_length("abcdef").is_ok());
        assert!(check_password_length("abcde").is_err());
        assert!(check_password_length("ñññññ").is_err());
    }

    #[test]
    fn student_code_is_nine_digits() {
        assert!(check_student_code("202220427").is_ok());
        assert!(check_student_code("20222042").is_err());
        assert!(check_student_code("20222042a").is_err());
        assert!(check_student_code("").is_err());
    }

    #[test]
    fn extension_detection() {
        assert_eq!(extension_of("report.PDF"), Some("PDF"));
        assert_eq!(extension_of("archive.tar.xlsx"), Some("xlsx"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".pdf"), None);
        assert_eq!(AllowedExtension::parse("PDF"), Some(AllowedExtension::Pdf));
        assert_eq!(AllowedExtension::parse("exe"), None);
    }

    #[test]
    fn base_filename_strips_client_paths() {
        assert_eq!(base_filename("C:\\Users\\ana\\notes.docx"), "notes.docx");
        assert_eq!(base_filename("dir/sub/plan.xls"), "plan.xls");
        assert_eq!(base_filename("plain.pdf"), "plain.pdf");
        assert_eq!(base_filename("folder/"), "");
    }

    #[test]
    fn accept_attribute_lists_every_extension() {
        assert_eq!(AllowedExtension::accept_attribute(), ".pdf,.docx,.doc,.xlsx,.xls");
    }
}
