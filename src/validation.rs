//! Field checks for sign-up input.
//!
//! Every rule reports against the field it concerns so a client can fix all
//! of its input in one round trip.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{Profile, SignUpRequest};

pub const MIN_PASSWORD_LENGTH: usize = 6;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 100;
const MAX_NAME_LENGTH: usize = 100;
const MAX_PHONE_LENGTH: usize = 20;
const MAX_ADDRESS_LENGTH: usize = 200;
const MAX_COUNTRY_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn matches(cell: &'static OnceLock<Option<Regex>>, source: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(source).ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}

fn is_username(value: &str) -> bool {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&CELL, r"^[A-Za-z0-9_]+$", value)
}

fn is_email(value: &str) -> bool {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&CELL, r"^[^@\s]+@[^@\s]+\.[^@\s]+$", value)
}

fn is_name(value: &str) -> bool {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&CELL, r"^[A-Za-z\s]+$", value)
}

fn is_date(value: &str) -> bool {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&CELL, r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$", value)
}

fn is_social_link(value: &str) -> bool {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(
        &CELL,
        r"^https://(github\.com|facebook\.com|linkedin\.com|twitter\.com)/.+",
        value,
    )
}

/// Returns the password rule violation, if any. Length counts characters, not bytes.
pub fn check_password(password: &str) -> Option<FieldError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        ));
    }
    None
}

fn check_required(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    max: usize,
) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
        return false;
    }
    if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{field} must be at most {max} characters long"),
        ));
        return false;
    }
    true
}

fn check_optional(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        if value.chars().count() > max {
            errors.push(FieldError::new(
                field,
                format!("{field} must be at most {max} characters long"),
            ));
        }
    }
}

fn validate_profile(errors: &mut Vec<FieldError>, profile: &Profile) {
    check_optional(errors, "phone", profile.phone.as_deref(), MAX_PHONE_LENGTH);
    check_optional(errors, "address", profile.address.as_deref(), MAX_ADDRESS_LENGTH);
    check_optional(errors, "country", profile.country.as_deref(), MAX_COUNTRY_LENGTH);

    if let Some(date) = profile.date_of_birth.as_deref() {
        if !is_date(date) {
            errors.push(FieldError::new(
                "dateOfBirth",
                "Date of birth must be formatted as YYYY-MM-DD",
            ));
        }
    }

    if let Some(link) = profile.social_media_link.as_deref() {
        if !is_social_link(link) {
            errors.push(FieldError::new(
                "socialMediaLink",
                "Social media link must be a valid GitHub, Facebook, LinkedIn, or Twitter URL",
            ));
        }
    }
}

impl SignUpRequest {
    /// Checks every field and returns all violations. An empty list means the request is valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if check_required(&mut errors, "username", &self.username, MAX_USERNAME_LENGTH)
            && !is_username(&self.username)
        {
            errors.push(FieldError::new(
                "username",
                "Username must only contain letters, numbers, and underscores",
            ));
        }

        if check_required(&mut errors, "email", &self.email, MAX_EMAIL_LENGTH)
            && !is_email(&self.email)
        {
            errors.push(FieldError::new("email", "Please provide a valid email address"));
        }

        errors.extend(check_password(&self.password));

        if check_required(&mut errors, "name", &self.name, MAX_NAME_LENGTH)
            && !is_name(&self.name)
        {
            errors.push(FieldError::new("name", "Name must only contain letters and spaces"));
        }

        validate_profile(&mut errors, &self.profile);

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignUpRequest {
        SignUpRequest {
            username: "alice_01".into(),
            email: "alice@example.com".into(),
            password: "secret1".into(),
            name: "Alice Liddell".into(),
            profile: Profile::default(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(request().validate().is_empty());
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(check_password("12345").is_some());
        assert!(check_password("").is_some());
        assert!(check_password("123456").is_none());
        assert!(check_password("ééééé").is_some());
        assert!(check_password("éééééé").is_none());
    }

    #[test]
    fn reports_each_bad_field() {
        let mut req = request();
        req.username = "alice!".into();
        req.email = "not-an-email".into();
        req.password = "abc".into();
        req.name = "R2D2".into();

        assert_eq!(
            fields(&req.validate()),
            vec!["username", "email", "password", "name"]
        );
    }

    #[test]
    fn missing_fields_are_required_once() {
        let mut req = request();
        req.username = "   ".into();
        req.name = String::new();

        let errors = req.validate();
        assert_eq!(fields(&errors), vec!["username", "name"]);
        assert_eq!(errors[0].message, "username is required");
    }

    #[test]
    fn username_length_is_bounded() {
        let mut req = request();
        req.username = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert_eq!(fields(&req.validate()), vec!["username"]);
    }

    #[test]
    fn profile_fields_are_checked_when_present() {
        let mut req = request();
        req.profile = Profile {
            phone: Some("0".repeat(MAX_PHONE_LENGTH + 1)),
            date_of_birth: Some("1990-13-01".into()),
            social_media_link: Some("https://example.com/alice".into()),
            ..Profile::default()
        };
        assert_eq!(
            fields(&req.validate()),
            vec!["phone", "dateOfBirth", "socialMediaLink"]
        );

        req.profile = Profile {
            date_of_birth: Some("1990-02-28".into()),
            social_media_link: Some("https://github.com/alice".into()),
            ..Profile::default()
        };
        assert!(req.validate().is_empty());
    }
}
