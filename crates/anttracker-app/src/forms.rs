// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::{ContactId, IssueId, Priority, ProductId, ReleaseId, Status};

pub const DESCRIPTION_MAX: usize = 30;
pub const PRODUCT_NAME_MAX: usize = 30;
pub const RELEASE_NAME_MAX: usize = 8;
pub const CONTACT_NAME_MAX: usize = 30;
pub const EMAIL_MIN: usize = 5;
pub const EMAIL_MAX: usize = 24;
pub const DEPARTMENT_MAX: usize = 12;
/// Widest "created within" window a search accepts.
pub const DAYS_MAX: u32 = 36_500;

/// Names may not be the backtick that backs out of a choice prompt.
const RESERVED_NAME: &str = "`";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("email must contain '@'")]
    EmailMissingAt,
    #[error("phone must be 10 digits, or 11 digits starting with 1")]
    Phone,
    #[error("priority must be a number from {} to {}", Priority::MIN, Priority::MAX)]
    Priority,
    #[error("unknown status {0:?}")]
    Status(String),
    #[error("days must be a whole number from 0 to {}", DAYS_MAX)]
    Days,
    #[error("date must look like YYYY-MM-DD")]
    Date,
    #[error("{field} must not be the abort key `")]
    Reserved { field: &'static str },
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn required_max(field: &'static str, value: &str, max: usize) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Required { field });
    }
    if char_len(value) > max {
        return Err(FieldError::TooLong { field, max });
    }
    Ok(())
}

pub fn validate_description(value: &str) -> Result<(), FieldError> {
    required_max("description", value, DESCRIPTION_MAX)
}

pub fn validate_product_name(value: &str) -> Result<(), FieldError> {
    required_max("product name", value, PRODUCT_NAME_MAX)?;
    not_reserved("product name", value)
}

pub fn validate_release_name(value: &str) -> Result<(), FieldError> {
    required_max("release name", value, RELEASE_NAME_MAX)?;
    not_reserved("release name", value)
}

fn not_reserved(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.trim() == RESERVED_NAME {
        return Err(FieldError::Reserved { field });
    }
    Ok(())
}

pub fn validate_contact_name(value: &str) -> Result<(), FieldError> {
    required_max("contact name", value, CONTACT_NAME_MAX)
}

pub fn validate_email(value: &str) -> Result<(), FieldError> {
    let len = char_len(value);
    if !(EMAIL_MIN..=EMAIL_MAX).contains(&len) {
        return Err(FieldError::Length {
            field: "email",
            min: EMAIL_MIN,
            max: EMAIL_MAX,
        });
    }
    if !value.contains('@') {
        return Err(FieldError::EmailMissingAt);
    }
    Ok(())
}

pub fn validate_phone(value: &str) -> Result<(), FieldError> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::Phone);
    }
    match value.len() {
        10 => Ok(()),
        11 if value.starts_with('1') => Ok(()),
        _ => Err(FieldError::Phone),
    }
}

pub fn validate_department(value: &str) -> Result<(), FieldError> {
    if char_len(value) > DEPARTMENT_MAX {
        return Err(FieldError::TooLong {
            field: "department",
            max: DEPARTMENT_MAX,
        });
    }
    Ok(())
}

pub fn parse_priority(value: &str) -> Result<Priority, FieldError> {
    Priority::parse(value).ok_or(FieldError::Priority)
}

pub fn parse_days(value: &str) -> Result<u32, FieldError> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::Days);
    }
    match value.parse::<u32>() {
        Ok(days) if days <= DAYS_MAX => Ok(days),
        _ => Err(FieldError::Days),
    }
}

pub fn parse_date(value: &str) -> Result<Date, FieldError> {
    Date::parse(value.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| FieldError::Date)
}

/// Parse a comma-separated list of status labels, e.g. `Created, Done`.
pub fn parse_status_list(value: &str) -> Result<Vec<Status>, FieldError> {
    let mut statuses = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let status = Status::parse_label(part).ok_or_else(|| FieldError::Status(part.to_owned()))?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    if statuses.is_empty() {
        return Err(FieldError::Required { field: "status" });
    }
    Ok(statuses)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Issue,
    Request,
    Release,
    Product,
    Contact,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Request => "request",
            Self::Release => "release",
            Self::Product => "product",
            Self::Contact => "contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFormInput {
    pub description: String,
    pub product_id: ProductId,
    pub anticipated_release_id: Option<ReleaseId>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFormInput {
    pub issue_id: IssueId,
    pub affected_release_id: ReleaseId,
    pub contact_id: ContactId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFormInput {
    pub product_id: ProductId,
    pub name: String,
    pub release_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFormInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFormInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Issue(IssueFormInput),
    Request(RequestFormInput),
    Release(ReleaseFormInput),
    Product(ProductFormInput),
    Contact(ContactFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Issue(_) => FormKind::Issue,
            Self::Request(_) => FormKind::Request,
            Self::Release(_) => FormKind::Release,
            Self::Product(_) => FormKind::Product,
            Self::Contact(_) => FormKind::Contact,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Issue(issue) => issue.validate(),
            Self::Request(request) => request.validate(),
            Self::Release(release) => release.validate(),
            Self::Product(product) => product.validate(),
            Self::Contact(contact) => contact.validate(),
        }
    }
}

impl IssueFormInput {
    pub fn validate(&self) -> Result<()> {
        validate_description(&self.description)?;
        if self.product_id.get() <= 0 {
            bail!("issue product is required -- choose a product and retry");
        }
        if let Some(release_id) = self.anticipated_release_id
            && release_id.get() <= 0
        {
            bail!("anticipated release id must be positive");
        }
        Ok(())
    }
}

impl RequestFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.issue_id.get() <= 0 {
            bail!("request issue is required -- choose an issue and retry");
        }
        if self.affected_release_id.get() <= 0 {
            bail!("affected release is required -- choose a release and retry");
        }
        if self.contact_id.get() <= 0 {
            bail!("request contact is required -- choose a contact and retry");
        }
        Ok(())
    }
}

impl ReleaseFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.product_id.get() <= 0 {
            bail!("release product is required -- choose a product and retry");
        }
        validate_release_name(&self.name)?;
        Ok(())
    }
}

impl ProductFormInput {
    pub fn validate(&self) -> Result<()> {
        validate_product_name(&self.name)?;
        Ok(())
    }
}

impl ContactFormInput {
    pub fn validate(&self) -> Result<()> {
        validate_contact_name(&self.name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        validate_department(&self.department)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ContactFormInput, DAYS_MAX, FieldError, FormKind, FormPayload, IssueFormInput,
        ProductFormInput, ReleaseFormInput, RequestFormInput, parse_date, parse_days,
        parse_priority, parse_status_list, validate_department, validate_description,
        validate_email, validate_phone, validate_product_name, validate_release_name,
    };
    use crate::{ContactId, IssueId, Priority, ProductId, ReleaseId, Status};
    use time::macros::date;

    fn contact(email: &str, phone: &str) -> ContactFormInput {
        ContactFormInput {
            name: "Ada Lovelace".to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            department: "Engineering".to_owned(),
        }
    }

    #[test]
    fn description_length_is_bounded() {
        assert_eq!(
            validate_description("  "),
            Err(FieldError::Required {
                field: "description"
            })
        );
        assert!(validate_description(&"x".repeat(30)).is_ok());
        assert!(validate_description(&"x".repeat(31)).is_err());
    }

    #[test]
    fn email_needs_at_sign_and_bounded_length() {
        assert!(validate_email("a@b.c").is_ok());
        assert_eq!(validate_email("abcde"), Err(FieldError::EmailMissingAt));
        assert!(validate_email("a@b").is_err());
        assert!(validate_email(&format!("{}@x.io", "a".repeat(20))).is_err());
    }

    #[test]
    fn phone_accepts_ten_digits_or_leading_one() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("15551234567").is_ok());
        assert!(validate_phone("25551234567").is_err());
        assert!(validate_phone("555-123-4567").is_err());
        assert!(validate_phone("555123456").is_err());
    }

    #[test]
    fn department_is_optional_but_bounded() {
        assert!(validate_department("").is_ok());
        assert!(validate_department("Engineering!").is_ok());
        assert!(validate_department("Engineering!!").is_err());
    }

    #[test]
    fn days_must_be_non_negative_integer() {
        assert_eq!(parse_days("0"), Ok(0));
        assert_eq!(parse_days(" 14 "), Ok(14));
        assert_eq!(parse_days("-1"), Err(FieldError::Days));
        assert_eq!(parse_days("1.5"), Err(FieldError::Days));
        assert_eq!(parse_days(""), Err(FieldError::Days));
        assert_eq!(parse_days("36500"), Ok(DAYS_MAX));
        assert_eq!(parse_days("36501"), Err(FieldError::Days));
        assert_eq!(parse_days("5000000"), Err(FieldError::Days));
        assert_eq!(parse_days("99999999999"), Err(FieldError::Days));
    }

    #[test]
    fn release_dates_use_iso_layout() {
        assert_eq!(parse_date(" 2026-10-01 "), Ok(date!(2026 - 10 - 01)));
        assert_eq!(parse_date("10/01/2026"), Err(FieldError::Date));
    }

    #[test]
    fn priority_parses_one_through_five() {
        assert_eq!(parse_priority("5").map(Priority::get), Ok(5));
        assert_eq!(parse_priority("9"), Err(FieldError::Priority));
    }

    #[test]
    fn status_list_parses_labels_and_drops_duplicates() {
        assert_eq!(
            parse_status_list("Created, Done,Created"),
            Ok(vec![Status::Created, Status::Done])
        );
        assert_eq!(
            parse_status_list("Created, Open"),
            Err(FieldError::Status("Open".to_owned()))
        );
        assert!(parse_status_list(" , ").is_err());
    }

    #[test]
    fn contact_payload_validates_every_field() {
        let good = FormPayload::Contact(contact("ada@example.io", "15551234567"));
        assert!(good.validate().is_ok());
        assert_eq!(good.kind(), FormKind::Contact);
        let bad = FormPayload::Contact(contact("ada@example.io", "12345"));
        let error = bad.validate().expect_err("phone too short");
        assert!(error.to_string().contains("phone"));
    }

    #[test]
    fn issue_payload_requires_product() {
        let payload = FormPayload::Issue(IssueFormInput {
            description: "Crash on export".to_owned(),
            product_id: ProductId::new(0),
            anticipated_release_id: None,
            priority: Priority::new(2).expect("valid priority"),
        });
        let error = payload.validate().expect_err("missing product");
        assert!(error.to_string().contains("choose a product and retry"));
    }

    #[test]
    fn request_payload_requires_all_references() {
        let payload = FormPayload::Request(RequestFormInput {
            issue_id: IssueId::new(1),
            affected_release_id: ReleaseId::new(2),
            contact_id: ContactId::new(0),
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn release_and_product_names_are_bounded() {
        let release = FormPayload::Release(ReleaseFormInput {
            product_id: ProductId::new(1),
            name: "2026.10.1".to_owned(),
            release_date: date!(2026 - 10 - 01),
        });
        assert!(release.validate().is_err());
        let product = FormPayload::Product(ProductFormInput {
            name: "Anthill".to_owned(),
        });
        assert!(product.validate().is_ok());
    }

    #[test]
    fn names_cannot_be_the_abort_key() {
        assert_eq!(
            validate_product_name("`"),
            Err(FieldError::Reserved {
                field: "product name"
            })
        );
        assert_eq!(
            validate_release_name(" ` "),
            Err(FieldError::Reserved {
                field: "release name"
            })
        );
        assert!(validate_product_name("`Anthill`").is_ok());
        assert!(validate_release_name("1.0`").is_ok());
    }
}
