use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{FieldErrors, SigninForm, SignupForm};

pub const NAME_MIN: usize = 3;
pub const PASSWORD_MIN: usize = 6;
pub const TEXT_MAX: usize = 255;

pub const EMAIL_TAKEN: &str = "The email has already been taken.";
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials!";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim the text inputs in place. Passwords are compared verbatim.
pub fn normalize_signup(form: &mut SignupForm) {
    form.name = form.name.trim().to_string();
    form.email = normalize_email(&form.email);
}

/// Everything except email uniqueness, which needs the user store.
pub fn validate_signup(form: &SignupForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    check_length(&mut errors, "name", &form.name, NAME_MIN, Some(TEXT_MAX));
    check_email(&mut errors, &form.email, Some(TEXT_MAX));

    check_length(&mut errors, "password", &form.password, PASSWORD_MIN, None);
    if form.password != form.password_confirmation {
        errors.add("password", "The password field confirmation does not match.");
    }

    errors
}

pub fn validate_signin(form: &SigninForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    check_email(&mut errors, &form.email, None);
    if form.password.is_empty() {
        errors.add("password", required("password"));
    }
    errors
}

fn check_length(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = value.chars().count();
    if len == 0 {
        errors.add(field, required(field));
    } else if len < min {
        errors.add(field, format!("The {field} field must be at least {min} characters."));
    } else if max.is_some_and(|max| len > max) {
        errors.add(field, too_long(field));
    }
}

fn check_email(errors: &mut FieldErrors, email: &str, max: Option<usize>) {
    if email.is_empty() {
        errors.add("email", required("email"));
    } else if !is_valid_email(email) {
        errors.add("email", "The email field must be a valid email address.");
    } else if max.is_some_and(|max| email.chars().count() > max) {
        errors.add("email", too_long("email"));
    }
}

fn required(field: &str) -> String {
    format!("The {field} field is required.")
}

fn too_long(field: &str) -> String {
    format!("The {field} field must not be greater than {TEXT_MAX} characters.")
}
