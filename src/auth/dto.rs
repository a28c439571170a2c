use std::collections::BTreeMap;

use serde::Deserialize;

/// Form body for `POST /signup`. Missing fields deserialize as empty so they
/// surface as "required" errors rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(rename = "_token")]
    pub token: String,
}

/// Form body for `POST /signin`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "_token")]
    pub token: String,
}

/// Values echoed back into a re-rendered form. Passwords never are.
#[derive(Debug, Default, Clone)]
pub struct OldInput {
    pub name: String,
    pub email: String,
}

/// First error message per form field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record `message` unless `field` already failed an earlier rule.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::default();
        errors.add("email", "first");
        errors.add("email", "second");
        errors.add("name", "other");
        assert_eq!(errors.get("email"), Some("first"));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "name"]);
    }
}
