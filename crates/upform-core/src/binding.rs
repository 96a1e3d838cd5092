//! Form binding
//!
//! Maps the flat text fields of an upload onto a typed record. Binding never stops
//! at the first problem: every missing required field and every value that fails
//! coercion is collected so the caller can show the complete list.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::FormValues;

/// A single field violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("The {} field is required.", field),
        }
    }

    pub fn invalid(field: &str, reason: impl fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            message: format!("The value for {} is not valid: {}", field, reason),
        }
    }
}

/// Every violation found while binding one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// A record that can be bound from form fields.
///
/// Implementations ask the binder for each declared field and only then combine the
/// results, so that all violations are recorded before any early return:
///
/// ```
/// use upform_core::binding::{BindForm, FormBinder};
///
/// struct Ticket {
///     subject: String,
///     priority: Option<u8>,
/// }
///
/// impl BindForm for Ticket {
///     fn bind(form: &mut FormBinder<'_>) -> Option<Self> {
///         let subject = form.required("Subject");
///         let priority = form.optional("Priority");
///         Some(Self { subject: subject?, priority })
///     }
/// }
/// ```
pub trait BindForm: Sized {
    fn bind(form: &mut FormBinder<'_>) -> Option<Self>;
}

/// Collects values and violations for one binding pass
pub struct FormBinder<'a> {
    values: &'a FormValues,
    errors: ValidationErrors,
}

impl<'a> FormBinder<'a> {
    pub fn new(values: &'a FormValues) -> Self {
        Self {
            values,
            errors: ValidationErrors::default(),
        }
    }

    /// Bind `T` from `values`, failing with every violation found
    pub fn bind<T: BindForm>(values: &'a FormValues) -> Result<T, ValidationErrors> {
        let mut binder = FormBinder::new(values);
        let record = T::bind(&mut binder);
        match record {
            Some(record) if binder.errors.is_empty() => Ok(record),
            _ => {
                if binder.errors.is_empty() {
                    binder
                        .errors
                        .push(FieldError::invalid("", "record could not be bound"));
                }
                Err(binder.errors)
            }
        }
    }

    /// Required field coerced with `FromStr`. Empty values count as missing.
    pub fn required<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.required_with(field, |raw| raw.parse::<T>().map_err(|e| e.to_string()))
    }

    /// Optional field coerced with `FromStr`. Empty values bind as `None`.
    pub fn optional<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional_with(field, |raw| raw.parse::<T>().map_err(|e| e.to_string()))
    }

    /// Required field with a caller-supplied coercion
    pub fn required_with<T, F>(&mut self, field: &str, coerce: F) -> Option<T>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        match self.raw(field) {
            Some(raw) => self.coerce(field, raw, coerce),
            None => {
                self.errors.push(FieldError::missing(field));
                None
            }
        }
    }

    /// Optional field with a caller-supplied coercion
    pub fn optional_with<T, F>(&mut self, field: &str, coerce: F) -> Option<T>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        let raw = self.raw(field)?;
        self.coerce(field, raw, coerce)
    }

    /// Free text that is never missing: absent fields bind as an empty string
    pub fn text(&mut self, field: &str) -> String {
        self.values.get(field).unwrap_or_default().to_string()
    }

    /// Record a violation found by the record itself (e.g. a cross-field rule)
    pub fn reject(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    fn raw(&self, field: &str) -> Option<&'a str> {
        self.values
            .get(field)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }

    fn coerce<T, F>(&mut self, field: &str, raw: &str, coerce: F) -> Option<T>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        match coerce(raw) {
            Ok(value) => Some(value),
            Err(reason) => {
                self.errors.push(FieldError::invalid(field, reason));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl FromStr for Level {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "low" => Ok(Level::Low),
                "high" => Ok(Level::High),
                other => Err(format!("unknown level '{}'", other)),
            }
        }
    }

    #[derive(Debug)]
    struct Report {
        title: String,
        pages: u32,
        level: Level,
        note: Option<String>,
    }

    impl BindForm for Report {
        fn bind(form: &mut FormBinder<'_>) -> Option<Self> {
            let title = form.required("Title");
            let pages = form.required("Pages");
            let level = form.required("Level");
            let note = form.optional("Note");
            Some(Self {
                title: title?,
                pages: pages?,
                level: level?,
                note,
            })
        }
    }

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        let mut values = FormValues::new();
        for (k, v) in pairs {
            values.append(*k, *v);
        }
        values
    }

    #[test]
    fn binds_typed_record() {
        let form = values(&[("Title", "Demo"), ("Pages", "12"), ("level", "HIGH")]);
        let report: Report = FormBinder::bind(&form).unwrap();
        assert_eq!(report.title, "Demo");
        assert_eq!(report.pages, 12);
        assert_eq!(report.level, Level::High);
        assert!(report.note.is_none());
    }

    #[test]
    fn collects_every_violation() {
        let form = values(&[("Pages", "many"), ("Level", "medium")]);
        let errors = FormBinder::bind::<Report>(&form).unwrap_err();
        assert_eq!(errors.fields(), vec!["Title", "Pages", "Level"]);
    }

    #[test]
    fn empty_required_value_is_missing() {
        let form = values(&[("Title", "  "), ("Pages", "1"), ("Level", "low")]);
        let errors = FormBinder::bind::<Report>(&form).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap(), &FieldError::missing("Title"));
    }

    #[test]
    fn first_value_wins_for_duplicates() {
        let form = values(&[
            ("Title", "first"),
            ("Title", "second"),
            ("Pages", "3"),
            ("Level", "low"),
            ("Note", ""),
        ]);
        let report: Report = FormBinder::bind(&form).unwrap();
        assert_eq!(report.title, "first");
        assert_eq!(report.level, Level::Low);
        assert!(report.note.is_none());
    }
}
