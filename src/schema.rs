//! Structural validation of incoming book payloads.
//!
//! A payload is checked as a raw JSON value first, so that every missing,
//! mistyped or unknown field is reported at once instead of the first serde
//! error. Only a payload that passes is deserialized and handed to
//! [`validator`] for the value-level constraints.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Every field, including `isbn`, is required.
    Create,
    /// Every field except `isbn` is required. `isbn` is rejected as unknown.
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value
                .as_i64()
                .is_some_and(|number| i32::try_from(number).is_ok()),
        }
    }
}

const BOOK_FIELDS: [(&str, FieldType); 8] = [
    ("isbn", FieldType::String),
    ("amazon_url", FieldType::String),
    ("author", FieldType::String),
    ("language", FieldType::String),
    ("pages", FieldType::Integer),
    ("publisher", FieldType::String),
    ("title", FieldType::String),
    ("year", FieldType::Integer),
];

impl SchemaMode {
    /// Returns the fields a payload must carry in this mode.
    pub fn fields(self) -> impl Iterator<Item = (&'static str, FieldType)> {
        BOOK_FIELDS
            .into_iter()
            .filter(move |(name, _)| self == SchemaMode::Create || *name != "isbn")
    }

    fn knows(self, field: &str) -> bool {
        self.fields().any(|(name, _)| name == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum ViolationKind {
    NotAnObject,
    Missing,
    WrongType { expected: FieldType },
    Unknown,
    Invalid { message: String },
}

impl Violation {
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Violation {
            field: field.into(),
            kind,
        }
    }
}

/// Checks the shape of `value` against the book schema for `mode`.
///
/// Violations are sorted by field name.
pub fn check(value: &Value, mode: SchemaMode) -> Result<(), Vec<Violation>> {
    let Some(object) = value.as_object() else {
        return Err(vec![Violation::new("", ViolationKind::NotAnObject)]);
    };

    let mut violations = Vec::new();

    for (name, expected) in mode.fields() {
        match object.get(name) {
            None => violations.push(Violation::new(name, ViolationKind::Missing)),
            Some(value) if !expected.matches(value) => {
                violations.push(Violation::new(name, ViolationKind::WrongType { expected }))
            }
            Some(_) => {}
        }
    }

    for key in object.keys().filter(|key| !mode.knows(key)) {
        violations.push(Violation::new(key.as_str(), ViolationKind::Unknown));
    }

    if violations.is_empty() {
        return Ok(());
    }

    violations.sort_by(|a, b| a.field.cmp(&b.field));

    Err(violations)
}

/// A typed request body that is accepted only after passing [`check`] and its own [`Validate`] rules.
pub trait BookPayload: DeserializeOwned + Validate + Sized {
    const MODE: SchemaMode;

    fn parse(value: Value) -> Result<Self, Vec<Violation>> {
        check(&value, Self::MODE)?;

        // `check` already guarantees every field the struct declares is present with a
        // matching JSON type and that no other key exists, so this only fails if
        // `BOOK_FIELDS` and the payload struct drift apart.
        let payload: Self = serde_json::from_value(value).map_err(|err| {
            tracing::error!(%err, "Payload passed the schema check but failed to deserialize");

            vec![Violation::new(
                "",
                ViolationKind::Invalid {
                    message: err.to_string(),
                },
            )]
        })?;

        payload.validate().map_err(violations_from_errors)?;

        Ok(payload)
    }
}

fn violations_from_errors(errors: ValidationErrors) -> Vec<Violation> {
    let mut violations: Vec<Violation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();

            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());

                Violation::new(field.clone(), ViolationKind::Invalid { message })
            })
        })
        .collect();

    violations.sort_by(|a, b| a.field.cmp(&b.field));

    violations
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::book::{Book, BookUpdate};

    fn full_book() -> Value {
        json!({
            "isbn": "987654321",
            "amazon_url": "https://amazon/test2",
            "author": "Eric",
            "language": "english",
            "pages": 400,
            "publisher": "Who let the dogs out! Publishers",
            "title": "Subpoena's",
            "year": 2023
        })
    }

    fn without_isbn() -> Value {
        let mut value = full_book();
        value
            .as_object_mut()
            .expect("book is an object")
            .remove("isbn");
        value
    }

    #[test]
    fn complete_book_passes_create() {
        let book = Book::parse(full_book()).expect("book is valid");

        assert_eq!(book.isbn, "987654321");
        assert_eq!(book.pages, 400);
    }

    #[test]
    fn shape_check_and_structs_agree_at_integer_bounds() {
        let mut value = full_book();
        value["year"] = json!(i32::MIN);
        value["pages"] = json!(i32::MAX);

        check(&value, SchemaMode::Create).expect("shape is valid");
        let book = Book::parse(value).expect("book deserializes");
        assert_eq!(book.year, i32::MIN);

        let mut value = without_isbn();
        value["year"] = json!(i32::MAX);

        check(&value, SchemaMode::Update).expect("shape is valid");
        let update = BookUpdate::parse(value).expect("update deserializes");
        assert_eq!(update.year, i32::MAX);
    }

    #[test]
    fn create_reports_every_missing_field() {
        let violations = check(&json!({ "year": 2000 }), SchemaMode::Create)
            .expect_err("payload is incomplete");

        let missing: Vec<&str> = violations
            .iter()
            .filter(|violation| violation.kind == ViolationKind::Missing)
            .map(|violation| violation.field.as_str())
            .collect();

        assert_eq!(
            missing,
            ["amazon_url", "author", "isbn", "language", "pages", "publisher", "title"]
        );
        assert_eq!(violations.len(), 7);
    }

    #[test]
    fn wrong_types_are_reported() {
        let mut value = full_book();
        value["pages"] = json!("four hundred");
        value["title"] = json!(42);
        value["year"] = json!(2023.5);

        let violations = check(&value, SchemaMode::Create).expect_err("types are wrong");

        assert_eq!(
            violations,
            vec![
                Violation::new(
                    "pages",
                    ViolationKind::WrongType {
                        expected: FieldType::Integer
                    }
                ),
                Violation::new(
                    "title",
                    ViolationKind::WrongType {
                        expected: FieldType::String
                    }
                ),
                Violation::new(
                    "year",
                    ViolationKind::WrongType {
                        expected: FieldType::Integer
                    }
                ),
            ]
        );
    }

    #[test]
    fn integers_outside_i32_are_wrong_type() {
        let mut value = full_book();
        value["pages"] = json!(i64::from(i32::MAX) + 1);

        let violations = check(&value, SchemaMode::Create).expect_err("pages overflows");

        assert_eq!(violations[0].field, "pages");
    }

    #[test]
    fn null_is_not_a_string() {
        let mut value = full_book();
        value["author"] = Value::Null;

        let violations = check(&value, SchemaMode::Create).expect_err("author is null");

        assert_eq!(
            violations,
            vec![Violation::new(
                "author",
                ViolationKind::WrongType {
                    expected: FieldType::String
                }
            )]
        );
    }

    #[test]
    fn update_does_not_require_isbn() {
        let update = BookUpdate::parse(without_isbn()).expect("update is valid");

        assert_eq!(update.title, "Subpoena's");
    }

    #[test]
    fn update_rejects_isbn_and_unknown_fields() {
        let mut value = full_book();
        value["invalidfield"] = json!("I AM NO VALID");

        let violations = BookUpdate::parse(value).expect_err("update has extra fields");

        assert_eq!(
            violations,
            vec![
                Violation::new("invalidfield", ViolationKind::Unknown),
                Violation::new("isbn", ViolationKind::Unknown),
            ]
        );
    }

    #[test]
    fn create_rejects_unknown_fields() {
        let mut value = full_book();
        value["invalidfield"] = json!(true);

        let violations = Book::parse(value).expect_err("create has an extra field");

        assert_eq!(
            violations,
            vec![Violation::new("invalidfield", ViolationKind::Unknown)]
        );
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        for value in [json!([]), json!("book"), json!(1), Value::Null] {
            let violations = check(&value, SchemaMode::Update).expect_err("not an object");

            assert_eq!(violations, vec![Violation::new("", ViolationKind::NotAnObject)]);
        }
    }

    #[test]
    fn value_constraints_run_after_the_shape_check() {
        let mut value = full_book();
        value["amazon_url"] = json!("not a url");
        value["pages"] = json!(0);
        value["isbn"] = json!("");

        let violations = Book::parse(value).expect_err("constraints are violated");

        assert_eq!(
            violations,
            vec![
                Violation::new(
                    "amazon_url",
                    ViolationKind::Invalid {
                        message: "Must be a valid URL".to_string()
                    }
                ),
                Violation::new(
                    "isbn",
                    ViolationKind::Invalid {
                        message: "Must not be empty".to_string()
                    }
                ),
                Violation::new(
                    "pages",
                    ViolationKind::Invalid {
                        message: "Must be at least 1".to_string()
                    }
                ),
            ]
        );
    }

    #[test]
    fn violations_serialize_flat() {
        let violation = Violation::new(
            "year",
            ViolationKind::WrongType {
                expected: FieldType::Integer,
            },
        );

        assert_eq!(
            serde_json::to_value(violation).expect("violation serializes"),
            json!({ "field": "year", "violation": "wrong_type", "expected": "integer" })
        );
    }
}
