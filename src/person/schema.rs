use thiserror::Error;

use super::Person;

/// A single rule violation on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// All violations found on one record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Person validation failed: {}", list(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn list(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field rules every stored person must satisfy.
///
/// Both backends run these on insert and on the merged record of an update.
#[derive(Debug, Clone, Default)]
pub struct PersonSchema;

impl PersonSchema {
    pub fn validate(&self, person: &Person) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        for (field, value) in [("name", &person.name), ("number", &person.number)] {
            if value.trim().is_empty() {
                violations.push(FieldViolation {
                    field,
                    message: "is required".to_string(),
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonId;

    fn person(name: &str, number: &str) -> Person {
        Person {
            id: PersonId::generate(),
            name: name.to_string(),
            number: number.to_string(),
        }
    }

    #[test]
    fn test_valid_person() {
        assert!(PersonSchema.validate(&person("Mary Poppendieck", "39-23-6423122")).is_ok());
    }

    #[test]
    fn test_number_has_no_format_rule() {
        assert!(PersonSchema.validate(&person("Dan Abramov", "call me maybe")).is_ok());
    }

    #[test]
    fn test_reports_every_failing_field() {
        let err = PersonSchema.validate(&person("", " ")).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert_eq!(
            err.to_string(),
            "Person validation failed: name: is required, number: is required"
        );
    }

    #[test]
    fn test_single_violation_message() {
        let err = PersonSchema.validate(&person("Ada Lovelace", "")).unwrap_err();
        assert_eq!(
            err.violations,
            vec![FieldViolation {
                field: "number",
                message: "is required".to_string(),
            }]
        );
        assert_eq!(err.to_string(), "Person validation failed: number: is required");
    }
}
