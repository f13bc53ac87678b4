//! Turns `validator` reports into the single message a client sees.

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Rule precedence within one field: a missing value is reported before an empty one, an
/// empty one before a malformed one.
const RULE_ORDER: [&str; 3] = ["required", "length", "email"];

/// Validate `command`, reporting the first violation in `fields` order.
pub(crate) fn check<T: Validate>(command: &T, fields: &[&str]) -> Result<(), String> {
    command
        .validate()
        .map_err(|errors| first_violation(&errors, fields))
}

fn first_violation(errors: &ValidationErrors, fields: &[&str]) -> String {
    fields
        .iter()
        .find_map(|field| match errors.errors().get(*field) {
            Some(ValidationErrorsKind::Field(violations)) => violations
                .iter()
                .min_by_key(|violation| {
                    RULE_ORDER
                        .iter()
                        .position(|rule| *rule == violation.code)
                        .unwrap_or(RULE_ORDER.len())
                })
                .map(|violation| match &violation.message {
                    Some(message) => message.to_string(),
                    None => format!("Parameter '{field}' is not valid"),
                }),
            _ => None,
        })
        .unwrap_or_else(|| errors.to_string())
}
