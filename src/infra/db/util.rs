use sqlx::error::{DatabaseError, ErrorKind};

use crate::application::repos::RepoError;

/// Postgres `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";
/// Postgres class 22, data exceptions (bad text representation, out-of-range values).
const DATA_EXCEPTION_CLASS: &str = "22";

/// Translate a sqlx error into a [`RepoError`]. Database messages stay in the error chain
/// for logs; the variants carry only fixed, client-safe text.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => map_database_error(db.as_ref()),
        other => RepoError::from_persistence(other),
    }
}

fn map_database_error(db: &dyn DatabaseError) -> RepoError {
    let code = db.code();
    classify(db.kind(), code.as_deref(), db.constraint())
        .unwrap_or_else(|| RepoError::from_persistence(db.message()))
}

fn classify(kind: ErrorKind, code: Option<&str>, constraint: Option<&str>) -> Option<RepoError> {
    let constraint = constraint.unwrap_or("unknown").to_string();
    match kind {
        ErrorKind::UniqueViolation => Some(RepoError::Duplicate { constraint }),
        ErrorKind::ForeignKeyViolation => Some(RepoError::Integrity {
            message: format!("referenced record does not exist ({constraint})"),
        }),
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => Some(RepoError::Integrity {
            message: format!("constraint `{constraint}` violated"),
        }),
        _ => match code {
            Some(QUERY_CANCELED) => Some(RepoError::Timeout),
            Some(code) if code.starts_with(DATA_EXCEPTION_CLASS) => {
                Some(RepoError::InvalidInput {
                    message: "Invalid input".to_string(),
                })
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepoError::NotFound
        ));
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            RepoError::Timeout
        ));
    }

    #[test]
    fn other_errors_become_persistence() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            RepoError::Persistence(_)
        ));
    }

    #[test]
    fn constraint_violations_use_fixed_messages() {
        assert!(matches!(
            classify(ErrorKind::UniqueViolation, Some("23505"), Some("activities_pkey")),
            Some(RepoError::Duplicate { constraint }) if constraint == "activities_pkey"
        ));

        let Some(RepoError::Integrity { message }) = classify(
            ErrorKind::ForeignKeyViolation,
            Some("23503"),
            Some("todos_activity_group_id_fkey"),
        ) else {
            panic!("foreign key violation should map to an integrity error");
        };
        assert_eq!(
            message,
            "referenced record does not exist (todos_activity_group_id_fkey)"
        );
    }

    #[test]
    fn sqlstate_codes_classify_the_rest() {
        assert!(matches!(
            classify(ErrorKind::Other, Some("57014"), None),
            Some(RepoError::Timeout)
        ));
        assert!(matches!(
            classify(ErrorKind::Other, Some("22P02"), None),
            Some(RepoError::InvalidInput { message }) if message == "Invalid input"
        ));
        assert!(classify(ErrorKind::Other, Some("40001"), None).is_none());
    }
}
