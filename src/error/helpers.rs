use super::{BrainError, ErrorCode};

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    /// Convert to an internal BrainError with context
    fn to_internal(self, message: impl Into<String>) -> Result<T, BrainError>;

    /// Convert to a configuration BrainError with context
    fn to_config_error(self, message: impl Into<String>) -> Result<T, BrainError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_internal(self, message: impl Into<String>) -> Result<T, BrainError> {
        self.map_err(|e| BrainError::internal(message).with_source(e))
    }

    fn to_config_error(self, message: impl Into<String>) -> Result<T, BrainError> {
        self.map_err(|e| BrainError::config(message).with_source(e))
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// A required request field was not supplied
    pub fn missing_parameter(field: &str) -> BrainError {
        BrainError::invalid_parameter_with_code(
            ErrorCode::PARAM_MISSING,
            format!("Required parameter '{}' is missing", field),
            Some(field.to_string()),
        )
    }

    /// A request field could not be parsed
    pub fn malformed_parameter(field: &str, reason: impl std::fmt::Display) -> BrainError {
        BrainError::invalid_parameter_with_code(
            ErrorCode::PARAM_MALFORMED,
            format!("Parameter '{}' is malformed: {}", field, reason),
            Some(field.to_string()),
        )
    }

    pub fn task_not_found(task_id: &str) -> BrainError {
        BrainError::not_found_with_code(
            ErrorCode::NOT_FOUND_TASK,
            format!("Task '{}' was not found", task_id),
            Some(task_id.to_string()),
        )
    }

    pub fn group_not_found(group_id: &str) -> BrainError {
        BrainError::not_found_with_code(
            ErrorCode::NOT_FOUND_GROUP,
            format!("Group '{}' was not found", group_id),
            Some(group_id.to_string()),
        )
    }

    /// A task without a parent cannot carry group assignments
    pub fn parentless_task(task_id: &str) -> BrainError {
        BrainError::bad_request_with_code(
            ErrorCode::BAD_REQUEST_PARENTLESS_TASK,
            format!("Task '{}' has no parent and cannot be assigned groups", task_id),
        )
    }

    /// A group's assignedCount is zero while a task still references it
    pub fn zero_assigned_count(group_id: &str) -> BrainError {
        BrainError::internal_with_code(
            ErrorCode::INTERNAL_DATA_INTEGRITY,
            format!(
                "Group '{}' is referenced by a task but its assignedCount is 0",
                group_id
            ),
        )
    }
}
