/// Error code registry for brain-service
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Invalid parameter errors
/// - 3000-3999: Bad request (semantic) errors
/// - 4000-4999: Not found errors
/// - 5000-5999: Internal errors
/// - 6000-6999: Upstream errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_INVALID_URL: u16 = 1004;

    // Invalid parameter errors (2000-2999)
    pub const PARAM_GENERIC: u16 = 2000;
    pub const PARAM_MISSING: u16 = 2001;
    pub const PARAM_MALFORMED: u16 = 2002;
    pub const PARAM_UNKNOWN_STATISTICS_TYPE: u16 = 2003;
    pub const PARAM_DUPLICATE_GROUP: u16 = 2004;

    // Bad request errors (3000-3999)
    pub const BAD_REQUEST_GENERIC: u16 = 3000;
    pub const BAD_REQUEST_PARENTLESS_TASK: u16 = 3001;
    pub const BAD_REQUEST_GROUP_NOT_ASSIGNED: u16 = 3002;
    pub const BAD_REQUEST_TASK_HAS_CHILDREN: u16 = 3003;

    // Not found errors (4000-4999)
    pub const NOT_FOUND_GENERIC: u16 = 4000;
    pub const NOT_FOUND_TASK: u16 = 4001;
    pub const NOT_FOUND_GROUP: u16 = 4002;

    // Internal errors (5000-5999)
    pub const INTERNAL_GENERIC: u16 = 5000;
    pub const INTERNAL_DATA_INTEGRITY: u16 = 5001;
    pub const INTERNAL_COUNTER_UPDATE_FAILED: u16 = 5002;
    pub const INTERNAL_PERSIST_AFTER_COUNTER: u16 = 5003;

    // Upstream errors (6000-6999)
    pub const UPSTREAM_GENERIC: u16 = 6000;
    pub const UPSTREAM_UNREACHABLE: u16 = 6001;
    pub const UPSTREAM_STATUS: u16 = 6002;
    pub const UPSTREAM_DECODE: u16 = 6003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",
        1004 => "Invalid service URL in configuration",

        2000 => "Invalid parameter",
        2001 => "Required parameter is missing",
        2002 => "Parameter is malformed",
        2003 => "Unknown statistics type",
        2004 => "Duplicate group id in task groups",

        3000 => "Bad request",
        3001 => "Task has no parent and cannot carry groups",
        3002 => "Group is not assigned to the task",
        3003 => "Task still has sub tasks",

        4000 => "Resource not found",
        4001 => "Task not found",
        4002 => "Group not found",

        5000 => "Internal error",
        5001 => "Data integrity violation",
        5002 => "Assigned count update failed",
        5003 => "Task persist failed after assigned count update",

        6000 => "Upstream service error",
        6001 => "Upstream service unreachable",
        6002 => "Upstream service returned an error status",
        6003 => "Upstream response could not be decoded",

        _ => "Unknown error code",
    }
}
