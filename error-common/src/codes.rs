// Standardized error codes returned in API error bodies

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const TOKEN_INVALID: &str = "AUTH_2003";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const INSUFFICIENT_PERMISSIONS: &str = "AUTHZ_3002";
}

pub mod database {
    pub const CONNECTION_FAILED: &str = "DB_4001";
    pub const QUERY_FAILED: &str = "DB_4002";
    pub const CONSTRAINT_VIOLATION: &str = "DB_4003";
    pub const FOREIGN_KEY_VIOLATION: &str = "DB_4004";
}

pub mod business {
    pub const NOT_FOUND: &str = "BIZ_5001";
    pub const INVALID_STATE_TRANSITION: &str = "BIZ_5002";
    pub const DUPLICATE_RECORD: &str = "BIZ_5003";
    pub const OVER_ALLOCATION: &str = "BIZ_5004";
    pub const UNBALANCED_VOUCHER: &str = "BIZ_5005";
}

pub mod system {
    pub const INTERNAL: &str = "SYS_9001";
    pub const CONFIGURATION: &str = "SYS_9002";
    pub const SERVICE_UNAVAILABLE: &str = "SYS_9003";
}
