/// OpenAPI tag for operational endpoints.
pub const SYSTEM_TAG: &str = "system";
