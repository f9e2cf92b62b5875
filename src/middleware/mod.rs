pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{bearer_token, identity_middleware};
pub use extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
pub use response::{ApiResponse, ApiResult};
