pub mod auth;
pub mod error_handler;
pub mod rate_limit;
pub mod request_id;

pub use auth::{
    hash_api_key, verify_api_key, ApiKeyAuth, AuthenticatedUser, Permission, API_KEY_HEADER,
};
pub use error_handler::{
    json_config, json_error_handler, path_config, path_error_handler, query_config,
    query_error_handler,
};
pub use rate_limit::RateLimiter;
pub use request_id::{RequestId, RequestIdValue, REQUEST_ID_HEADER};
