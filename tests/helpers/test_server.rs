// Test server helpers
//
// `spawn_test_server` runs the full middleware stack over a real database;
// `contract_app` builds the same routes in-process with an injected caller.

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error, HttpMessage,
};
use erp_juridico::core::BusinessCalendar;
use erp_juridico::middleware::{
    self, ApiKeyAuth, AuthenticatedUser, Permission, RequestId, API_KEY_HEADER,
};
use sqlx::MySqlPool;

pub use actix_test::TestServer;

/// Full application (auth included) on a random port
pub fn spawn_test_server(pool: MySqlPool) -> TestServer {
    actix_test::start(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(BusinessCalendar::default()))
            .app_data(middleware::json_config())
            .app_data(middleware::path_config())
            .app_data(middleware::query_config())
            .wrap(ApiKeyAuth::new(pool.clone()))
            .wrap(RequestId)
            .configure(erp_juridico::configure_routes)
    })
}

/// Client request carrying the caller's API key
pub fn with_api_key(request: awc::ClientRequest, key: &str) -> awc::ClientRequest {
    request.insert_header((API_KEY_HEADER, key))
}

/// Caller with the given role and permissions
pub fn test_user(role: &str, permissions: &[Permission]) -> AuthenticatedUser {
    AuthenticatedUser {
        key_id: "test-key".to_string(),
        user_name: format!("test-{}", role),
        role: role.to_string(),
        permissions: permissions.to_vec(),
    }
}

/// All routes with `user` already authenticated; `None` leaves the request anonymous
pub fn contract_app(
    pool: MySqlPool,
    user: Option<AuthenticatedUser>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(pool))
        .app_data(web::Data::new(BusinessCalendar::default()))
        .app_data(middleware::json_config())
        .app_data(middleware::path_config())
        .app_data(middleware::query_config())
        .wrap_fn(move |req, srv| {
            if let Some(user) = user.clone() {
                req.extensions_mut().insert(user);
            }
            srv.call(req)
        })
        .configure(erp_juridico::configure_routes)
}
