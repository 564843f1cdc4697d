use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Category and role administration. Mounted under `/admin` behind the
/// authentication layer; each handler requires the matching admin-only action.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/categories
        .route("/categories", post(handlers::create_category))
        // PUT/DELETE /admin/categories/{id}
        // Deleting a category detaches its articles instead of removing them.
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // GET/POST /admin/roles
        .route("/roles", get(handlers::list_roles).post(handlers::create_role))
        // DELETE /admin/roles/{id}
        // Refused while any profile still holds the role.
        .route("/roles/{id}", axum::routing::delete(handlers::delete_role))
        // PUT /admin/accounts/{id}/role
        .route("/accounts/{id}/role", put(handlers::assign_role))
}
