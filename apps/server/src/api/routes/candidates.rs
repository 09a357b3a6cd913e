use crate::api::handlers::candidates;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(candidates::create_candidate))
        .route("/bulk", post(candidates::bulk_upload))
        .route(
            "/:id",
            get(candidates::get_candidate)
                .put(candidates::update_candidate)
                .delete(candidates::delete_candidate),
        )
}
