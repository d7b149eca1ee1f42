use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use meridian_core::Tx;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    check_tx, commit, extend_vote, finalize_block, info, init_chain, prepare_proposal,
    process_proposal, query, verify_vote_extension, ServerState,
};

/// One POST route per protocol method, JSON in and out
pub fn create_router<T: Tx>(state: Arc<ServerState<T>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/info", post(info::<T>))
        .route("/query", post(query::<T>))
        .route("/check_tx", post(check_tx::<T>))
        .route("/init_chain", post(init_chain::<T>))
        .route("/prepare_proposal", post(prepare_proposal::<T>))
        .route("/process_proposal", post(process_proposal::<T>))
        .route("/extend_vote", post(extend_vote::<T>))
        .route("/verify_vote_extension", post(verify_vote_extension::<T>))
        .route("/finalize_block", post(finalize_block::<T>))
        .route("/commit", post(commit::<T>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
