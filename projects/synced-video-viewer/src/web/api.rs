use crate::plot::figure::Figure;
use crate::web::state::{AppState, ViewerInfo};
use axum::{extract::State, Json};
use std::sync::Arc;

/// Handler for GET /api/figure
pub async fn get_figure(State(state): State<Arc<AppState>>) -> Json<Figure> {
    Json(state.figure.clone())
}

/// Handler for GET /api/info
pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<ViewerInfo> {
    Json(state.info.clone())
}

/// Handler for GET /api/keys, the mapped sync keys in ascending order
pub async fn get_keys(State(state): State<Arc<AppState>>) -> Json<Vec<i64>> {
    Json(state.keys.clone())
}
