use std::future::ready;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::ingest;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct State {
    pub store: Arc<dyn RecordStore + Send + Sync>,
}

async fn index() -> &'static str {
    "dedup"
}

pub fn router<S: RecordStore + Send + Sync + 'static>(store: S, metrics: bool) -> Router {
    let state = State {
        store: Arc::new(store),
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/add-data", post(ingest::add_data))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when dedup is used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
