pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::recommender::RecommenderService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommenderService>,
}

impl AppState {
    pub fn new(recommender: Arc<RecommenderService>) -> Self {
        Self { recommender }
    }
}
