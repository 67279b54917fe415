use std::sync::Arc;

use tb_core::traits::{AuthProvider, BoardRepo};

/// State shared across all request handlers.
///
/// Cheap to clone; the ports live behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<dyn BoardRepo>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(boards: Arc<dyn BoardRepo>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { boards, auth }
    }
}
