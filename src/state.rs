use std::sync::Arc;

use crate::composer::Composer;

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<Composer>,
}

impl AppState {
    pub fn new(composer: Composer) -> Self {
        AppState {
            composer: Arc::new(composer),
        }
    }
}
