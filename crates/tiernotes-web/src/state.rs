use tiernotes_core::Pipeline;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pipeline: Pipeline,
}
