pub mod app;
pub mod auth;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod ranks;
pub mod reconcile;
pub mod schema;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
