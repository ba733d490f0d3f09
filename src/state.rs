use crate::models::StoreData;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<StoreData>>,
    // Bearer token -> user id. Sessions are process-local and die on restart.
    pub sessions: Arc<Mutex<HashMap<String, String>>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: StoreData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
