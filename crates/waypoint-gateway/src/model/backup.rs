use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteBackupResponse {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub deleted: usize,
}
