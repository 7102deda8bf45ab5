use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub deleted: u64,
}
