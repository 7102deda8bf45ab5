pub mod health_service;
pub mod inbox_service;
pub mod ingest_service;
pub mod retention_service;
