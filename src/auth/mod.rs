use std::sync::Arc;

pub mod middleware;
pub mod model;
pub mod service;

pub type Service = Arc<dyn service::AuthService + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing or invalid credentials")]
    Unauthenticated,
}
