use std::sync::Arc;

pub mod service;
pub mod store;
pub mod subscription;

pub type Broker = Arc<dyn subscription::ClientBroker + Send + Sync>;
