// Infrastructure adapters implementing the application ports

pub mod diagnostics;
pub mod event_store;
