pub mod error;
pub mod ipc;
pub mod model;
pub mod notify;
pub mod relations;
pub mod store;
pub mod summary;
