pub mod attendance;
pub mod core;
pub mod dashboard;
pub mod entities;
pub mod relations;
