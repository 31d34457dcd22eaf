//! Fleet operations behind the HTTP handlers.
//!
//! Each service function receives its collaborators explicitly (the
//! [`examhall_db::FleetStore`], the [`crate::storage::ObjectStore`], the
//! current instant) so it can be driven from tests without a server.

pub mod devices;
pub mod files;
pub mod heartbeat;
pub mod liveness;
pub mod reports;
pub mod tasks;
