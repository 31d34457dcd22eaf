//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) where the entity can be patched

pub mod attendance;
pub mod device;
pub mod heartbeat;
pub mod task;
