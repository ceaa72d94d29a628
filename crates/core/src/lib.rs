pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use config::AppConfig;
pub use error::{RotationError, RotationResult};
pub use types::{Banner, EntityKind, Event, EventType, Group, Rotation, RotationKey, Slot};
