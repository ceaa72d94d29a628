//! Banner selection engine: UCB1 scoring over rotation statistics, the
//! read-select-persist cycle that serves a banner, and click/show recording.

pub mod coordinator;
pub mod recorder;
pub mod service;
pub mod ucb1;

pub use coordinator::RotationCoordinator;
pub use recorder::EventRecorder;
pub use service::RotationService;
