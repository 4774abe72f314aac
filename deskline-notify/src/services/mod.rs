pub mod registry;
pub mod sync_engine;

pub use registry::ShownToastRegistry;
pub use sync_engine::{EngineSettings, NotificationEngine};
