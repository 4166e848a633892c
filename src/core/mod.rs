pub mod cache;
pub mod config;
pub mod error;

pub use cache::{global_cache, ModelCache, ModelOptions};
pub use config::{ChartConfig, ChartKind, DeviceConfig, InspectConfig, DEFAULT_HYPOTHESIS_TEMPLATE};
pub use error::{InspectError, Result};
