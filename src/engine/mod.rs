pub mod config;
pub mod error;
pub mod scheduler;
pub mod settings;
pub mod timing;

pub use config::{AppConfig, PacingConfig};
pub use error::{FaultKind, FlowError, FlowResult};
pub use scheduler::{Clock, FrameScheduler, ManualClock, Scheduler, SystemClock, TickHandle};
pub use settings::{SettingKey, Settings, SettingsStore, Subscription};
