pub mod config;
pub mod errors;
pub mod monitor;
pub mod notify;
pub mod page;
pub mod store;

pub use config::WatchConfig;
pub use errors::{Result, WatchError};
pub use monitor::{ChangeMonitor, MonitorTiming, PollOutcome};
pub use notify::{Notifier, TelegramNotifier};
pub use page::{ChromePageClient, PageClient};
pub use store::{FileSnapshotStore, SnapshotStore};
