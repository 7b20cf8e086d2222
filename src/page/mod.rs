mod chrome;

pub use chrome::{ChromePageClient, ChromeSession};

use async_trait::async_trait;

use crate::errors::Result;

/// Driver for the authenticated page under watch. Exactly one session is live
/// at a time, owned by the monitor.
#[async_trait]
pub trait PageClient: Send {
    type Session: Send;

    /// Log in and land on the watched page. Any partially constructed browser
    /// state is released before an error returns.
    async fn establish(&mut self) -> Result<Self::Session>;

    /// Reload the watched page in place.
    async fn refresh(&mut self, session: &Self::Session) -> Result<()>;

    /// Extract the watched text fragment from the current DOM.
    async fn extract_text(&mut self, session: &Self::Session) -> Result<String>;

    /// Tear the session down. Idempotent; never fails observably.
    async fn release(&mut self, session: Self::Session);
}
