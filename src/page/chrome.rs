use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::errors::{Result, WatchError};

use super::PageClient;

// Login form field ids on the target site.
const USERNAME_FIELD: &str = "#userid";
const PASSWORD_FIELD: &str = "#passwd";

/// Bounded wait for any element lookup; lookups never block indefinitely.
const ELEMENT_WAIT: Duration = Duration::from_secs(10);
/// The site redirects after the Enter-key login; give it time to land.
const POST_LOGIN_WAIT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A live authenticated browser context, parked on the watched page.
/// Dropping it closes the Chrome process.
pub struct ChromeSession {
    tab: Arc<Tab>,
    _browser: Browser,
}

/// `PageClient` over a locally launched Chrome.
pub struct ChromePageClient {
    config: WatchConfig,
}

impl ChromePageClient {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }

    fn launch(&self) -> Result<Browser> {
        let user_agent_arg = format!("--user-agent={}", USER_AGENT);

        let args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--start-maximized"),
            // The site rejects logins that look automated.
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new(&user_agent_arg),
        ];

        let launch_options = LaunchOptions::default_builder()
            .headless(self.config.headless)
            .args(args)
            .build()
            .map_err(|e| WatchError::Session(format!("launch options: {}", e)))?;

        Browser::new(launch_options)
            .map_err(|e| WatchError::Session(format!("browser launch failed: {}", e)))
    }
}

#[async_trait]
impl PageClient for ChromePageClient {
    type Session = ChromeSession;

    async fn establish(&mut self) -> Result<ChromeSession> {
        info!("Launching Chrome and logging in at {}", self.config.login_url);

        // `browser` and `tab` are plain locals here, so every early return
        // below drops them and closes Chrome.
        let browser = self.launch()?;
        let tab = browser
            .new_tab()
            .map_err(|e| WatchError::Session(format!("tab creation failed: {}", e)))?;
        tab.set_default_timeout(ELEMENT_WAIT);

        tab.navigate_to(self.config.login_url.as_str())
            .map_err(|e| WatchError::Session(format!("login page unreachable: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| WatchError::Session(format!("login page did not load: {}", e)))?;

        tab.wait_for_element(USERNAME_FIELD)
            .map_err(|e| WatchError::Session(format!("login id field not found: {}", e)))?
            .type_into(&self.config.credentials.username)
            .map_err(|e| WatchError::Session(format!("typing login id failed: {}", e)))?;
        tab.wait_for_element(PASSWORD_FIELD)
            .map_err(|e| WatchError::Session(format!("password field not found: {}", e)))?
            .type_into(&self.config.credentials.password)
            .map_err(|e| WatchError::Session(format!("typing password failed: {}", e)))?;
        tab.press_key("Enter")
            .map_err(|e| WatchError::Session(format!("login submit failed: {}", e)))?;

        tokio::time::sleep(POST_LOGIN_WAIT).await;

        info!("Navigating to watched page {}", self.config.target_url);
        tab.navigate_to(self.config.target_url.as_str())
            .map_err(|e| WatchError::Session(format!("watched page unreachable: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| WatchError::Session(format!("watched page did not load: {}", e)))?;

        // The watched fragment must be present, otherwise the login was
        // rejected and we landed somewhere else.
        tab.wait_for_element(&self.config.selector).map_err(|e| {
            WatchError::Session(format!("watched element missing after login: {}", e))
        })?;

        Ok(ChromeSession {
            tab,
            _browser: browser,
        })
    }

    async fn refresh(&mut self, session: &ChromeSession) -> Result<()> {
        session
            .tab
            .reload(false, None)
            .map_err(|e| WatchError::Page(format!("refresh failed: {}", e)))?;
        Ok(())
    }

    async fn extract_text(&mut self, session: &ChromeSession) -> Result<String> {
        let element = session
            .tab
            .wait_for_element(&self.config.selector)
            .map_err(|e| WatchError::Page(format!("watched element not found: {}", e)))?;

        element
            .get_inner_text()
            .map_err(|e| WatchError::Page(format!("text extraction failed: {}", e)))
    }

    async fn release(&mut self, session: ChromeSession) {
        debug!("Closing Chrome session");
        drop(session);
    }
}
