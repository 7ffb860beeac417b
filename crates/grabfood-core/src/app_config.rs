use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Environment {
    /// Production runs log one JSON object per line; other environments use
    /// the human-readable formatter.
    #[must_use]
    pub fn json_logs(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Upper bounds for each page-interaction step of a scrape session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    /// Initial page load and the navigation triggered by the search submit.
    pub navigation_ms: u64,
    /// Location input becoming visible.
    pub input_ms: u64,
    /// Search submit button becoming visible.
    pub submit_ms: u64,
    /// First listing card becoming visible after the search.
    pub listing_ms: u64,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            input_ms: 10_000,
            submit_ms: 5_000,
            listing_ms: 20_000,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Storefront page the browser navigates to.
    pub grab_food_url: String,
    /// Substring identifying the search endpoint whose JSON response is captured.
    pub request_url: String,
    pub headless: bool,
    pub proxy_server: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub selectors_path: Option<PathBuf>,
    pub timeouts: StepTimeouts,
    pub typing_delay_ms: u64,
    /// Extra headers set on requests whose URL contains `request_url`.
    pub request_headers: BTreeMap<String, String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("grab_food_url", &self.grab_food_url)
            .field("request_url", &self.request_url)
            .field("headless", &self.headless)
            .field(
                "proxy_server",
                &self.proxy_server.as_ref().map(|_| "[redacted]"),
            )
            .field("chrome_path", &self.chrome_path)
            .field("output_path", &self.output_path)
            .field("selectors_path", &self.selectors_path)
            .field("timeouts", &self.timeouts)
            .field("typing_delay_ms", &self.typing_delay_ms)
            .field(
                "request_headers",
                &self.request_headers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
