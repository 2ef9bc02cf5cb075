/// Settings for the diagnostic tool. The extraction pipeline itself takes
/// no configuration; everything here concerns logging and page fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}
