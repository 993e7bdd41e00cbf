use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_BASE_URL: &str = "https://culearn.carleton.ca/moodle";
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 20;

/// Fixed paths and names of the remote portal.
#[derive(Debug, Clone)]
pub struct Portal {
    pub login_url: String,
    pub courses_url: String,
    pub grade_report_url: String,
    pub session_cookie: String,
    pub success_marker: String,
}

impl Portal {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Portal {
            login_url: format!("{}/login/index.php", base),
            courses_url: format!("{}/my/", base),
            grade_report_url: format!("{}/grade/report/user/index.php", base),
            session_cookie: "MoodleSession".to_string(),
            success_marker: "testsession".to_string(),
        }
    }
}

impl Default for Portal {
    fn default() -> Self {
        Portal::new(DEFAULT_BASE_URL)
    }
}

/// What to do when a single course cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(anyhow!("unknown course failure policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub portal: Portal,
    pub login_timeout: Duration,
    pub on_course_error: FailurePolicy,
    pub username: Option<String>,
    pub password: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Reads the configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("CULEARN_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let login_timeout = match lookup("CULEARN_LOGIN_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("CULEARN_LOGIN_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_LOGIN_TIMEOUT_SECS,
        };

        let on_course_error = match lookup("CULEARN_ON_COURSE_ERROR") {
            Some(raw) => raw.parse().context("Invalid CULEARN_ON_COURSE_ERROR")?,
            None => FailurePolicy::default(),
        };

        Ok(Config {
            portal: Portal::new(&base_url),
            login_timeout: Duration::from_secs(login_timeout),
            on_course_error,
            username: lookup("CULEARN_USERNAME").filter(|s| !s.is_empty()),
            password: lookup("CULEARN_PASSWORD"),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
