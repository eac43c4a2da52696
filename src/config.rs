use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CONTENT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_elapsed: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(10),
            max_attempts: Some(60),
            max_elapsed: Some(Duration::from_secs(15 * 60)),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = PollConfig::default();
        let interval = env::var("GENSTUDIO_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|raw| parse_interval(&raw))
            .unwrap_or(defaults.interval);
        let max_attempts = match env::var("GENSTUDIO_POLL_MAX_ATTEMPTS").ok() {
            Some(raw) if raw == "0" || raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => raw.parse().ok().or(defaults.max_attempts),
            None => defaults.max_attempts,
        };
        let max_elapsed = match env::var("GENSTUDIO_POLL_MAX_ELAPSED_SECS").ok() {
            Some(raw) if raw == "0" || raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .map(Duration::from_secs)
                .or(defaults.max_elapsed),
            None => defaults.max_elapsed,
        };

        PollConfig {
            interval,
            max_attempts,
            max_elapsed,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_max_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_elapsed = Some(elapsed);
        self
    }

    /// Polls until the job finishes, however long that takes.
    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self.max_elapsed = None;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub content: String,
    pub image: String,
    pub video: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            content: DEFAULT_CONTENT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            video: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub api_base: String,
    pub credential_path: PathBuf,
    pub request_timeout: Option<Duration>,
    pub models: ModelConfig,
    pub poll: PollConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            credential_path: default_credential_path(),
            request_timeout: Some(Duration::from_secs(120)),
            models: ModelConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = StudioConfig::default();
        let api_base = env::var("GENSTUDIO_API_BASE")
            .ok()
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or(defaults.api_base);
        let credential_path = env::var("GENSTUDIO_CREDENTIAL_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.credential_path);
        let request_timeout = env::var("GENSTUDIO_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .or(defaults.request_timeout);

        let mut models = ModelConfig::default();
        if let Ok(model) = env::var("GENSTUDIO_CONTENT_MODEL") {
            models.content = model;
        }
        if let Ok(model) = env::var("GENSTUDIO_IMAGE_MODEL") {
            models.image = model;
        }
        if let Ok(model) = env::var("GENSTUDIO_VIDEO_MODEL") {
            models.video = model;
        }

        StudioConfig {
            api_base,
            credential_path,
            request_timeout,
            models,
            poll: PollConfig::from_env(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_models(mut self, models: ModelConfig) -> Self {
        self.models = models;
        self
    }
}

/// Positive, finite seconds that fit in a `Duration`; anything else is rejected.
fn parse_interval(raw: &str) -> Option<Duration> {
    let secs = raw.trim().parse::<f64>().ok().filter(|secs| *secs > 0.0)?;
    Duration::try_from_secs_f64(secs).ok()
}

fn default_credential_path() -> PathBuf {
    let base = env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| env::var("HOME").ok().map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("genstudio").join("credentials.json")
}
