use std::path::PathBuf;
use std::time::Duration;

use crate::prompt::DEFAULT_MODEL;

/// Public chat completions proxy the service forwards questions to.
pub const DEFAULT_COMPLETIONS_URL: &str =
    "https://aiproxy.sanand.workers.dev/openai/v1/chat/completions";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Process-wide settings, read once at startup and shared by reference.
///
/// Environment:
/// - AIPROXY_TOKEN              -> bearer token for the completion endpoint
/// - COMPLETIONS_URL            -> completion endpoint override
/// - COMPLETIONS_MODEL          -> model override (default gpt-4o-mini)
/// - HTTP_TIMEOUT_SECONDS       -> overall outbound request timeout (u64)
/// - INSECURE_SKIP_TLS_VERIFY   -> 1|true|yes|on disables certificate verification
/// - SCRATCH_DIR                -> parent of per-request upload staging directories
/// - ACCEPT_BARE_CSV            -> 1|true|yes|on answers from un-zipped CSV uploads too
/// - MAX_UPLOAD_BYTES           -> request body limit for /api/ (usize)
/// - BIND_ADDR                  -> listen address (default 0.0.0.0:8000)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub completions_url: String,
    pub model: String,
    pub http_timeout: Option<Duration>,
    pub insecure_skip_tls_verify: bool,
    pub scratch_dir: PathBuf,
    pub accept_bare_csv: bool,
    pub max_upload_bytes: usize,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: None,
            completions_url: DEFAULT_COMPLETIONS_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: None,
            insecure_skip_tls_verify: false,
            scratch_dir: std::env::temp_dir().join("question2answer"),
            accept_bare_csv: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment. Unset or unparsable values keep
    /// their defaults; a missing token is not an error here and only fails at call time.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let api_token = env_non_empty("AIPROXY_TOKEN");
        if api_token.is_none() {
            tracing::warn!("AIPROXY_TOKEN is not set; completion calls will be sent without a bearer token");
        }

        let insecure_skip_tls_verify = env_truthy("INSECURE_SKIP_TLS_VERIFY");
        if insecure_skip_tls_verify {
            tracing::warn!("TLS certificate verification is DISABLED for the completion endpoint");
        }

        Self {
            api_token,
            completions_url: env_non_empty("COMPLETIONS_URL").unwrap_or(defaults.completions_url),
            model: env_non_empty("COMPLETIONS_MODEL").unwrap_or(defaults.model),
            http_timeout: env_non_empty("HTTP_TIMEOUT_SECONDS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs),
            insecure_skip_tls_verify,
            scratch_dir: env_non_empty("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            accept_bare_csv: env_truthy("ACCEPT_BARE_CSV"),
            max_upload_bytes: env_non_empty("MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_upload_bytes),
            bind_addr: env_non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Truthy: 1, true, yes, on (case-insensitive).
pub(crate) fn is_truthy(v: &str) -> bool {
    let v = v.trim().to_ascii_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}

fn env_truthy(key: &str) -> bool {
    std::env::var(key).map(|v| is_truthy(&v)).unwrap_or(false)
}
