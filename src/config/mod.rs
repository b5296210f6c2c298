use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    /// Read `window.ENV`, falling back to [`DEFAULT_API_URL`].
    pub fn new() -> Self {
        // We support BOTH `window.ENV.API_URL` and `window.ENV.api_url`.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(v) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url) = v.as_string() {
                                if let Some(api_url) = normalize_api_url(&url) {
                                    return Self { api_url };
                                }
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim whitespace and trailing slashes; blank means "not configured".
pub(crate) fn normalize_api_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(
            normalize_api_url(" https://board.example/ ").as_deref(),
            Some("https://board.example")
        );
        assert_eq!(
            normalize_api_url("http://localhost:3000").as_deref(),
            Some("http://localhost:3000")
        );
        assert!(normalize_api_url("  ").is_none());
        assert!(normalize_api_url("/").is_none());
    }
}
