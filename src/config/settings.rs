use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.figma.com";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub addr: SocketAddr,
    pub api_base: String,
    pub file_key: Option<String>,
    pub token: Option<String>,
    pub document_path: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Settings {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let api_base = var("FIGMA_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout_secs: u64 = var("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Self {
            port,
            addr,
            api_base,
            file_key: var("FIGMA_FILE_KEY"),
            token: var("FIGMA_TOKEN"),
            document_path: var("DOCUMENT_PATH").map(PathBuf::from),
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.port, 3000);
        assert_eq!(s.addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.file_key, None);
        assert_eq!(s.token, None);
        assert_eq!(s.document_path, None);
        assert_eq!(s.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("PORT", "8080"),
            ("FIGMA_API_BASE", "http://localhost:9000"),
            ("FIGMA_FILE_KEY", "abc123"),
            ("FIGMA_TOKEN", "  "),
            ("DOCUMENT_PATH", "fixtures/doc.json"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(s.port, 8080);
        assert_eq!(s.api_base, "http://localhost:9000");
        assert_eq!(s.file_key.as_deref(), Some("abc123"));
        assert_eq!(s.token, None);
        assert_eq!(s.document_path, Some(PathBuf::from("fixtures/doc.json")));
        assert_eq!(s.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let s = settings(&[("PORT", "http"), ("HTTP_TIMEOUT_SECS", "soon")]);
        assert_eq!(s.port, 3000);
        assert_eq!(s.http_timeout, Duration::from_secs(30));
    }
}
