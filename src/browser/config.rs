use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{BrowserSettings, ProxySettings};

/// Configuration for browser instances
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Navigation and element-wait timeout in seconds
    pub timeout_secs: u64,

    /// Disable image rendering for performance
    pub disable_images: bool,

    /// Pause after navigation and pagination rounds
    pub settle_delay_ms: u64,

    /// Outbound proxy for all page traffic
    pub proxy: Option<ProxyConfig>,
}

/// Proxy endpoint plus optional credentials. Chrome takes the endpoint as a
/// command-line switch; credentials need an injected helper extension because
/// --proxy-server carries no auth.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn from_settings(settings: &ProxySettings) -> Self {
        Self {
            server: settings.server.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }

    pub fn to_chrome_arg(&self) -> String {
        format!("--proxy-server={}", self.server)
    }

    pub fn requires_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// reqwest-side mirror of the same proxy, so downloads exit through the
    /// same address the browser does.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, reqwest::Error> {
        let url = if self.server.contains("://") {
            self.server.clone()
        } else {
            format!("http://{}", self.server)
        };
        let mut proxy = reqwest::Proxy::all(&url)?;
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        Ok(proxy)
    }

    /// Writes a throwaway MV2 extension that answers the proxy auth challenge,
    /// returning its directory for --load-extension.
    pub fn write_auth_extension(&self) -> std::io::Result<PathBuf> {
        let (user, pass) = match (&self.username, &self.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "proxy has no credentials",
                ))
            }
        };

        let dir = std::env::temp_dir().join(format!("proxy_auth_ext_{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;

        let manifest = r#"{
  "manifest_version": 2,
  "name": "Proxy Auth",
  "version": "1.0",
  "permissions": ["webRequest", "webRequestBlocking", "<all_urls>"],
  "background": { "scripts": ["background.js"] }
}"#;
        std::fs::File::create(dir.join("manifest.json"))?.write_all(manifest.as_bytes())?;

        let background = format!(
            r#"chrome.webRequest.onAuthRequired.addListener(
  function(details) {{
    return {{ authCredentials: {{ username: "{}", password: "{}" }} }};
  }},
  {{ urls: ["<all_urls>"] }},
  ["blocking"]
);"#,
            user.replace('"', "\\\""),
            pass.replace('"', "\\\"")
        );
        std::fs::File::create(dir.join("background.js"))?.write_all(background.as_bytes())?;

        Ok(dir)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            timeout_secs: 30,
            disable_images: true,
            settle_delay_ms: 1500,
            proxy: None,
        }
    }
}

impl BrowserConfig {
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            headless: settings.headless,
            window_size: (settings.window_width, settings.window_height),
            user_agent: settings
                .user_agent
                .clone()
                .or_else(|| BrowserConfig::default().user_agent),
            timeout_secs: settings.timeout_secs,
            disable_images: settings.disable_images,
            settle_delay_ms: settings.settle_delay_ms,
            proxy: settings.proxy.as_ref().map(ProxyConfig::from_settings),
        }
    }

    /// Configuration for debugging (non-headless, images visible)
    pub fn debug_mode() -> Self {
        let mut config = Self::default();
        config.headless = false;
        config.disable_images = false;
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.user_agent.is_some());
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_debug_mode() {
        let config = BrowserConfig::debug_mode();
        assert!(!config.headless);
        assert!(!config.disable_images);
    }

    #[test]
    fn test_proxy_chrome_arg() {
        let proxy = ProxyConfig {
            server: "127.0.0.1:8080".to_string(),
            username: None,
            password: None,
        };
        assert_eq!(proxy.to_chrome_arg(), "--proxy-server=127.0.0.1:8080");
        assert!(!proxy.requires_auth());
    }

    #[test]
    fn test_auth_extension_files() {
        let proxy = ProxyConfig {
            server: "127.0.0.1:8080".to_string(),
            username: Some("user".to_string()),
            password: Some("pa\"ss".to_string()),
        };
        assert!(proxy.requires_auth());
        let dir = proxy.write_auth_extension().unwrap();
        let background = std::fs::read_to_string(dir.join("background.js")).unwrap();
        assert!(background.contains("onAuthRequired"));
        assert!(background.contains("pa\\\"ss"));
        assert!(dir.join("manifest.json").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_auth_extension_requires_credentials() {
        let proxy = ProxyConfig {
            server: "127.0.0.1:8080".to_string(),
            username: None,
            password: None,
        };
        assert!(proxy.write_auth_extension().is_err());
    }
}
