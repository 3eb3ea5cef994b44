use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub security_header: (String, String),
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub login_path: String,
    pub register_path: String,
    pub logout_path: String,
    pub check_path: String,
    pub refresh_path: String,
    pub profile_path: String,
    pub password_path: String,
    pub coalesce_refresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub maintenance_mode: bool,
    pub public_paths: Vec<String>,
    pub login_path: String,
    pub login_route: String,
    pub landing_route: String,
    pub maintenance_route: String,
    pub forbidden_route: String,
    pub email_verification_route: String,
    pub profile_setup_route: String,
    pub required_profile_fields: Vec<String>,
    pub max_redirects: usize,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            register_path: "/auth/register".to_string(),
            logout_path: "/auth/logout".to_string(),
            check_path: "/auth/me".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            profile_path: "/auth/profile".to_string(),
            password_path: "/auth/password".to_string(),
            coalesce_refresh: true,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            public_paths: vec!["/".to_string(), "/login".to_string(), "/cadastro".to_string()],
            login_path: "/login".to_string(),
            login_route: "Login".to_string(),
            landing_route: "Dashboard".to_string(),
            maintenance_route: "Maintenance".to_string(),
            forbidden_route: "Forbidden".to_string(),
            email_verification_route: "EmailVerification".to_string(),
            profile_setup_route: "ProfileSetup".to_string(),
            required_profile_fields: vec!["name".to_string(), "email".to_string(), "phone".to_string()],
            max_redirects: 5,
        }
    }
}

impl NavigationConfig {
    pub fn is_public_path(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.public_paths.iter().any(|p| p == path)
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COALESCE_REFRESH") {
            self.session.coalesce_refresh = v.parse().unwrap_or(self.session.coalesce_refresh);
        }

        // Navigation overrides
        if let Ok(v) = env::var("MAINTENANCE_MODE") {
            self.navigation.maintenance_mode = v.parse().unwrap_or(self.navigation.maintenance_mode);
        }
        if let Ok(v) = env::var("PUBLIC_PATHS") {
            self.navigation.public_paths = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("NAVIGATION_MAX_REDIRECTS") {
            self.navigation.max_redirects = v.parse().unwrap_or(self.navigation.max_redirects);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout_secs: 30,
                security_header: ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
                enable_request_logging: true,
            },
            session: SessionConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.agenteinvestidor.com.br/api".to_string(),
                timeout_secs: 30,
                security_header: ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
                enable_request_logging: true,
            },
            session: SessionConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.agenteinvestidor.com.br/api".to_string(),
                timeout_secs: 30,
                security_header: ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
                enable_request_logging: false,
            },
            session: SessionConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }

    /// Development preset pointed at an explicit backend, without reading env
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static ClientConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = ClientConfig::development();
        assert!(config.api.enable_request_logging);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.session.refresh_path, "/auth/refresh");
        assert!(config.session.coalesce_refresh);
        assert!(!config.navigation.maintenance_mode);
    }

    #[test]
    fn test_default_production_config() {
        let config = ClientConfig::production();
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.api.security_header.0, "X-Requested-With");
    }

    #[test]
    fn test_public_path_ignores_query() {
        let nav = NavigationConfig::default();
        assert!(nav.is_public_path("/login?redirect=%2Fdashboard"));
        assert!(nav.is_public_path("/"));
        assert!(!nav.is_public_path("/dashboard"));
    }
}
