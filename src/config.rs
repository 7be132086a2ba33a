//! Credential configuration.

/// Environment variables searched for an API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Supplies the API key used for generation requests.
pub trait CredentialProvider: Send + Sync {
    /// Returns the key, or `None` when none is configured.
    fn api_key(&self) -> Option<String>;

    /// Describes where the key is looked up, for error messages.
    fn source(&self) -> String;
}

/// Reads the key from environment variables on every lookup.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    vars: Vec<String>,
}

impl EnvCredentials {
    /// Looks up the given variables in order.
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(API_KEY_ENV_VARS)
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        self.vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    fn source(&self) -> String {
        self.vars.join(" or ")
    }
}

/// A fixed key, or a fixed absence of one.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    key: Option<String>,
}

impl StaticCredentials {
    /// Uses the given key; blank keys count as missing.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            key: (!key.trim().is_empty()).then(|| key.trim().to_string()),
        }
    }

    /// A provider that never has a key.
    pub fn missing() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        self.key.clone()
    }

    fn source(&self) -> String {
        "the --api-key option".to_string()
    }
}
