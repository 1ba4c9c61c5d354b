//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.
//! Credentials are read once, at startup, and passed to the clients that
//! need them. A missing inference key is not an error here; it surfaces as
//! `CapabilityError::MissingCredential` on the first capability call.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// Environment variable holding the inference API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const SEMANTIC_SCHOLAR_API_KEY: &str = "SEMANTIC_SCHOLAR_API_KEY";
pub const NCBI_API_KEY: &str = "NCBI_API_KEY";

/// Model used when `OPENAI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in a request header).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Every credential the judge can use. All optional.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Inference backend key; checked lazily by the capability client
    pub openai_api_key: Option<SecretString>,

    /// Model identifier
    pub openai_model: String,

    /// API base URL override
    pub openai_base_url: Option<String>,

    /// Raises the Semantic Scholar rate limit when present
    pub semantic_scholar_api_key: Option<SecretString>,

    /// Raises the PubMed E-utilities rate limit when present
    pub ncbi_api_key: Option<SecretString>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read credentials through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: get(OPENAI_API_KEY).map(SecretString::from),
            openai_model: get(OPENAI_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get(OPENAI_BASE_URL),
            semantic_scholar_api_key: get(SEMANTIC_SCHOLAR_API_KEY).map(SecretString::from),
            ncbi_api_key: get(NCBI_API_KEY).map(SecretString::from),
        }
    }

    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(SecretString::new(key));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Whether the inference key is configured.
    pub fn has_inference_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("semantic_scholar_api_key", &redact(&self.semantic_scholar_api_key))
            .field("ncbi_api_key", &redact(&self.ncbi_api_key))
            .finish()
    }
}
