use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub mod password;

/// Claims carried in an issued bearer token. The subject is the username.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug)]
pub enum TokenError {
    /// Malformed structure, bad signature, unsupported algorithm or expired
    /// timestamp. Callers treat all of these identically.
    Invalid(String),
    EmptyKey,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::EmptyKey => write!(f, "token signing key is not configured"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and parses signed, time-bounded bearer tokens. Built once at
/// startup from config; the key and TTL are immutable afterwards and safe
/// for concurrent use.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(key: &str, ttl_secs: u64) -> Result<Self, TokenError> {
        if key.is_empty() {
            return Err(TokenError::EmptyKey);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(key.as_bytes()),
            decoding: DecodingKey::from_secret(key.as_bytes()),
            ttl: Duration::seconds(ttl_secs as i64),
        })
    }

    pub fn from_config(security: &crate::config::SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.token_key, security.token_ttl_secs)
    }

    /// Generate a signed token embedding the subject, issued now.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: self.expiration_instant(now).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Verify signature and expiration, returning the embedded subject.
    pub fn parse_subject(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(data.claims.sub)
    }

    /// TTL policy as a pure function, testable without signing round-trips.
    pub fn expiration_instant(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.ttl
    }
}
