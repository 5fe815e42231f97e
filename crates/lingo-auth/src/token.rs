use std::time::{Duration, SystemTime};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lingo_types::claim::TimeLimited;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// Issues and validates HS256 signed bearer tokens.
pub struct TokenManager {
    keys: Keys,
    default_validity: Duration,
    header: Header,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>, default_validity: Duration) -> Self {
        Self {
            keys: Keys::new(secret),
            default_validity,
            header: Header::default(),
            validation: Validation::default(),
        }
    }

    pub fn issue(&self, claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        self.issue_until(claims, SystemTime::now() + self.default_validity)
    }

    fn issue_until(
        &self,
        mut claims: impl serde::Serialize + TimeLimited,
        until: SystemTime,
    ) -> Result<String> {
        claims.set_validity(until);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    #[cfg(test)]
    pub fn issue_expired(&self, claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        self.issue_until(claims, SystemTime::now() - self.default_validity)
    }

    pub fn validate<T>(&self, token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = decode::<T>(token, &self.keys.decoding, &self.validation).inspect_err(|e| {
            debug!("Token rejected: {e}");
        })?;
        Ok(data.claims)
    }

    pub fn default_validity(&self) -> Duration {
        self.default_validity
    }
}
