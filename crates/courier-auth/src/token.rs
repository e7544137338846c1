// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cached bearer token and its on-disk representation.

use std::time::Duration;

use chrono::TimeDelta;
use courier_core::Timestamp;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// A bearer token plus the instant it stops being valid.
///
/// `refresh_token` is set once the token endpoint has rotated the refresh token;
/// it replaces the configured one until a later response rotates it again.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: SecretString,
    pub expires_at: Timestamp,
    pub refresh_token: Option<SecretString>,
}

impl CachedToken {
    /// True while `now < expires_at - margin`.
    pub fn is_fresh(&self, now: Timestamp, margin: Duration) -> bool {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        match self.expires_at.checked_sub_signed(margin) {
            Some(deadline) => now < deadline,
            None => false,
        }
    }

    pub(crate) fn to_stored(&self) -> StoredToken {
        StoredToken {
            access_token: self.access_token.expose_secret().to_string(),
            expires_at: self.expires_at,
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        }
    }
}

/// Serialized form written to the token cache file.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredToken {
    access_token: String,
    expires_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl From<StoredToken> for CachedToken {
    fn from(stored: StoredToken) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            expires_at: stored.expires_at,
            refresh_token: stored.refresh_token.map(SecretString::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn token_expiring_at(expires_at: Timestamp) -> CachedToken {
        CachedToken {
            access_token: SecretString::from("at-1".to_string()),
            expires_at,
            refresh_token: None,
        }
    }

    #[test]
    fn token_inside_margin_is_stale() {
        let expires = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let token = token_expiring_at(expires);
        let margin = Duration::from_secs(120);

        assert!(token.is_fresh(expires - TimeDelta::seconds(121), margin));
        assert!(!token.is_fresh(expires - TimeDelta::seconds(120), margin));
        assert!(!token.is_fresh(expires - TimeDelta::seconds(30), margin));
        assert!(!token.is_fresh(expires + TimeDelta::seconds(1), margin));
    }

    #[test]
    fn debug_output_hides_token() {
        let token = token_expiring_at(Utc::now());
        assert!(!format!("{token:?}").contains("at-1"));
    }

    #[test]
    fn stored_form_round_trips_rotated_refresh_token() {
        let token = CachedToken {
            refresh_token: Some(SecretString::from("rt-2".to_string())),
            ..token_expiring_at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        };
        let json = serde_json::to_string(&token.to_stored()).unwrap();
        let back: CachedToken = serde_json::from_str::<StoredToken>(&json).unwrap().into();

        assert_eq!(back.access_token.expose_secret(), "at-1");
        assert_eq!(back.expires_at, token.expires_at);
        assert_eq!(
            back.refresh_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("rt-2".to_string())
        );
    }
}
