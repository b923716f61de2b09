use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::ResetConfig;
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// Stateless password-reset tokens.
///
/// A token is `{timestamp_base36}-{hmac_hex}` where the MAC covers the
/// user's id, current password hash, and last login. Changing the
/// password or logging in alters that state and invalidates every
/// previously issued token, so nothing is persisted server-side.
#[derive(Clone)]
pub struct ResetTokenGenerator {
    key: Vec<u8>,
    timeout_seconds: i64,
}

impl ResetTokenGenerator {
    pub fn new(secret: &str, config: &ResetConfig) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            timeout_seconds: config.timeout_seconds,
        }
    }

    pub fn make_token(&self, user: &User) -> Result<String, anyhow::Error> {
        self.make_token_at(user, Utc::now().timestamp())
    }

    fn make_token_at(&self, user: &User, timestamp: i64) -> Result<String, anyhow::Error> {
        let ts_b36 = base36_encode(timestamp);
        let mac_hex = self.signature(user, timestamp)?;
        Ok(format!("{}-{}", ts_b36, mac_hex))
    }

    /// Verify a token against the user's current state and the validity window.
    pub fn check_token(&self, user: &User, token: &str) -> bool {
        let Some((ts_b36, mac_hex)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = base36_decode(ts_b36) else {
            return false;
        };
        let Ok(expected) = self.signature(user, timestamp) else {
            return false;
        };

        if expected.as_bytes().ct_eq(mac_hex.as_bytes()).unwrap_u8() != 1 {
            return false;
        }

        let age = Utc::now().timestamp() - timestamp;
        age >= 0 && age <= self.timeout_seconds
    }

    fn signature(&self, user: &User, timestamp: i64) -> Result<String, anyhow::Error> {
        let last_login = user
            .last_login
            .map(|dt| dt.timestamp().to_string())
            .unwrap_or_default();
        let payload = format!(
            "{}:{}:{}:{}",
            user.user_id, user.password_hash, last_login, timestamp
        );

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("Invalid HMAC key: {}", e))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Encode a user id for use in reset URLs.
pub fn encode_uid(user_id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

/// Decode a reset-URL uid back into a user id.
pub fn decode_uid(uid: &str) -> Option<Uuid> {
    let bytes = URL_SAFE_NO_PAD.decode(uid).ok()?;
    let s = String::from_utf8(bytes).ok()?;
    Uuid::parse_str(&s).ok()
}

fn base36_encode(mut n: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    // DIGITS is ASCII
    String::from_utf8(out).unwrap_or_default()
}

fn base36_decode(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    i64::from_str_radix(s, 36).ok()
}
