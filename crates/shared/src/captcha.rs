//! Stateless arithmetic captcha for the public booking and contact forms.
//!
//! A challenge is a small sum or difference. The operands travel inside an
//! HMAC-signed token so the server keeps no per-challenge state:
//!
//! ```text
//! base64url("a:op:b:expires_unix") "." hex(hmac_sha256(secret, payload))
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::crypto::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

/// Largest operand used in a challenge.
const MAX_OPERAND: i32 = 10;

/// Error type for captcha verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptchaError {
    #[error("Captcha token is malformed")]
    Malformed,

    #[error("Captcha token signature is invalid")]
    BadSignature,

    #[error("Captcha has expired")]
    Expired,

    #[error("Captcha answer is incorrect")]
    WrongAnswer,
}

/// Arithmetic operator of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }

    fn from_symbol(c: &str) -> Option<Self> {
        match c {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            _ => None,
        }
    }

    fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
        }
    }
}

/// A challenge handed to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaChallenge {
    pub token: String,
    pub question: String,
    pub expires_at: i64,
}

/// Issues and verifies signed captcha tokens.
#[derive(Clone)]
pub struct CaptchaSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for CaptchaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaSigner")
            .field("ttl_secs", &self.ttl_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl CaptchaSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    /// Issues a new random challenge.
    pub fn issue(&self) -> CaptchaChallenge {
        let mut rng = rand::thread_rng();
        let op = if rng.gen_bool(0.5) {
            Operator::Add
        } else {
            Operator::Subtract
        };
        let x = rng.gen_range(1..=MAX_OPERAND);
        let y = rng.gen_range(1..=MAX_OPERAND);
        // Keep subtraction results non-negative
        let (a, b) = match op {
            Operator::Subtract if y > x => (y, x),
            _ => (x, y),
        };
        self.issue_with(a, op, b, Utc::now().timestamp())
    }

    /// Issues a challenge with fixed operands.
    pub fn issue_with(&self, a: i32, op: Operator, b: i32, now: i64) -> CaptchaChallenge {
        let expires_at = now + self.ttl_secs;
        let payload = format!("{}:{}:{}:{}", a, op.symbol(), b, expires_at);
        let signature = self.sign(payload.as_bytes());
        CaptchaChallenge {
            token: format!("{}.{}", URL_SAFE_NO_PAD.encode(payload.as_bytes()), signature),
            question: format!("What is {} {} {}?", a, op.symbol(), b),
            expires_at,
        }
    }

    /// Verifies an answer against a token using the current time.
    pub fn verify(&self, token: &str, answer: &str) -> Result<(), CaptchaError> {
        self.verify_at(token, answer, Utc::now().timestamp())
    }

    /// Verifies an answer against a token at the given unix time.
    pub fn verify_at(&self, token: &str, answer: &str, now: i64) -> Result<(), CaptchaError> {
        let (encoded, signature) = token.split_once('.').ok_or(CaptchaError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| CaptchaError::Malformed)?;

        let expected = self.sign(&payload);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(CaptchaError::BadSignature);
        }

        let payload = String::from_utf8(payload).map_err(|_| CaptchaError::Malformed)?;
        let parts: Vec<&str> = payload.split(':').collect();
        if parts.len() != 4 {
            return Err(CaptchaError::Malformed);
        }
        let a: i32 = parts[0].parse().map_err(|_| CaptchaError::Malformed)?;
        let op = Operator::from_symbol(parts[1]).ok_or(CaptchaError::Malformed)?;
        let b: i32 = parts[2].parse().map_err(|_| CaptchaError::Malformed)?;
        let expires_at: i64 = parts[3].parse().map_err(|_| CaptchaError::Malformed)?;

        if now > expires_at {
            return Err(CaptchaError::Expired);
        }

        let given: i32 = answer
            .trim()
            .parse()
            .map_err(|_| CaptchaError::WrongAnswer)?;
        if given != op.apply(a, b) {
            return Err(CaptchaError::WrongAnswer);
        }
        Ok(())
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}
