//! Stateless math captcha for the public contact form.
//!
//! The challenge token is a keyed SHA-256 over the expected answer, so
//! verification needs no server-side session: the submitted answer is
//! hashed the same way and compared against the token. Replay within a
//! process lifetime is accepted; this gates form spam, not credentials.

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

/// A challenge to present to the visitor alongside the contact form.
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaChallenge {
    pub question: String,
    pub token: String,
}

pub struct CaptchaSigner {
    secret: String,
}

impl CaptchaSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Read `CAPTCHA_SECRET` from the environment. Without it a random
    /// per-process secret is generated; issued tokens then expire on
    /// restart.
    pub fn from_env() -> Self {
        match std::env::var("CAPTCHA_SECRET") {
            Ok(secret) if !secret.is_empty() => Self::new(secret),
            _ => {
                warn!("CAPTCHA_SECRET not set, using a per-process random secret");
                Self::new(Uuid::new_v4().simple().to_string())
            }
        }
    }

    /// Generate a fresh small-arithmetic challenge. Subtraction operands
    /// are ordered so the answer is never negative.
    pub fn challenge(&self) -> CaptchaChallenge {
        let mut rng = rand::thread_rng();
        let a: i64 = rng.gen_range(2..=9);
        let b: i64 = rng.gen_range(2..=9);

        let (question, answer) = match rng.gen_range(0..3) {
            0 => (format!("What is {} + {}?", a, b), a + b),
            1 => {
                let (high, low) = (a.max(b), a.min(b));
                (format!("What is {} - {}?", high, low), high - low)
            }
            _ => (format!("What is {} x {}?", a, b), a * b),
        };

        CaptchaChallenge {
            question,
            token: self.sign(answer),
        }
    }

    /// Check a submitted answer against the token it was issued with.
    pub fn verify(&self, answer: i64, token: &str) -> bool {
        self.sign(answer) == token
    }

    fn sign(&self, answer: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(answer.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
