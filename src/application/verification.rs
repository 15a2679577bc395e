//! Pending login verification codes.
//!
//! Codes live in a bounded LRU store with a fixed time to live. Issuing a
//! code for a subject replaces any pending one; a successful verification
//! consumes it. The least recently touched subjects are evicted once the
//! store is full.

use std::{num::NonZeroUsize, sync::Mutex};

use lru::LruCache;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::lock::mutex_lock;

pub const DEFAULT_CODE_TTL: Duration = Duration::minutes(10);
pub const DEFAULT_CAPACITY: usize = 1024;

const TARGET: &str = "folio::verification";
const CODE_MIN: u128 = 100_000;
const CODE_SPAN: u128 = 900_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no verification code is pending for this subject")]
    NotFound,
    #[error("verification code does not match")]
    Mismatch,
    #[error("verification code has expired")]
    Expired,
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct VerificationCodes {
    ttl: Duration,
    entries: Mutex<LruCache<String, PendingCode>>,
}

impl Default for VerificationCodes {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_TTL, NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl VerificationCodes {
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, TARGET, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issue a fresh six-digit code for `subject`.
    pub fn issue(&self, subject: &str) -> String {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, subject: &str, now: OffsetDateTime) -> String {
        let code = generate_code();
        let pending = PendingCode {
            code: code.clone(),
            expires_at: now + self.ttl,
        };

        let mut entries = mutex_lock(&self.entries, TARGET, "issue");
        let evicted = entries
            .push(subject.to_string(), pending)
            .filter(|(key, _)| key != subject);
        drop(entries);

        if let Some((evicted, _)) = evicted {
            debug!(target = TARGET, evicted = %evicted, "evicted pending code at capacity");
        }
        info!(target = TARGET, "verification code issued");
        code
    }

    pub fn verify(&self, subject: &str, code: &str) -> Result<(), VerificationError> {
        self.verify_at(subject, code, OffsetDateTime::now_utc())
    }

    /// Check `code` against the pending code for `subject`.
    ///
    /// A mismatch keeps the pending code so the user can retry. An expired
    /// code is dropped. A match consumes the code.
    pub fn verify_at(
        &self,
        subject: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<(), VerificationError> {
        let mut entries = mutex_lock(&self.entries, TARGET, "verify");
        let pending = entries.peek(subject).ok_or(VerificationError::NotFound)?;

        if !codes_match(&pending.code, code.trim()) {
            debug!(target = TARGET, "verification code mismatch");
            return Err(VerificationError::Mismatch);
        }

        if now > pending.expires_at {
            entries.pop(subject);
            debug!(target = TARGET, "verification code expired");
            return Err(VerificationError::Expired);
        }

        entries.pop(subject);
        Ok(())
    }

    /// Drop every code past its expiry. Returns how many were removed.
    pub fn purge_expired_at(&self, now: OffsetDateTime) -> usize {
        let mut entries = mutex_lock(&self.entries, TARGET, "purge");
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, pending)| now > pending.expires_at)
            .map(|(subject, _)| subject.clone())
            .collect();

        for subject in &expired {
            entries.pop(subject);
        }

        if !expired.is_empty() {
            debug!(target = TARGET, purged = expired.len(), "purged expired codes");
        }
        expired.len()
    }
}

fn generate_code() -> String {
    let value = CODE_MIN + Uuid::new_v4().as_u128() % CODE_SPAN;
    value.to_string()
}

fn codes_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn store(capacity: usize) -> VerificationCodes {
        VerificationCodes::new(
            Duration::minutes(10),
            NonZeroUsize::new(capacity).expect("capacity"),
        )
    }

    #[test]
    fn codes_are_six_digits() {
        let codes = store(4);
        for _ in 0..50 {
            let code = codes.issue("a@example.com");
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
        assert_eq!(codes.len(), 1);
    }

    #[test]
    fn successful_verification_is_single_use() {
        let codes = store(4);
        let now = datetime!(2026-01-01 12:00 UTC);
        let code = codes.issue_at("a@example.com", now);

        assert_eq!(codes.verify_at("a@example.com", &code, now), Ok(()));
        assert_eq!(
            codes.verify_at("a@example.com", &code, now),
            Err(VerificationError::NotFound)
        );
    }

    #[test]
    fn mismatch_keeps_pending_code() {
        let codes = store(4);
        let now = datetime!(2026-01-01 12:00 UTC);
        let code = codes.issue_at("a@example.com", now);
        let wrong = if code == "123456" { "654321" } else { "123456" };

        assert_eq!(
            codes.verify_at("a@example.com", wrong, now),
            Err(VerificationError::Mismatch)
        );
        assert_eq!(codes.verify_at("a@example.com", &code, now), Ok(()));
    }

    #[test]
    fn expired_code_is_removed() {
        let codes = store(4);
        let issued = datetime!(2026-01-01 12:00 UTC);
        let code = codes.issue_at("a@example.com", issued);

        let boundary = issued + Duration::minutes(10);
        assert_eq!(codes.len(), 1);
        assert_eq!(
            codes.verify_at("a@example.com", &code, boundary + Duration::seconds(1)),
            Err(VerificationError::Expired)
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn reissue_replaces_previous_code() {
        let codes = store(4);
        let now = datetime!(2026-01-01 12:00 UTC);
        let first = codes.issue_at("a@example.com", now);
        let mut second = codes.issue_at("a@example.com", now);
        while second == first {
            second = codes.issue_at("a@example.com", now);
        }

        assert_eq!(
            codes.verify_at("a@example.com", &first, now),
            Err(VerificationError::Mismatch)
        );
        assert_eq!(codes.verify_at("a@example.com", &second, now), Ok(()));
    }

    #[test]
    fn capacity_evicts_least_recent_subject() {
        let codes = store(2);
        let now = datetime!(2026-01-01 12:00 UTC);
        let first = codes.issue_at("first", now);
        codes.issue_at("second", now);
        codes.issue_at("third", now);

        assert_eq!(codes.len(), 2);
        assert_eq!(
            codes.verify_at("first", &first, now),
            Err(VerificationError::NotFound)
        );
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let codes = store(4);
        let early = datetime!(2026-01-01 12:00 UTC);
        codes.issue_at("old", early);
        codes.issue_at("fresh", early + Duration::minutes(8));

        assert_eq!(codes.purge_expired_at(early + Duration::minutes(11)), 1);
        assert_eq!(codes.len(), 1);
    }
}
