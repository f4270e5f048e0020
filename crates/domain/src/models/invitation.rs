//! Invitation domain models and code generation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Longest lifetime an invitation may be created with.
pub const MAX_LIFETIME_DAYS: i64 = 3650;

/// Highest redemption ceiling an invitation may be created with.
pub const MAX_USES_LIMIT: i32 = 10_000;

/// Symbols used in invitation codes. Avoids the confusable 0, O, 1 and I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Re-roll budget when a generated code collides with an active one.
pub const MAX_CODE_ATTEMPTS: u32 = 100;

/// A revocable, time- and use-limited registration token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    pub id: Uuid,
    pub code: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_uses: i32,
    pub use_count: i32,
    pub active: bool,
}

impl Invitation {
    /// Builds a fresh, unused invitation expiring `lifetime_days` after `now`.
    ///
    /// Parameters are assumed to be validated by the caller.
    pub fn new(
        code: String,
        label: Option<String>,
        now: DateTime<Utc>,
        lifetime_days: i64,
        max_uses: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            label,
            created_at: now,
            expires_at: now + Duration::days(lifetime_days),
            max_uses,
            use_count: 0,
            active: true,
        }
    }

    /// Checks expiry and use count at `now`.
    ///
    /// Revocation is not checked here: revoked invitations are invisible to
    /// code lookups and surface as [`Rejection::NotFound`] there.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), Rejection> {
        if now >= self.expires_at {
            return Err(Rejection::Expired);
        }
        if self.use_count >= self.max_uses {
            return Err(Rejection::Exhausted);
        }
        Ok(())
    }

    /// Derived lifecycle state at `now`.
    pub fn status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if !self.active {
            return InvitationStatus::Revoked;
        }
        match self.check_redeemable(now) {
            Ok(()) => InvitationStatus::Active,
            Err(Rejection::Expired) => InvitationStatus::Expired,
            Err(_) => InvitationStatus::Exhausted,
        }
    }

    pub fn remaining_uses(&self) -> i32 {
        (self.max_uses - self.use_count).max(0)
    }

    /// Consumes one use. Callers must have checked redeemability first.
    pub fn record_use(&mut self) {
        debug_assert!(self.use_count < self.max_uses);
        self.use_count += 1;
    }

    pub fn revoke(&mut self) {
        self.active = false;
    }
}

/// Lifecycle state of an invitation, as shown to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Active,
    Expired,
    Exhausted,
    Revoked,
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Active => write!(f, "active"),
            InvitationStatus::Expired => write!(f, "expired"),
            InvitationStatus::Exhausted => write!(f, "exhausted"),
            InvitationStatus::Revoked => write!(f, "revoked"),
        }
    }
}

/// Why a code cannot be redeemed. These are expected outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("Invitation not found")]
    NotFound,

    #[error("Invitation has expired")]
    Expired,

    #[error("Invitation has reached its maximum number of uses")]
    Exhausted,
}

impl Rejection {
    /// Stable machine-readable reason, used in logs and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::NotFound => "not_found",
            Rejection::Expired => "expired",
            Rejection::Exhausted => "exhausted",
        }
    }
}

/// An invitation together with its derived status, for admin listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub status: InvitationStatus,
    pub remaining_uses: i32,
}

impl InvitationView {
    pub fn at(invitation: Invitation, now: DateTime<Utc>) -> Self {
        let status = invitation.status(now);
        let remaining_uses = invitation.remaining_uses();
        Self {
            invitation,
            status,
            remaining_uses,
        }
    }
}

/// Request to create a new invitation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvitationRequest {
    /// Free-text note about who the invitation is for.
    #[validate(length(max = 200, message = "label must be at most 200 characters"))]
    pub label: Option<String>,

    /// Days until expiry, up to [`MAX_LIFETIME_DAYS`]. Defaults from
    /// configuration when omitted.
    #[validate(range(
        min = 0,
        max = MAX_LIFETIME_DAYS,
        message = "lifetime_days is out of range"
    ))]
    pub lifetime_days: Option<i64>,

    /// Maximum redemptions, up to [`MAX_USES_LIMIT`]. Defaults from
    /// configuration when omitted.
    #[validate(range(min = 1, max = MAX_USES_LIMIT, message = "max_uses is out of range"))]
    pub max_uses: Option<i32>,
}

/// What an unauthenticated visitor learns about a valid code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicInvitationInfo {
    pub code: String,
    pub label: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub remaining_uses: i32,
}

impl From<&Invitation> for PublicInvitationInfo {
    fn from(invitation: &Invitation) -> Self {
        Self {
            code: invitation.code.clone(),
            label: invitation.label.clone(),
            expires_at: invitation.expires_at,
            remaining_uses: invitation.remaining_uses(),
        }
    }
}

/// Error returned when no free code could be found.
#[derive(Debug, Error)]
#[error("Could not generate a unique invitation code after {0} attempts")]
pub struct CodeSpaceExhausted(pub u32);

/// Generate a random invitation code in XXX-XXX-XXX format.
pub fn generate_invitation_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let mut generate_segment = || -> String {
        (0..3)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    };

    format!(
        "{}-{}-{}",
        generate_segment(),
        generate_segment(),
        generate_segment()
    )
}

/// Generates codes until one is not taken, giving up after
/// [`MAX_CODE_ATTEMPTS`] tries.
pub fn generate_unique_code<F>(is_taken: F) -> Result<String, CodeSpaceExhausted>
where
    F: Fn(&str) -> bool,
{
    generate_unique_code_with(generate_invitation_code, is_taken)
}

fn generate_unique_code_with<G, F>(generator: G, is_taken: F) -> Result<String, CodeSpaceExhausted>
where
    G: Fn() -> String,
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generator();
        if !is_taken(&code) {
            return Ok(code);
        }
    }
    Err(CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
}

/// Canonical form of a user-typed code: trimmed and uppercased.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::collections::HashSet;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn invitation(lifetime_days: i64, max_uses: i32) -> Invitation {
        Invitation::new(
            "ABC-DEF-GHJ".to_string(),
            None,
            t0(),
            lifetime_days,
            max_uses,
        )
    }

    #[test]
    fn test_new_invitation_fields() {
        let inv = invitation(7, 3);
        assert_eq!(inv.created_at, t0());
        assert_eq!(inv.expires_at, t0() + Duration::days(7));
        assert_eq!(inv.use_count, 0);
        assert!(inv.active);
        assert_ne!(inv.id, invitation(7, 3).id);
    }

    #[test]
    fn test_expiry_boundaries() {
        let inv = invitation(7, 1);
        let deadline = t0() + Duration::days(7);

        assert_eq!(inv.check_redeemable(deadline - Duration::seconds(1)), Ok(()));
        assert_eq!(inv.check_redeemable(deadline), Err(Rejection::Expired));
        assert_eq!(
            inv.check_redeemable(deadline + Duration::seconds(1)),
            Err(Rejection::Expired)
        );
    }

    #[test]
    fn test_zero_lifetime_is_expired_immediately() {
        let inv = invitation(0, 1);
        assert_eq!(inv.expires_at, inv.created_at);
        assert_eq!(inv.check_redeemable(t0()), Err(Rejection::Expired));
    }

    #[test]
    fn test_expired_takes_precedence_over_exhausted() {
        let mut inv = invitation(1, 1);
        inv.record_use();
        assert_eq!(inv.check_redeemable(t0()), Err(Rejection::Exhausted));
        assert_eq!(
            inv.check_redeemable(t0() + Duration::days(2)),
            Err(Rejection::Expired)
        );
    }

    #[test]
    fn test_status_transitions() {
        let mut inv = invitation(7, 2);
        assert_eq!(inv.status(t0()), InvitationStatus::Active);

        inv.record_use();
        assert_eq!(inv.status(t0()), InvitationStatus::Active);
        assert_eq!(inv.remaining_uses(), 1);

        inv.record_use();
        assert_eq!(inv.status(t0()), InvitationStatus::Exhausted);
        assert_eq!(inv.remaining_uses(), 0);
        assert_eq!(
            inv.status(t0() + Duration::days(8)),
            InvitationStatus::Expired
        );

        inv.revoke();
        assert_eq!(inv.status(t0()), InvitationStatus::Revoked);
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(Rejection::NotFound.reason(), "not_found");
        assert_eq!(Rejection::Expired.reason(), "expired");
        assert_eq!(Rejection::Exhausted.reason(), "exhausted");
        assert_eq!(
            serde_json::to_string(&Rejection::Exhausted).unwrap(),
            "\"exhausted\""
        );
    }

    #[test]
    fn test_view_serializes_flat() {
        let view = InvitationView::at(invitation(7, 2), t0());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["code"], "ABC-DEF-GHJ");
        assert_eq!(json["status"], "active");
        assert_eq!(json["remaining_uses"], 2);
    }

    #[test]
    fn test_generate_invitation_code_format() {
        let code = generate_invitation_code();
        assert_eq!(code.len(), 11);
        for (i, c) in code.chars().enumerate() {
            if i == 3 || i == 7 {
                assert_eq!(c, '-');
            } else {
                assert!(CODE_ALPHABET.contains(&(c as u8)), "Invalid char: {}", c);
            }
        }
    }

    #[test]
    fn test_generate_unique_code_never_repeats() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let code = generate_unique_code(|c| seen.contains(c)).unwrap();
            assert!(seen.insert(code));
        }
        assert_eq!(seen.len(), 10_000);
    }

    #[test]
    fn test_generate_unique_code_rerolls_on_collision() {
        let calls = Cell::new(0);
        let generator = || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                "AAA-AAA-AAA".to_string()
            } else {
                "BBB-BBB-BBB".to_string()
            }
        };

        let code = generate_unique_code_with(generator, |c| c == "AAA-AAA-AAA").unwrap();
        assert_eq!(code, "BBB-BBB-BBB");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_generate_unique_code_gives_up() {
        let result = generate_unique_code_with(|| "AAA-AAA-AAA".to_string(), |_| true);
        assert!(matches!(result, Err(CodeSpaceExhausted(MAX_CODE_ATTEMPTS))));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  abc-def-ghj\n"), "ABC-DEF-GHJ");
        assert_eq!(normalize_code("ABC-DEF-GHJ"), "ABC-DEF-GHJ");
    }

    #[test]
    fn test_create_invitation_request_validation() {
        let valid = CreateInvitationRequest {
            label: Some("For Alice".to_string()),
            lifetime_days: Some(0),
            max_uses: Some(1),
        };
        assert!(valid.validate().is_ok());
        assert!(CreateInvitationRequest::default().validate().is_ok());

        let no_uses = CreateInvitationRequest {
            max_uses: Some(0),
            ..Default::default()
        };
        assert!(no_uses.validate().is_err());

        let negative_lifetime = CreateInvitationRequest {
            lifetime_days: Some(-1),
            ..Default::default()
        };
        assert!(negative_lifetime.validate().is_err());
    }

    #[test]
    fn test_create_invitation_request_limits() {
        let at_limits = CreateInvitationRequest {
            label: None,
            lifetime_days: Some(MAX_LIFETIME_DAYS),
            max_uses: Some(MAX_USES_LIMIT),
        };
        assert!(at_limits.validate().is_ok());

        let too_long = CreateInvitationRequest {
            lifetime_days: Some(MAX_LIFETIME_DAYS + 1),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());

        let too_many = CreateInvitationRequest {
            max_uses: Some(MAX_USES_LIMIT + 1),
            ..Default::default()
        };
        assert!(too_many.validate().is_err());
    }
}
