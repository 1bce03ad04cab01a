use proptest::prelude::*;
use quotakeeper::domain::errors::DomainError;
use quotakeeper::domain::models::{DesiredQuota, ObservedQuota, QuotaIdentity, IDENTITY_SEPARATOR};
use quotakeeper::services::{diff, ChangeDirection};

fn code() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9-]{0,15}"
}

proptest! {
    /// Property: decode(encode(id)) == id for any valid pair of codes
    #[test]
    fn prop_encode_decode_round_trip(service in code(), quota in code()) {
        let identity = QuotaIdentity::new(service, quota).unwrap();
        let decoded = QuotaIdentity::decode(&identity.encode()).unwrap();
        prop_assert_eq!(decoded, identity);
    }

    /// Property: a token without the separator never decodes
    #[test]
    fn prop_token_without_separator_is_malformed(token in code()) {
        let result = QuotaIdentity::decode(&token);
        prop_assert!(
            matches!(result, Err(DomainError::MalformedIdentity { .. })),
            "expected MalformedIdentity"
        );
    }

    /// Property: more than one separator never decodes
    #[test]
    fn prop_extra_separators_are_malformed(parts in prop::collection::vec(code(), 3..6)) {
        let token = parts.join(&IDENTITY_SEPARATOR.to_string());
        let result = QuotaIdentity::decode(&token);
        prop_assert!(
            matches!(result, Err(DomainError::MalformedIdentity { .. })),
            "expected MalformedIdentity"
        );
    }

    /// Property: an empty half never decodes
    #[test]
    fn prop_empty_half_is_malformed(part in code(), leading in any::<bool>()) {
        let token = if leading {
            format!("{IDENTITY_SEPARATOR}{part}")
        } else {
            format!("{part}{IDENTITY_SEPARATOR}")
        };
        prop_assert!(QuotaIdentity::decode(&token).is_err());
    }

    /// Property: a whitespace-only half never decodes
    #[test]
    fn prop_blank_half_is_malformed(part in code(), blank in "[ \t]{1,4}", leading in any::<bool>()) {
        let token = if leading {
            format!("{blank}{IDENTITY_SEPARATOR}{part}")
        } else {
            format!("{part}{IDENTITY_SEPARATOR}{blank}")
        };
        prop_assert!(
            matches!(QuotaIdentity::decode(&token), Err(DomainError::MalformedIdentity { .. })),
            "expected MalformedIdentity"
        );
    }

    /// Property: a declared value at or below the observed one is never actionable
    #[test]
    fn prop_no_increase_when_observed_meets_desired(
        desired in 1.0f64..1e6,
        headroom in 0.0f64..1e6,
    ) {
        let identity = QuotaIdentity::new("vpc", "L-F678F1CE").unwrap();
        let want = DesiredQuota::new(identity.clone(), desired).unwrap();
        let observed = ObservedQuota::new(identity, desired + headroom);

        let change = diff(&want, &observed);
        prop_assert!(change.is_noop());
        prop_assert!(change.delta <= 0.0);
    }

    /// Property: a declared value above the observed one always needs an increase
    #[test]
    fn prop_increase_when_desired_exceeds_observed(
        observed in 0.0f64..1e6,
        step in 1.0f64..1e6,
    ) {
        let identity = QuotaIdentity::new("vpc", "L-F678F1CE").unwrap();
        let want = DesiredQuota::new(identity.clone(), observed + step).unwrap();
        let current = ObservedQuota::new(identity, observed);

        let change = diff(&want, &current);
        prop_assert!(change.needs_increase);
        prop_assert_eq!(change.direction, ChangeDirection::Increase);
        prop_assert!(change.delta > 0.0);
    }
}
