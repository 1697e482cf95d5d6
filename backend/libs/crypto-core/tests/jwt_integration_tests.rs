/// Integration tests for crypto-core session tokens
///
/// This test module covers:
/// - Token pair issuing and validation through the public API
/// - Tampering and wrong-secret rejection
/// - Refresh token fingerprints used for server-side records
use crypto_core::hash::token_fingerprint;
use crypto_core::{TokenError, TokenIssuer, TokenKind};
use uuid::Uuid;

fn issuer() -> TokenIssuer {
    TokenIssuer::new("integration-access", "integration-refresh", 900, 604_800)
}

#[test]
fn test_pair_validates_with_matching_kinds() {
    let issuer = issuer();
    let account_id = Uuid::new_v4();
    let pair = issuer.issue_pair(account_id).unwrap();

    assert_eq!(pair.access_expires_in, 900);
    assert_eq!(pair.refresh_expires_in, 604_800);

    let access = issuer.validate(&pair.access_token, TokenKind::Access).unwrap();
    let refresh = issuer.validate(&pair.refresh_token, TokenKind::Refresh).unwrap();
    assert_eq!(access.account_id().unwrap(), account_id);
    assert_eq!(refresh.account_id().unwrap(), account_id);
    assert_ne!(access.jti, refresh.jti);
}

#[test]
fn test_access_token_rejected_as_refresh() {
    let issuer = issuer();
    let token = issuer.issue(Uuid::new_v4(), TokenKind::Access).unwrap();

    assert!(matches!(
        issuer.validate(&token, TokenKind::Refresh),
        Err(TokenError::Invalid(_))
    ));
}

#[test]
fn test_tampered_payload_rejected() {
    let issuer = issuer();
    let token = issuer.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
    let other = issuer.issue(Uuid::new_v4(), TokenKind::Access).unwrap();

    // Header and signature from one token, payload from another
    let parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

    assert!(matches!(
        issuer.validate(&forged, TokenKind::Access),
        Err(TokenError::Invalid(_))
    ));
}

#[test]
fn test_garbage_is_invalid_not_expired() {
    let result = issuer().validate("not-a-jwt", TokenKind::Access);
    assert!(matches!(result, Err(TokenError::Invalid(_))));
}

#[test]
fn test_fingerprint_is_stable_per_token() {
    let issuer = issuer();
    let pair = issuer.issue_pair(Uuid::new_v4()).unwrap();

    assert_eq!(
        token_fingerprint(&pair.refresh_token),
        token_fingerprint(&pair.refresh_token)
    );
    assert_ne!(
        token_fingerprint(&pair.refresh_token),
        token_fingerprint(&pair.access_token)
    );
}
