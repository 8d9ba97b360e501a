//! State token and PKCE S256 challenge generation
//!
//! This module produces the two unguessable values an authorization request
//! carries: the anti-CSRF `state` token echoed back by the identity
//! provider, and (for the code grant) the PKCE verifier/challenge pair
//! defined by RFC 7636 with the `S256` challenge method.
//!
//! # How PKCE works
//!
//! 1. The client generates a high-entropy random string called the
//!    `code_verifier`.
//! 2. The client computes a SHA-256 hash of the verifier and
//!    base64url-encodes it to produce the `code_challenge`.
//! 3. The authorization request includes `code_challenge` and
//!    `code_challenge_method=S256`.
//! 4. The token exchange request includes the original `code_verifier`,
//!    proving possession of the value hashed in step 2.
//!
//! Generation is pure: no I/O beyond the process's CSPRNG, no network
//! access.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use std::fmt;

use base64::Engine as _;
use rand::RngCore as _;
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// PkcePair
// ---------------------------------------------------------------------------

/// A PKCE S256 pair consisting of a verifier and its derived challenge.
///
/// Owned exclusively by the authorization request that created it, used for
/// exactly one exchange attempt, and discarded with the request regardless
/// of outcome. The verifier is redacted from `Debug` output so it can never
/// reach a log line.
///
/// # Examples
///
/// ```
/// use authflow::auth::pkce::generate_pair;
///
/// let pair = generate_pair();
/// assert_eq!(pair.method, "S256");
/// assert_eq!(pair.verifier.len(), 43);
///
/// // The verifier never appears in debug formatting.
/// let printed = format!("{:?}", pair);
/// assert!(!printed.contains(&pair.verifier));
/// ```
#[derive(Clone)]
pub struct PkcePair {
    /// The code verifier: a base64url-encoded (no padding) random string of
    /// exactly 43 characters derived from 32 random bytes. Sent to the
    /// token endpoint in the `code_verifier` parameter.
    pub verifier: String,

    /// The code challenge: the base64url-encoded (no padding) SHA-256
    /// digest of the UTF-8 representation of [`Self::verifier`]. Sent to
    /// the authorization endpoint in the `code_challenge` parameter.
    pub challenge: String,

    /// The challenge method. Always `"S256"` for pairs produced here.
    pub method: String,
}

impl fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .field("method", &self.method)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Generates a fresh anti-CSRF state token.
///
/// 32 cryptographically random bytes encoded as base64url without padding,
/// 256 bits of entropy. The value is compared byte-for-byte against the
/// `state` parameter of the redirect return.
///
/// # Examples
///
/// ```
/// use authflow::auth::pkce::generate_state;
///
/// let state = generate_state();
/// assert_eq!(state.len(), 43);
/// assert_ne!(state, generate_state());
/// ```
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a fresh PKCE S256 pair.
///
/// The verifier is 32 cryptographically random bytes encoded as a base64url
/// string without padding (43 characters, drawn entirely from the URL-safe
/// unreserved set). The challenge is the base64url-encoded SHA-256 digest
/// of the verifier string's UTF-8 bytes, as specified in RFC 7636
/// section 4.2.
pub fn generate_pair() -> PkcePair {
    // Step 1: 32 cryptographically random bytes.
    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);

    // Step 2: base64url-encode (no padding) to produce the verifier.
    let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);

    // Step 3: SHA-256 of the UTF-8 bytes of the verifier string
    //         (RFC 7636 section 4.2: BASE64URL(SHA256(ASCII(code_verifier)))).
    let digest = Sha256::digest(verifier.as_bytes());

    // Step 4: base64url-encode (no padding) the digest bytes.
    let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());

    PkcePair {
        verifier,
        challenge,
        method: "S256".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // generate_state()
    // -----------------------------------------------------------------------

    #[test]
    fn test_state_length_is_43_characters() {
        assert_eq!(
            generate_state().len(),
            43,
            "32 random bytes in base64url without padding produces 43 chars"
        );
    }

    #[test]
    fn test_state_values_are_unique() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn test_state_uses_url_safe_charset() {
        let state = generate_state();
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state must only contain base64url characters, got: {state}"
        );
    }

    // -----------------------------------------------------------------------
    // generate_pair()
    // -----------------------------------------------------------------------

    #[test]
    fn test_verifier_length_is_43_characters() {
        let pair = generate_pair();
        assert_eq!(pair.verifier.len(), 43);
    }

    #[test]
    fn test_challenge_is_correct_s256_of_verifier() {
        let pair = generate_pair();

        let digest = Sha256::digest(pair.verifier.as_bytes());
        let expected =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());

        assert_eq!(
            pair.challenge, expected,
            "challenge must equal base64url(SHA256(verifier))"
        );
    }

    #[test]
    fn test_method_is_always_s256() {
        assert_eq!(generate_pair().method, "S256");
    }

    #[test]
    fn test_successive_pairs_are_distinct() {
        let a = generate_pair();
        let b = generate_pair();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.challenge, b.challenge);
    }

    #[test]
    fn test_verifier_uses_unreserved_charset_without_padding() {
        let pair = generate_pair();
        assert!(
            pair.verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "verifier must only contain base64url characters, got: {}",
            pair.verifier
        );
        assert!(!pair.verifier.contains('='));
    }

    #[test]
    fn test_verifier_and_challenge_are_distinct() {
        let pair = generate_pair();
        assert_ne!(pair.verifier, pair.challenge);
    }

    #[test]
    fn test_debug_output_redacts_verifier() {
        let pair = generate_pair();
        let printed = format!("{pair:?}");
        assert!(printed.contains("<redacted>"));
        assert!(
            !printed.contains(&pair.verifier),
            "verifier must never appear in debug output"
        );
    }

    // -----------------------------------------------------------------------
    // Known-answer test vector
    // -----------------------------------------------------------------------

    /// Verifies the S256 recipe against the known test vector from RFC 7636
    /// Appendix B:
    ///   code_verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"
    ///   code_challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    #[test]
    fn test_s256_known_answer_rfc7636_appendix_b() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }
}
