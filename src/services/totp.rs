use base32::Alphabet;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

const STEP_SECS: i64 = 30;
const DIGITS: u32 = 6;
const SECRET_BYTES: usize = 20;

/// RFC 6238 time-based one-time codes for the optional second factor.
#[derive(Clone)]
pub struct TotpService {
    issuer: String,
}

impl TotpService {
    pub fn new(issuer: &str) -> Self {
        TotpService {
            issuer: issuer.to_string(),
        }
    }

    /// Generates a fresh shared secret, base32-encoded without padding.
    pub fn generate_secret(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        base32::encode(Alphabet::RFC4648 { padding: false }, &bytes)
    }

    /// True iff `code` matches the current time window, with +/- one step of
    /// skew tolerance. Malformed codes and undecodable secrets are simply
    /// false, never an error.
    pub fn verify_code(&self, secret: &str, code: &str) -> bool {
        self.verify_code_at(secret, code, chrono::Utc::now().timestamp())
    }

    pub fn provisioning_uri(&self, email: &str, secret: &str) -> String {
        format!(
            "otpauth://totp/{issuer}:{email}?secret={secret}&issuer={issuer}",
            issuer = self.issuer,
            email = email,
            secret = secret
        )
    }

    fn verify_code_at(&self, secret: &str, code: &str, unix_time: i64) -> bool {
        if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let key = match base32::decode(Alphabet::RFC4648 { padding: false }, secret) {
            Some(key) if !key.is_empty() => key,
            _ => return false,
        };

        let counter = unix_time / STEP_SECS;
        (-1..=1)
            .filter_map(|skew| counter.checked_add(skew))
            .filter(|c| *c >= 0)
            .any(|c| hotp(&key, c as u64) == code)
    }
}

fn hotp(key: &[u8], counter: u64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);

    format!("{:0width$}", binary % 10u32.pow(DIGITS), width = DIGITS as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B secret ("12345678901234567890") in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc6238_sha1_vector() {
        // T = 59 -> 8-digit reference value 94287082, truncated to 6 digits.
        let totp = TotpService::new("fintrack");
        assert!(totp.verify_code_at(RFC_SECRET, "287082", 59));
    }

    #[test]
    fn accepts_adjacent_time_steps_only() {
        let totp = TotpService::new("fintrack");

        // Code for the window containing T=59 is still valid one step later
        // but not two steps later.
        assert!(totp.verify_code_at(RFC_SECRET, "287082", 59 + 30));
        assert!(!totp.verify_code_at(RFC_SECRET, "287082", 59 + 90));
    }

    #[test]
    fn code_from_another_secret_is_rejected() {
        let totp = TotpService::new("fintrack");
        let other = totp.generate_secret();
        let code = hotp(
            &base32::decode(Alphabet::RFC4648 { padding: false }, &other).unwrap(),
            59 / 30,
        );

        assert!(!totp.verify_code_at(RFC_SECRET, &code, 59));
    }

    #[test]
    fn malformed_codes_are_false_not_errors() {
        let totp = TotpService::new("fintrack");

        assert!(!totp.verify_code_at(RFC_SECRET, "", 59));
        assert!(!totp.verify_code_at(RFC_SECRET, "12345", 59));
        assert!(!totp.verify_code_at(RFC_SECRET, "12a456", 59));
        assert!(!totp.verify_code_at("%%%not-base32%%%", "123456", 59));
    }

    #[test]
    fn generated_secret_round_trips() {
        let totp = TotpService::new("fintrack");
        let secret = totp.generate_secret();
        let key = base32::decode(Alphabet::RFC4648 { padding: false }, &secret).unwrap();
        let code = hotp(&key, 1_000_000);

        assert!(totp.verify_code_at(&secret, &code, 1_000_000 * STEP_SECS));
    }

    #[test]
    fn provisioning_uri_format() {
        let totp = TotpService::new("fintrack");

        assert_eq!(
            totp.provisioning_uri("user@example.com", "ABC234"),
            "otpauth://totp/fintrack:user@example.com?secret=ABC234&issuer=fintrack"
        );
    }
}
