//! Correlation id generation for gateway requests.
//!
//! Every outbound call carries a unique RqUID the gateway uses for tracing
//! and replay detection, so the ids must be unpredictable. They come from
//! the OS CSPRNG; the default length of 32 hex characters carries 128 bits
//! of randomness.

use rand::rngs::OsRng;
use rand::RngCore;

/// Default RqUID length expected by the gateway
pub const RQ_UID_LEN: usize = 32;

/// Generate a random lowercase-hex string of the requested length.
///
/// Never blocks and has no failure mode: `OsRng` reads the operating
/// system's entropy source directly.
pub fn generate(length: usize) -> String {
    let mut bytes = vec![0u8; length.div_ceil(2)];
    OsRng.fill_bytes(&mut bytes);

    let mut encoded = hex::encode(bytes);
    encoded.truncate(length);
    encoded
}

/// Generate a correlation id suitable for the `x-Introspect-RqUID` header
/// and the `rq_uid` payload field.
pub fn rq_uid() -> String {
    generate(RQ_UID_LEN)
}
