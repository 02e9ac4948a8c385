use rand::{rngs::OsRng, RngCore};

/// Bytes of entropy in a verification token (128 bits).
pub const VERIFICATION_TOKEN_BYTES: usize = 16;

/// Bytes of entropy in a generated application secret.
pub const APPLICATION_SECRET_BYTES: usize = 32;

/// Hex-encoded random token of `bytes` bytes drawn from the OS CSPRNG.
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn generate_verification_token() -> String {
    generate_token(VERIFICATION_TOKEN_BYTES)
}

pub fn generate_application_secret() -> String {
    generate_token(APPLICATION_SECRET_BYTES)
}
