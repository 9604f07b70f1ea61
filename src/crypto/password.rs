use crate::error::{AppError, Result};
use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes and verifies login secrets.
///
/// The session manager never inspects secret material itself; everything
/// goes through this seam so tests can swap in a cheap deterministic
/// implementation.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a password into a storable string.
    fn hash(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// The production hasher: Argon2id with fixed parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    /// Hashes a password using Argon2id.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to hash.
    ///
    /// # Returns
    ///
    /// A `Result` containing the hashed password.
    fn hash(&self, password: &str) -> Result<String> {
        let mut password_bytes = password.as_bytes().to_vec();

        let mut salt_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut salt_bytes);

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Encryption(format!("Salt encoding error: {}", e)))?;

        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            ParamsBuilder::new()
                .m_cost(ARGON2_MEMORY_MB * 1024)
                .t_cost(ARGON2_ITERATIONS)
                .p_cost(ARGON2_PARALLELISM)
                .build()
                .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
        );

        let password_hash = argon2
            .hash_password(&password_bytes, &salt)
            .map_err(|e| AppError::Encryption(format!("Argon2 hash error: {}", e)))?
            .to_string();

        password_bytes.zeroize();
        tracing::debug!("Password hashed successfully with Argon2");
        Ok(password_hash)
    }

    /// Verifies a password against a hash.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to verify.
    /// * `hash` - The hash to verify against.
    ///
    /// # Returns
    ///
    /// A `Result` containing `true` if the password is valid, `false` otherwise.
    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let mut password_bytes = password.as_bytes().to_vec();
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Encryption(format!("Hash parse error: {}", e)))?;
        let argon2 = Argon2::default();
        let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

        password_bytes.zeroize();
        tracing::debug!("Password verification completed");
        Ok(result)
    }
}
