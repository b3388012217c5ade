use crate::error::BookswapError;

/// bcrypt-backed credential store. The cost factor comes from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, BookswapError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// A digest that is not valid bcrypt never matches.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        bcrypt::verify(password, digest).unwrap_or(false)
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_blocking(&self, password: String) -> Result<String, BookswapError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    pub async fn verify_blocking(
        &self,
        password: String,
        digest: String,
    ) -> Result<bool, BookswapError> {
        let hasher = *self;
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?)
    }

    /// Login check. Without a stored digest the password is hashed anyway and
    /// the result is `false`, so unknown usernames cost as much as known ones.
    pub async fn check_login_blocking(
        &self,
        password: String,
        digest: Option<String>,
    ) -> Result<bool, BookswapError> {
        match digest {
            Some(digest) => self.verify_blocking(password, digest).await,
            None => {
                self.hash_blocking(password).await?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn verifies_the_original_password_only() {
        let hasher = hasher();
        let digest = hasher.hash("pw123").expect("hash");

        assert_ne!(digest, "pw123");
        assert!(hasher.verify("pw123", &digest));
        assert!(!hasher.verify("pw124", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn salts_every_digest() {
        let hasher = hasher();
        let a = hasher.hash("same").expect("hash");
        let b = hasher.hash("same").expect("hash");

        assert_ne!(a, b);
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn malformed_digest_does_not_match() {
        assert!(!hasher().verify("pw123", "not-a-bcrypt-digest"));
    }

    #[tokio::test]
    async fn login_check_without_digest_never_matches() {
        let hasher = hasher();
        let digest = hasher.hash("pw123").expect("hash");

        assert!(
            hasher
                .check_login_blocking("pw123".to_string(), Some(digest))
                .await
                .expect("check")
        );
        assert!(
            !hasher
                .check_login_blocking("pw123".to_string(), None)
                .await
                .expect("check")
        );
    }

    #[tokio::test]
    async fn blocking_helpers_agree_with_sync_ones() {
        let hasher = hasher();
        let digest = hasher.hash_blocking("pw123".to_string()).await.expect("hash");

        assert!(
            hasher
                .verify_blocking("pw123".to_string(), digest.clone())
                .await
                .expect("verify")
        );
        assert!(
            !hasher
                .verify_blocking("nope".to_string(), digest)
                .await
                .expect("verify")
        );
    }
}
