/// Options controlling how a [`CryptContext`](crate::CryptContext) authenticates and deciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptOptions {
    /// Retry with the empty password when the supplied one matches neither the user nor the
    /// owner password.
    pub try_empty_password: bool,

    /// Check the decrypted /Perms block against /P and /EncryptMetadata (revision 5 and 6).
    pub verify_permissions: bool,

    /// Reject AES plaintext whose PKCS#5 padding is malformed. When disabled the padding is
    /// stripped on a best-effort basis and a warning is logged.
    pub strict_padding: bool,
}

impl Default for CryptOptions {
    fn default() -> Self {
        CryptOptions {
            try_empty_password: true,
            verify_permissions: true,
            strict_padding: true,
        }
    }
}

impl CryptOptions {
    /// Create a builder for CryptOptions
    pub fn builder() -> CryptOptionsBuilder {
        CryptOptionsBuilder::default()
    }
}

/// Builder for CryptOptions
#[derive(Debug, Default)]
pub struct CryptOptionsBuilder {
    options: CryptOptions,
}

impl CryptOptionsBuilder {
    /// Enable or disable the empty password fallback
    pub fn try_empty_password(mut self, value: bool) -> Self {
        self.options.try_empty_password = value;
        self
    }

    /// Enable or disable /Perms validation
    pub fn verify_permissions(mut self, value: bool) -> Self {
        self.options.verify_permissions = value;
        self
    }

    /// Enable or disable strict AES padding checks
    pub fn strict_padding(mut self, value: bool) -> Self {
        self.options.strict_padding = value;
        self
    }

    /// Build the CryptOptions
    pub fn build(self) -> CryptOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_starts_from_defaults() {
        let options = CryptOptions::builder().strict_padding(false).build();

        assert!(options.try_empty_password);
        assert!(options.verify_permissions);
        assert!(!options.strict_padding);
        assert_eq!(CryptOptions::builder().build(), CryptOptions::default());
    }
}
