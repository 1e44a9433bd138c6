pub mod algorithms;
mod context;
pub mod crypt_filters;
mod dictionary;
mod handler;
mod ledger;
mod pkcs5;
mod rc4;

use bitflags::bitflags;
use thiserror::Error;

pub use context::{AuthState, CryptContext, DecryptOutcome};
pub use dictionary::{CryptFilterEntry, CryptMethod, EncryptionDictionary, FileIdentifier, StandardSecurityParams};
pub use handler::{DerivedFileKey, PasswordRole, Revision, StandardSecurityHandler, sanitize_password};
pub use ledger::DecryptionLedger;

#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("missing the algorithm version (/V)")]
    MissingVersion,
    #[error("missing encryption revision")]
    MissingRevision,
    #[error("missing the owner password (/O)")]
    MissingOwnerPassword,
    #[error("missing the user password (/U)")]
    MissingUserPassword,
    #[error("missing the permissions field (/P)")]
    MissingPermissions,
    #[error("missing the file /ID elements")]
    MissingFileID,
    #[error("missing the crypt filter dictionary (/CF)")]
    MissingCryptFilters,
    #[error("the crypt filter /{} is not defined in /CF", String::from_utf8_lossy(.0))]
    MissingCryptFilter(Vec<u8>),

    #[error("invalid algorithm version")]
    InvalidVersion,
    #[error("invalid key length")]
    InvalidKeyLength,
    #[error("invalid length of the /O or /U hash")]
    InvalidHashLength,
    #[error("invalid length of the /OE, /UE or /Perms value")]
    InvalidEncryptedKeyLength,
    #[error("/EncryptMetadata differs between the encryption dictionary and the security handler parameters")]
    EncryptMetadataMismatch,
    // Used generically when an object has the wrong type
    #[error("unexpected type; document does not comply with ISO 32000")]
    InvalidType,

    #[error("ciphertext length is not a multiple of the block size")]
    InvalidCipherTextLength,
    #[error("invalid padding in decrypted data")]
    Padding,
    #[error("the decrypted /Perms value does not match /P or /EncryptMetadata")]
    PermissionsMismatch,

    #[error("no password has been authenticated for this document")]
    NotAuthenticated,
    #[error("the password cannot be represented in the document's encoding")]
    UnencodablePassword,

    #[error("the security handler /{} is not supported", String::from_utf8_lossy(.0))]
    UnsupportedSecurityHandler(Vec<u8>),
    #[error("the encryption algorithm version is not supported")]
    UnsupportedVersion,
    #[error("the encryption revision is not supported")]
    UnsupportedRevision,
    #[error("the crypt filter method /{} is not supported", String::from_utf8_lossy(.0))]
    UnsupportedCryptFilter(Vec<u8>),

    #[error(transparent)]
    StringPrep(#[from] stringprep::Error),
}

impl DecryptionError {
    /// Whether the error is confined to the content of a single object.
    ///
    /// A parser may skip the affected object and keep reading the document. Every other error
    /// means the document cannot be decrypted at all.
    pub fn is_cipher_integrity(&self) -> bool {
        matches!(
            self,
            DecryptionError::InvalidCipherTextLength | DecryptionError::Padding
        )
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub struct Permissions: u32 {
        /// (Security handlers of revision 2) Print the document.
        /// (Security handlers of revision 3 or greater) Print the document (possibly not at the
        /// highest quality level, depending on whether [`Permissions::PRINTABLE_IN_HIGH_QUALITY`]
        /// is also set).
        const PRINTABLE = 1 << 2;

        /// Modify the contents of the document by operations other than those controlled by
        /// [`Permissions::ANNOTABLE`], [`Permissions::FILLABLE`] and [`Permissions::ASSEMBLABLE`].
        const MODIFIABLE = 1 << 3;

        /// Copy or otherwise extract text and graphics from the document.
        const COPYABLE = 1 << 4;

        /// Add or modify text annotations, fill in interactive form fields, and if
        /// [`Permissions::MODIFIABLE`] is also set, create or modify interactive form fields
        /// (including signature fields).
        const ANNOTABLE = 1 << 5;

        /// Fill in existing interactive fields (including signature fields), even if
        /// [`Permissions::ANNOTABLE`] is clear.
        const FILLABLE = 1 << 8;

        /// Copy or otherwise extract text and graphics from the document for the purpose of
        /// providing this content to assistive technology.
        const COPYABLE_FOR_ACCESSIBILITY = 1 << 9;

        /// (Security handlers of revision 3 or greater) Assemble the document (insert, rotate, or
        /// delete pages and create document outline items or thumbnail images), even if
        /// [`Permissions::MODIFIABLE`] is not set.
        const ASSEMBLABLE = 1 << 10;

        /// (Security handlers of revision 3 or greater) Print the document to a representation
        /// from which a faithful copy of the PDF content could be generated.
        const PRINTABLE_IN_HIGH_QUALITY = 1 << 11;
    }
}

impl Permissions {
    /// Decode the /P entry. Only the low-order 32 bits are meaningful, whatever the sign or
    /// width of the stored integer.
    pub fn from_p_value(p: i64) -> Self {
        Self::from_bits_truncate(p as u32)
    }

    /// The /P value for these permissions, with all reserved bits set as required.
    pub fn p_value(&self) -> i32 {
        (self.bits() |
        // 7-8: Reserved. Must be 1.
        (0b11 << 6) |
        // 13-32: Reserved. Must be 1.
        (0xfffff << 12)) as i32
    }
}
