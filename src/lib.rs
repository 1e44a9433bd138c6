#[macro_use]
mod object;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};

mod error;
pub use error::{Error, Result};

mod crypt_options;
pub use crypt_options::{CryptOptions, CryptOptionsBuilder};

pub mod encryption;
pub use encryption::{
    AuthState, CryptContext, DecryptOutcome, DecryptionError, DerivedFileKey, EncryptionDictionary, FileIdentifier,
    PasswordRole, Permissions, Revision, StandardSecurityParams,
};
