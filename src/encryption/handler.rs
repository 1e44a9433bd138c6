use log::{debug, trace};
use std::fmt;

use super::algorithms;
use super::{DecryptionError, EncryptionDictionary, Permissions, StandardSecurityParams};

/// Revision (/R) of the standard security handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    /// 40-bit RC4.
    R2,
    /// RC4 with a key length of 40 to 128 bits.
    R3,
    /// Crypt filters, RC4 or AES-128.
    R4,
    /// AES-256 with a single round of SHA-256 (deprecated, Adobe extension level 3).
    R5,
    /// AES-256 with the hardened hash of PDF 2.0.
    R6,
}

impl TryFrom<i64> for Revision {
    type Error = DecryptionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Revision::R2),
            3 => Ok(Revision::R3),
            4 => Ok(Revision::R4),
            5 => Ok(Revision::R5),
            6 => Ok(Revision::R6),
            _ => Err(DecryptionError::UnsupportedRevision),
        }
    }
}

impl Revision {
    /// The value of the /R entry.
    pub fn number(self) -> i64 {
        match self {
            Revision::R2 => 2,
            Revision::R3 => 3,
            Revision::R4 => 4,
            Revision::R5 => 5,
            Revision::R6 => 6,
        }
    }

    /// Revisions 5 and 6 derive a 256-bit key with SHA-2 and wrap it in OE/UE.
    pub fn is_aes256(self) -> bool {
        matches!(self, Revision::R5 | Revision::R6)
    }

    /// Extra MD5 rounds when deriving RC4 keys from a password.
    pub(crate) fn md5_rounds(self) -> usize {
        match self {
            Revision::R2 => 0,
            _ => 50,
        }
    }

    /// Extra RC4 passes, with the key XORed with the pass number, over the O and U values.
    pub(crate) fn rc4_extra_rounds(self) -> u8 {
        match self {
            Revision::R2 => 0,
            _ => 19,
        }
    }

    /// Whether a false /EncryptMetadata changes the file encryption key.
    pub(crate) fn hashes_metadata_flag(self) -> bool {
        self >= Revision::R4
    }

    /// Number of leading bytes of /U compared when authenticating a user password with
    /// Algorithm 6. Revisions 5 and 6 compare the whole 32-byte hash instead.
    pub(crate) fn user_compare_len_r4(self) -> usize {
        match self {
            Revision::R2 => 32,
            _ => 16,
        }
    }

    pub(crate) fn uses_hardened_hash(self) -> bool {
        self == Revision::R6
    }
}

/// The password that unlocked the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordRole {
    User,
    Owner,
}

/// The file encryption key of an authenticated document.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedFileKey(Vec<u8>);

impl DerivedFileKey {
    pub(crate) fn new(key: Vec<u8>) -> Self {
        DerivedFileKey(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedFileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedFileKey(<{} bytes>)", self.0.len())
    }
}

/// Turn a text password into the bytes the given revision hashes.
pub fn sanitize_password(revision: Revision, password: &str) -> Result<Vec<u8>, DecryptionError> {
    if revision.is_aes256() {
        // The UTF-8 password string shall be generated from Unicode input by processing the input
        // with the SASLprep (Internet RFC 4013) profile of stringprep (Internet RFC 3454) using
        // the Normalize and BiDi options, and then converting to a UTF-8 representation.
        let mut password = stringprep::saslprep(password)?.as_bytes().to_vec();
        password.truncate(127);
        return Ok(password);
    }

    // The password string is generated from host system codepage characters (or system scripts).
    let (password, _, had_errors) = encoding_rs::WINDOWS_1252.encode(password);
    if had_errors {
        return Err(DecryptionError::UnencodablePassword);
    }

    Ok(password.into_owned())
}

/// The standard security handler of one document: the /Encrypt parameters it authenticates
/// passwords against.
#[derive(Clone, Debug)]
pub struct StandardSecurityHandler {
    params: StandardSecurityParams,
    key_length: usize,
    file_id: Vec<u8>,
}

impl StandardSecurityHandler {
    /// `file_id` is the first element of the trailer /ID array, required by revision 4 and
    /// earlier.
    pub fn new(
        dictionary: &EncryptionDictionary,
        params: StandardSecurityParams,
        file_id: Option<&[u8]>,
    ) -> Result<Self, DecryptionError> {
        params.validate()?;

        let revision = params.revision;
        if revision.is_aes256() != (dictionary.version == 5) {
            return Err(DecryptionError::UnsupportedRevision);
        }

        // Key derivation reads the flag from the params, the metadata exemption from the
        // dictionary.
        if params.encrypt_metadata != dictionary.encrypt_metadata {
            return Err(DecryptionError::EncryptMetadataMismatch);
        }

        let file_id = match file_id {
            Some(file_id) => file_id.to_vec(),
            None if revision.is_aes256() => Vec::new(),
            None => return Err(DecryptionError::MissingFileID),
        };

        Ok(StandardSecurityHandler {
            key_length: dictionary.key_length_bytes(),
            params,
            file_id,
        })
    }

    pub fn revision(&self) -> Revision {
        self.params.revision
    }

    pub fn params(&self) -> &StandardSecurityParams {
        &self.params
    }

    /// Try `password` as the user password, then as the owner password.
    pub fn authenticate(
        &self,
        password: &[u8],
        verify_permissions: bool,
    ) -> Result<Option<(DerivedFileKey, PasswordRole)>, DecryptionError> {
        let revision = self.params.revision;

        let found = if revision.is_aes256() {
            // Truncate the UTF-8 representation to 127 bytes if it is longer than 127 bytes.
            let password = &password[..password.len().min(127)];

            match self.authenticate_user_r6(password)? {
                Some(key) => Some((key, PasswordRole::User)),
                None => self.authenticate_owner_r6(password)?.map(|key| (key, PasswordRole::Owner)),
            }
        } else {
            match self.authenticate_user_r4(password)? {
                Some(key) => Some((key, PasswordRole::User)),
                None => self.authenticate_owner_r4(password)?.map(|key| (key, PasswordRole::Owner)),
            }
        };

        let Some((key, role)) = found else {
            trace!("password matches neither /U nor /O");
            return Ok(None);
        };

        if revision.is_aes256() && verify_permissions {
            match &self.params.permissions_encrypted {
                Some(perms) => algorithms::validate_permissions(
                    &key,
                    perms,
                    self.params.permissions,
                    self.params.encrypt_metadata,
                )?,
                None => debug!("no /Perms entry, skipping permission validation"),
            }
        }

        debug!("authenticated as {role:?} password for revision {}", revision.number());
        Ok(Some((DerivedFileKey::new(key), role)))
    }

    /// Authenticate the user password (revision 4 and earlier).
    ///
    /// This implements Algorithm 6 as described in ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_user_r4(&self, password: &[u8]) -> Result<Option<Vec<u8>>, DecryptionError> {
        let revision = self.params.revision;

        // Perform all but the last step of Algorithm 4 (revision 2) or Algorithm 5 (revision 3 or
        // greater) using the supplied password string.
        let key = algorithms::compute_file_encryption_key_r4(
            revision,
            password,
            &self.params.owner_value,
            self.params.permissions,
            &self.file_id,
            self.params.encrypt_metadata,
            self.key_length,
        )?;

        let user_value = match revision {
            Revision::R2 => algorithms::compute_hashed_user_password_r2(&key),
            _ => algorithms::compute_hashed_user_password_r3_r4(&key, &self.file_id),
        };

        // If the result of the step above is equal to the value of the encryption dictionary's U
        // entry (comparing on the first 16 bytes in the case of security handlers of revision 3 or
        // greater), the password supplied is the correct user password.
        let len = revision.user_compare_len_r4();
        Ok((user_value[..len] == self.params.user_value[..len]).then_some(key))
    }

    /// Authenticate the owner password (revision 4 and earlier).
    ///
    /// This implements Algorithm 7 as described in ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_owner_r4(&self, password: &[u8]) -> Result<Option<Vec<u8>>, DecryptionError> {
        let user_password = algorithms::recover_user_password_r4(
            self.params.revision,
            self.key_length,
            password,
            &self.params.owner_value,
        )?;

        // The result is the user password; authenticate it as in Algorithm 6.
        self.authenticate_user_r4(&user_password)
    }

    /// Authenticate the user password and retrieve the file encryption key (revision 5 and
    /// later).
    ///
    /// This implements Algorithms 11 and 2.A as described in ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_user_r6(&self, password: &[u8]) -> Result<Option<Vec<u8>>, DecryptionError> {
        let revision = self.params.revision;
        let user_value = &self.params.user_value[..48];
        let (hashed_user_password, salts) = user_value.split_at(32);
        let (validation_salt, key_salt) = salts.split_at(8);

        // Test the password against the user key by computing a hash using algorithm 2.B with an
        // input string consisting of the UTF-8 password concatenated with the 8 bytes of user
        // validation salt.
        if algorithms::compute_hash(revision, password, validation_salt, None) != hashed_user_password {
            return Ok(None);
        }

        // Compute an intermediate user key with the user key salt and use it to decrypt the
        // 32-byte UE string.
        let key = algorithms::compute_hash(revision, password, key_salt, None);
        let user_encrypted = self
            .params
            .user_encrypted
            .as_deref()
            .ok_or(DecryptionError::MissingUserPassword)?;

        algorithms::unwrap_file_encryption_key(&key, user_encrypted).map(Some)
    }

    /// Authenticate the owner password and retrieve the file encryption key (revision 5 and
    /// later).
    ///
    /// This implements Algorithms 12 and 2.A as described in ISO 32000-2:2020 (PDF 2.0).
    fn authenticate_owner_r6(&self, password: &[u8]) -> Result<Option<Vec<u8>>, DecryptionError> {
        let revision = self.params.revision;
        let user_value = &self.params.user_value[..48];
        let owner_value = &self.params.owner_value[..48];
        let (hashed_owner_password, salts) = owner_value.split_at(32);
        let (validation_salt, key_salt) = salts.split_at(8);

        // The owner hashes also take the 48-byte U string as input.
        if algorithms::compute_hash(revision, password, validation_salt, Some(user_value)) != hashed_owner_password {
            return Ok(None);
        }

        let key = algorithms::compute_hash(revision, password, key_salt, Some(user_value));
        let owner_encrypted = self
            .params
            .owner_encrypted
            .as_deref()
            .ok_or(DecryptionError::MissingOwnerPassword)?;

        algorithms::unwrap_file_encryption_key(&key, owner_encrypted).map(Some)
    }

    /// Compute the password entries of a new encryption dictionary.
    ///
    /// An empty owner password falls back to the user password. Revisions 5 and 6 use a random
    /// file encryption key and random salts.
    pub fn author(
        dictionary: &EncryptionDictionary,
        revision: Revision,
        owner_password: &[u8],
        user_password: &[u8],
        permissions: Permissions,
        file_id: Option<&[u8]>,
    ) -> Result<(StandardSecurityParams, DerivedFileKey), DecryptionError> {
        let p = permissions.p_value();
        let encrypt_metadata = dictionary.encrypt_metadata;

        if !revision.is_aes256() {
            let key_length = dictionary.key_length_bytes();
            let file_id = file_id.ok_or(DecryptionError::MissingFileID)?;
            let owner_password = (!owner_password.is_empty()).then_some(owner_password);

            let owner_value =
                algorithms::compute_hashed_owner_password_r4(revision, key_length, owner_password, user_password)?;
            let key = algorithms::compute_file_encryption_key_r4(
                revision,
                user_password,
                &owner_value,
                p,
                file_id,
                encrypt_metadata,
                key_length,
            )?;
            let user_value = match revision {
                Revision::R2 => algorithms::compute_hashed_user_password_r2(&key),
                _ => algorithms::compute_hashed_user_password_r3_r4(&key, file_id),
            };

            let params = StandardSecurityParams {
                revision,
                permissions: p,
                owner_value,
                user_value,
                owner_encrypted: None,
                user_encrypted: None,
                permissions_encrypted: None,
                encrypt_metadata,
            };
            return Ok((params, DerivedFileKey::new(key)));
        }

        let owner_password = if owner_password.is_empty() { user_password } else { owner_password };
        let owner_password = &owner_password[..owner_password.len().min(127)];
        let user_password = &user_password[..user_password.len().min(127)];

        let key: [u8; 32] = rand::random();
        let user_salts: [u8; 16] = rand::random();
        let owner_salts: [u8; 16] = rand::random();

        let (user_value, user_encrypted) =
            algorithms::compute_hashed_user_password_r6(revision, &key, user_password, &user_salts)?;
        let (owner_value, owner_encrypted) =
            algorithms::compute_hashed_owner_password_r6(revision, &key, owner_password, &owner_salts, &user_value)?;
        let permissions_encrypted = algorithms::compute_permissions(&key, p, encrypt_metadata, rand::random())?;

        let params = StandardSecurityParams {
            revision,
            permissions: p,
            owner_value,
            user_value,
            owner_encrypted: Some(owner_encrypted),
            user_encrypted: Some(user_encrypted),
            permissions_encrypted: Some(permissions_encrypted),
            encrypt_metadata,
        };
        Ok((params, DerivedFileKey::new(key.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_ID: &[u8] = b"0123456789abcdef";

    fn author(version: i64, length: u32, revision: Revision) -> StandardSecurityHandler {
        let dictionary = EncryptionDictionary::standard(version, length, true);
        let (params, _) =
            StandardSecurityHandler::author(&dictionary, revision, b"owner", b"user", Permissions::PRINTABLE, Some(FILE_ID))
                .unwrap();
        StandardSecurityHandler::new(&dictionary, params, Some(FILE_ID)).unwrap()
    }

    #[test]
    fn revision_numbers() {
        for number in 2..=6 {
            assert_eq!(Revision::try_from(number).unwrap().number(), number);
        }
        assert!(matches!(Revision::try_from(1), Err(DecryptionError::UnsupportedRevision)));
        assert!(matches!(Revision::try_from(7), Err(DecryptionError::UnsupportedRevision)));
    }

    #[test]
    fn user_and_owner_roles() {
        for (version, length, revision) in [
            (1, 40, Revision::R2),
            (2, 128, Revision::R3),
            (4, 128, Revision::R4),
            (5, 256, Revision::R5),
            (5, 256, Revision::R6),
        ] {
            let handler = author(version, length, revision);

            let (user_key, role) = handler.authenticate(b"user", true).unwrap().unwrap();
            assert_eq!(role, PasswordRole::User);
            let (owner_key, role) = handler.authenticate(b"owner", true).unwrap().unwrap();
            assert_eq!(role, PasswordRole::Owner);

            assert_eq!(user_key, owner_key);
            assert!(handler.authenticate(b"wrong", true).unwrap().is_none());
            assert!(handler.authenticate(b"", true).unwrap().is_none());
        }
    }

    #[test]
    fn r2_key_is_40_bits() {
        let handler = author(1, 40, Revision::R2);
        let (key, _) = handler.authenticate(b"user", true).unwrap().unwrap();
        assert_eq!(key.len(), 5);
    }

    #[test]
    fn revision_must_match_version() {
        let dictionary = EncryptionDictionary::standard(4, 128, true);
        let (params, _) =
            StandardSecurityHandler::author(&dictionary, Revision::R4, b"", b"", Permissions::all(), Some(FILE_ID))
                .unwrap();

        let aes256 = EncryptionDictionary::standard(5, 256, true);
        assert!(matches!(
            StandardSecurityHandler::new(&aes256, params.clone(), Some(FILE_ID)),
            Err(DecryptionError::UnsupportedRevision)
        ));
        assert!(matches!(
            StandardSecurityHandler::new(&dictionary, params, None),
            Err(DecryptionError::MissingFileID)
        ));
    }

    #[test]
    fn encrypt_metadata_must_agree() {
        let dictionary = EncryptionDictionary::standard(4, 128, false);
        let (params, _) =
            StandardSecurityHandler::author(&dictionary, Revision::R4, b"", b"", Permissions::all(), Some(FILE_ID))
                .unwrap();
        assert!(!params.encrypt_metadata);
        assert!(StandardSecurityHandler::new(&dictionary, params.clone(), Some(FILE_ID)).is_ok());

        let encrypted_metadata = EncryptionDictionary::standard(4, 128, true);
        assert!(matches!(
            StandardSecurityHandler::new(&encrypted_metadata, params, Some(FILE_ID)),
            Err(DecryptionError::EncryptMetadataMismatch)
        ));
    }

    #[test]
    fn user_compare_length() {
        assert_eq!(Revision::R2.user_compare_len_r4(), 32);
        assert_eq!(Revision::R3.user_compare_len_r4(), 16);
        assert_eq!(Revision::R4.user_compare_len_r4(), 16);
    }

    #[test]
    fn tampered_perms_are_rejected() {
        let dictionary = EncryptionDictionary::standard(5, 256, true);
        let (mut params, _) =
            StandardSecurityHandler::author(&dictionary, Revision::R6, b"", b"", Permissions::all(), None).unwrap();
        params.permissions = Permissions::PRINTABLE.p_value();
        let handler = StandardSecurityHandler::new(&dictionary, params, None).unwrap();

        assert!(matches!(handler.authenticate(b"", true), Err(DecryptionError::PermissionsMismatch)));
        assert!(handler.authenticate(b"", false).unwrap().is_some());
    }

    #[test]
    fn long_passwords_are_truncated() {
        let dictionary = EncryptionDictionary::standard(5, 256, true);
        let long = [b'p'; 200];
        let (params, _) =
            StandardSecurityHandler::author(&dictionary, Revision::R6, &long, &long, Permissions::all(), None).unwrap();
        let handler = StandardSecurityHandler::new(&dictionary, params, None).unwrap();

        assert!(handler.authenticate(&long[..127], true).unwrap().is_some());
        assert!(handler.authenticate(&long[..126], true).unwrap().is_none());
    }

    #[test]
    fn password_sanitizing() {
        assert_eq!(sanitize_password(Revision::R3, "caf\u{e9}").unwrap(), b"caf\xe9");
        assert!(matches!(
            sanitize_password(Revision::R4, "\u{4e2d}"),
            Err(DecryptionError::UnencodablePassword)
        ));

        // SASLprep maps non-ASCII spaces to ASCII space.
        assert_eq!(sanitize_password(Revision::R6, "a\u{a0}b").unwrap(), b"a b");
        assert_eq!(sanitize_password(Revision::R6, "\u{4e2d}").unwrap(), "\u{4e2d}".as_bytes());
        assert_eq!(sanitize_password(Revision::R5, &"x".repeat(200)).unwrap().len(), 127);
    }

    #[test]
    fn file_key_debug_is_redacted() {
        let key = DerivedFileKey::new(vec![0xAA; 16]);
        assert_eq!(format!("{key:?}"), "DerivedFileKey(<16 bytes>)");
    }
}
