use log::{debug, trace, warn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{CryptOptions, Dictionary, Error, Object, ObjectId, Stream};
use super::crypt_filters::CryptFilter;
use super::handler::sanitize_password;
use super::{
    DecryptionError, DecryptionLedger, DerivedFileKey, EncryptionDictionary, FileIdentifier, PasswordRole,
    Permissions, Revision, StandardSecurityHandler, StandardSecurityParams,
};

/// Where a [`CryptContext`] stands with respect to passwords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// No password has been tried yet.
    Unauthenticated,
    Authenticated { key: DerivedFileKey, role: PasswordRole },
    /// The last password tried was wrong.
    Locked,
}

/// What [`CryptContext::decrypt`] did with an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The object was deciphered in place by this call.
    Deciphered,
    /// The object is stored in the clear and was left untouched.
    Exempt,
    /// The id was deciphered before (or marked as plain), so this object was left untouched.
    /// If it is a fresh copy read from the file it still holds ciphertext.
    AlreadyDeciphered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Decrypt,
    Encrypt,
}

/// Per-document decryption state.
///
/// A context authenticates a password once and then deciphers every indirect object the parser
/// hands it, each one at most once.
#[derive(Debug)]
pub struct CryptContext {
    dictionary: EncryptionDictionary,
    handler: StandardSecurityHandler,
    encrypt_ref: Option<ObjectId>,
    options: CryptOptions,
    state: AuthState,
    string_filter: Arc<dyn CryptFilter>,
    stream_filter: Arc<dyn CryptFilter>,
    embedded_file_filter: Arc<dyn CryptFilter>,
    ledger: DecryptionLedger,
}

impl CryptContext {
    pub fn new(encrypt: &Dictionary, file_id: Option<&[u8]>) -> Result<Self, DecryptionError> {
        Self::with_options(encrypt, file_id, CryptOptions::default())
    }

    /// Parse an /Encrypt dictionary. `file_id` is the first element of the trailer /ID array.
    pub fn with_options(
        encrypt: &Dictionary,
        file_id: Option<&[u8]>,
        options: CryptOptions,
    ) -> Result<Self, DecryptionError> {
        let dictionary = EncryptionDictionary::from_dictionary(encrypt)?;
        let params = StandardSecurityParams::from_dictionary(encrypt)?;

        Self::from_parts(dictionary, params, file_id, options)
    }

    pub fn from_parts(
        dictionary: EncryptionDictionary,
        params: StandardSecurityParams,
        file_id: Option<&[u8]>,
        options: CryptOptions,
    ) -> Result<Self, DecryptionError> {
        let handler = StandardSecurityHandler::new(&dictionary, params, file_id)?;

        let strict_padding = options.strict_padding;
        let string_filter = dictionary.string_crypt_filter(strict_padding)?;
        let stream_filter = dictionary.stream_crypt_filter(strict_padding)?;
        let embedded_file_filter = dictionary.embedded_file_crypt_filter(strict_padding)?;

        debug!(
            "standard security handler V{} R{} with a {}-bit key, strings {}, streams {}",
            dictionary.version,
            handler.revision().number(),
            dictionary.length,
            String::from_utf8_lossy(string_filter.method()),
            String::from_utf8_lossy(stream_filter.method()),
        );

        Ok(CryptContext {
            dictionary,
            handler,
            encrypt_ref: None,
            options,
            state: AuthState::Unauthenticated,
            string_filter,
            stream_filter,
            embedded_file_filter,
            ledger: DecryptionLedger::new(),
        })
    }

    /// Read the /Encrypt entry and the file identifier from a trailer.
    ///
    /// An indirect /Encrypt dictionary is looked up in `objects` and its id is remembered so that
    /// the dictionary itself is never deciphered.
    pub fn from_trailer(
        trailer: &Dictionary,
        objects: &BTreeMap<ObjectId, Object>,
        options: CryptOptions,
    ) -> Result<Self, Error> {
        let encrypt = trailer.get(b"Encrypt").map_err(|_| Error::NotEncrypted)?;

        let (encrypt_ref, encrypt) = match encrypt {
            Object::Reference(id) => {
                let object = objects.get(id).ok_or(Error::DictKey("Encrypt".to_string()))?;
                (Some(*id), object.as_dict()?)
            }
            object => (None, object.as_dict()?),
        };

        let file_id = FileIdentifier::from_trailer(trailer);
        let mut context = Self::with_options(encrypt, file_id.as_ref().map(FileIdentifier::as_bytes), options)?;
        context.encrypt_ref = encrypt_ref;

        Ok(context)
    }

    /// Remember the id of the /Encrypt dictionary so that it is left untouched.
    pub fn set_encrypt_reference(&mut self, id: ObjectId) {
        self.encrypt_ref = Some(id);
    }

    /// Try `password` as the user and then as the owner password, falling back to the empty
    /// password if allowed by the options.
    ///
    /// A wrong password is not an error: it returns `Ok(false)` and locks the context.
    pub fn authenticate(&mut self, password: &[u8]) -> Result<bool, DecryptionError> {
        let mut candidates = vec![password];
        if self.options.try_empty_password && !password.is_empty() {
            candidates.push(b"");
        }

        for candidate in candidates {
            match self.handler.authenticate(candidate, self.options.verify_permissions) {
                Ok(Some((key, role))) => {
                    if candidate.len() != password.len() {
                        debug!("fell back to the empty password");
                    }
                    self.state = AuthState::Authenticated { key, role };
                    return Ok(true);
                }
                Ok(None) => {}
                Err(err) => {
                    self.state = AuthState::Locked;
                    return Err(err);
                }
            }
        }

        debug!("no password matches the document");
        self.state = AuthState::Locked;
        Ok(false)
    }

    /// Like [`CryptContext::authenticate`], for a text password.
    pub fn authenticate_str(&mut self, password: &str) -> Result<bool, DecryptionError> {
        let password = sanitize_password(self.revision(), password)?;
        self.authenticate(&password)
    }

    /// Decipher the strings and streams of the indirect object `id` in place.
    ///
    /// Cross-reference streams, the /Encrypt dictionary and (when metadata is not encrypted)
    /// metadata streams are left alone. The id is recorded before the content is touched and
    /// stays recorded if deciphering fails.
    ///
    /// Each id is deciphered once per context. The caller keeps the object it got back as
    /// [`DecryptOutcome::Deciphered`] and hands out that copy: an object loaded again under a
    /// recorded id is returned untouched as [`DecryptOutcome::AlreadyDeciphered`].
    pub fn decrypt(&self, id: ObjectId, object: &mut Object) -> Result<DecryptOutcome, DecryptionError> {
        if self.is_exempt(id, object) {
            trace!("object {} {} is stored in the clear", id.0, id.1);
            self.ledger.record(id);
            return Ok(DecryptOutcome::Exempt);
        }

        if self.ledger.contains(id) {
            debug!("object {} {} was already deciphered, leaving it untouched", id.0, id.1);
            return Ok(DecryptOutcome::AlreadyDeciphered);
        }

        let key = self.key()?;

        // Another thread may have won the race since the first check.
        if !self.ledger.record(id) {
            debug!("object {} {} was deciphered concurrently, leaving it untouched", id.0, id.1);
            return Ok(DecryptOutcome::AlreadyDeciphered);
        }

        trace!("decrypting object {} {}", id.0, id.1);
        self.transform(key, id, object, Direction::Decrypt)?;
        Ok(DecryptOutcome::Deciphered)
    }

    /// Encrypt the strings and streams of the indirect object `id` in place.
    ///
    /// Applies the same exemptions as [`CryptContext::decrypt`] but does not touch the ledger.
    pub fn encrypt(&self, id: ObjectId, object: &mut Object) -> Result<(), DecryptionError> {
        if self.is_exempt(id, object) {
            return Ok(());
        }

        let key = self.key()?;
        self.transform(key, id, object, Direction::Encrypt)
    }

    /// Record an object known to be plain, e.g. one read from an already deciphered object
    /// stream.
    pub fn mark_decrypted(&self, id: ObjectId) {
        self.ledger.record(id);
    }

    pub fn is_decrypted(&self, id: ObjectId) -> bool {
        self.ledger.contains(id)
    }

    /// Decipher a whole object table, returning the objects that failed.
    pub fn decrypt_all(&self, objects: &mut BTreeMap<ObjectId, Object>) -> Vec<(ObjectId, DecryptionError)> {
        let decrypt_filter_map =
            |(id, object): (&ObjectId, &mut Object)| self.decrypt(*id, object).err().map(|err| (*id, err));

        #[cfg(feature = "rayon")]
        let failures: Vec<_> = objects.par_iter_mut().filter_map(decrypt_filter_map).collect();
        #[cfg(not(feature = "rayon"))]
        let failures: Vec<_> = objects.iter_mut().filter_map(decrypt_filter_map).collect();

        for (id, err) in &failures {
            warn!("failed to decrypt object {} {}: {}", id.0, id.1, err);
        }

        failures
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    pub fn file_key(&self) -> Option<&DerivedFileKey> {
        match &self.state {
            AuthState::Authenticated { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<PasswordRole> {
        match &self.state {
            AuthState::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn revision(&self) -> Revision {
        self.handler.revision()
    }

    pub fn encrypt_metadata(&self) -> bool {
        self.dictionary.encrypt_metadata
    }

    pub fn dictionary(&self) -> &EncryptionDictionary {
        &self.dictionary
    }

    /// The raw /P value.
    pub fn p(&self) -> i32 {
        self.handler.params().permissions
    }

    /// The permissions granted to the user.
    pub fn permissions(&self) -> Permissions {
        Permissions::from_p_value(self.p() as i64)
    }

    /// The owner password grants every permission.
    pub fn effective_permissions(&self) -> Permissions {
        match self.role() {
            Some(PasswordRole::Owner) => Permissions::all(),
            _ => self.permissions(),
        }
    }

    fn key(&self) -> Result<&DerivedFileKey, DecryptionError> {
        self.file_key().ok_or(DecryptionError::NotAuthenticated)
    }

    fn is_exempt(&self, id: ObjectId, object: &Object) -> bool {
        if self.encrypt_ref == Some(id) {
            return true;
        }

        let Object::Stream(stream) = object else {
            return false;
        };

        // The cross-reference stream shall not be encrypted and strings appearing in the
        // cross-reference stream dictionary shall not be encrypted.
        if stream.dict.has_type(b"XRef") {
            return true;
        }

        !self.dictionary.encrypt_metadata && stream.dict.has_type(b"Metadata")
    }

    /// The filter for a stream: a Crypt filter in its /Filter chain, the embedded file filter or
    /// the default stream filter.
    fn stream_filter_for(&self, stream: &Stream) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        let has_crypt_filter = stream
            .filters()
            .map(|filters| filters.contains(&&b"Crypt"[..]))
            .unwrap_or(false);

        if has_crypt_filter {
            // The stream's DecodeParms entry shall contain a Crypt filter decode parameters
            // dictionary whose Name entry specifies the particular crypt filter that shall be used
            // (if missing, Identity is used).
            let name = crypt_filter_name(stream).unwrap_or(b"Identity");
            return self.dictionary.resolve_filter(name, self.options.strict_padding);
        }

        if stream.dict.has_type(b"EmbeddedFile") {
            return Ok(self.embedded_file_filter.clone());
        }

        Ok(self.stream_filter.clone())
    }

    fn transform(
        &self,
        key: &DerivedFileKey,
        id: ObjectId,
        object: &mut Object,
        direction: Direction,
    ) -> Result<(), DecryptionError> {
        match object {
            // Encryption applies to all strings and streams in the document's PDF file, i.e., we
            // have to recursively process array and dictionary objects.
            Object::Array(objects) => {
                for object in objects {
                    self.transform(key, id, object, direction)?;
                }
            }
            Object::Dictionary(dict) => {
                for (_, object) in dict.iter_mut() {
                    self.transform(key, id, object, direction)?;
                }
            }
            Object::String(content, _) => {
                *content = apply(&*self.string_filter, key, id, content, direction)?;
            }
            Object::Stream(stream) => {
                let filter = self.stream_filter_for(stream)?;
                let content = apply(&*filter, key, id, &stream.content, direction)?;
                stream.set_content(content);

                // Strings of the stream dictionary use the string filter.
                for (_, object) in stream.dict.iter_mut() {
                    self.transform(key, id, object, direction)?;
                }
            }
            // Encryption is not applied to other object types such as integers and boolean values.
            _ => {}
        }

        Ok(())
    }
}

fn apply(
    filter: &dyn CryptFilter,
    key: &DerivedFileKey,
    id: ObjectId,
    data: &[u8],
    direction: Direction,
) -> Result<Vec<u8>, DecryptionError> {
    // Compute the key from the original file encryption key and the object identifier.
    let key = filter.compute_key(key.as_bytes(), id)?;

    match direction {
        Direction::Decrypt => filter.decrypt(&key, data),
        Direction::Encrypt => filter.encrypt(&key, data),
    }
}

/// `/DecodeParms /Name` of the Crypt entry of a stream's filter chain.
fn crypt_filter_name(stream: &Stream) -> Option<&[u8]> {
    let params = match stream.dict.get(b"DecodeParms").ok()? {
        Object::Dictionary(params) => params,
        Object::Array(params) => {
            // Parameters are positional when there is more than one filter.
            let index = stream.filters().ok()?.iter().position(|name| *name == b"Crypt")?;
            params.get(index)?.as_dict().ok()?
        }
        _ => return None,
    };

    params.get(b"Name").and_then(Object::as_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringFormat;

    const FILE_ID: &[u8] = b"fedcba9876543210";

    fn context(version: i64, length: u32, revision: Revision, options: CryptOptions) -> CryptContext {
        let dictionary = EncryptionDictionary::standard(version, length, true);
        let (params, _) = StandardSecurityHandler::author(
            &dictionary,
            revision,
            b"owner",
            b"",
            Permissions::PRINTABLE,
            Some(FILE_ID),
        )
        .unwrap();
        CryptContext::from_parts(dictionary, params, Some(FILE_ID), options).unwrap()
    }

    #[test]
    fn empty_password_fallback() {
        let mut ctx = context(2, 128, Revision::R3, CryptOptions::default());
        assert_eq!(ctx.state(), &AuthState::Unauthenticated);

        assert!(ctx.authenticate(b"wrong").unwrap());
        assert_eq!(ctx.role(), Some(PasswordRole::User));

        let mut strict = context(2, 128, Revision::R3, CryptOptions::builder().try_empty_password(false).build());
        assert!(!strict.authenticate(b"wrong").unwrap());
        assert_eq!(strict.state(), &AuthState::Locked);
        assert!(strict.file_key().is_none());

        assert!(strict.authenticate(b"owner").unwrap());
        assert_eq!(strict.role(), Some(PasswordRole::Owner));
        assert_eq!(strict.effective_permissions(), Permissions::all());
        assert_eq!(strict.permissions(), Permissions::PRINTABLE);
    }

    #[test]
    fn stream_dictionary_strings_are_deciphered() {
        let mut ctx = context(4, 128, Revision::R4, CryptOptions::default());
        assert!(ctx.authenticate(b"").unwrap());

        let original = Object::Stream(Stream::new(
            dictionary! { "Title" => Object::String(b"caption".to_vec(), StringFormat::Literal) },
            b"stream body".to_vec(),
        ));
        let mut object = original.clone();

        ctx.encrypt((9, 0), &mut object).unwrap();
        let encrypted = object.as_stream().unwrap();
        assert_ne!(encrypted.dict.get(b"Title").unwrap().as_str().unwrap(), b"caption");
        assert_eq!(encrypted.dict.get(b"Length").unwrap().as_i64().unwrap(), encrypted.content.len() as i64);

        assert_eq!(ctx.decrypt((9, 0), &mut object).unwrap(), DecryptOutcome::Deciphered);
        assert_eq!(object, original);
    }

    #[test]
    fn crypt_filter_name_in_filter_chain() {
        let chain = Stream::new(
            dictionary! {
                "Filter" => vec![Object::from("FlateDecode"), Object::from("Crypt")],
                "DecodeParms" => vec![
                    Object::Null,
                    Object::Dictionary(dictionary! { "Name" => "StdCF" }),
                ],
            },
            vec![],
        );
        assert_eq!(crypt_filter_name(&chain), Some(&b"StdCF"[..]));

        let single = Stream::new(
            dictionary! {
                "Filter" => "Crypt",
                "DecodeParms" => dictionary! { "Type" => "CryptFilterDecodeParms" },
            },
            vec![],
        );
        assert_eq!(crypt_filter_name(&single), None);
    }

    #[test]
    fn context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CryptContext>();
    }
}
