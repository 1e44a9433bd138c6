use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Dictionary, Object, StringFormat};
use super::crypt_filters::*;
use super::{DecryptionError, Revision};

/// The method (/CFM) of a crypt filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptMethod {
    /// `None`: the data is not encrypted.
    Identity,
    /// RC4.
    V2,
    /// AES-128 in CBC mode.
    AesV2,
    /// AES-256 in CBC mode.
    AesV3,
}

impl CryptMethod {
    pub fn from_name(name: &[u8]) -> Result<Self, DecryptionError> {
        match name {
            b"None" | b"Identity" => Ok(CryptMethod::Identity),
            b"V2" => Ok(CryptMethod::V2),
            b"AESV2" => Ok(CryptMethod::AesV2),
            b"AESV3" => Ok(CryptMethod::AesV3),
            _ => Err(DecryptionError::UnsupportedCryptFilter(name.to_vec())),
        }
    }

    pub fn name(self) -> &'static [u8] {
        match self {
            CryptMethod::Identity => b"None",
            CryptMethod::V2 => b"V2",
            CryptMethod::AesV2 => b"AESV2",
            CryptMethod::AesV3 => b"AESV3",
        }
    }

    pub fn to_filter(self, strict_padding: bool) -> Arc<dyn CryptFilter> {
        match self {
            CryptMethod::Identity => Arc::new(IdentityCryptFilter),
            CryptMethod::V2 => Arc::new(Rc4CryptFilter),
            CryptMethod::AesV2 => Arc::new(Aes128CryptFilter { strict_padding }),
            CryptMethod::AesV3 => Arc::new(Aes256CryptFilter { strict_padding }),
        }
    }
}

/// An entry of the /CF dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptFilterEntry {
    pub method: CryptMethod,
    /// Key length in bytes, if given.
    pub length: Option<u32>,
    pub auth_event: Option<Vec<u8>>,
}

impl CryptFilterEntry {
    pub fn new(method: CryptMethod) -> Self {
        let length = match method {
            CryptMethod::Identity => None,
            CryptMethod::V2 | CryptMethod::AesV2 => Some(16),
            CryptMethod::AesV3 => Some(32),
        };

        CryptFilterEntry {
            method,
            length,
            auth_event: Some(b"DocOpen".to_vec()),
        }
    }

    fn from_dictionary(dict: &Dictionary) -> Result<Self, DecryptionError> {
        let method = match dict.get(b"CFM") {
            Ok(method) => CryptMethod::from_name(method.as_name().map_err(|_| DecryptionError::InvalidType)?)?,
            Err(_) => CryptMethod::Identity,
        };

        let length = match dict.get(b"Length") {
            Ok(length) => Some(length.as_i64().map_err(|_| DecryptionError::InvalidType)?),
            Err(_) => None,
        };
        // Some writers give the length in bits rather than bytes.
        let length = length.map(|length| {
            let length = if length > 32 { length / 8 } else { length };
            length as u32
        });

        let auth_event = dict.get(b"AuthEvent").and_then(Object::as_name).ok().map(<[u8]>::to_vec);

        Ok(CryptFilterEntry {
            method,
            length,
            auth_event,
        })
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut dict = dictionary! {
            "Type" => "CryptFilter",
            "CFM" => Object::Name(self.method.name().to_vec()),
        };
        if let Some(length) = self.length {
            dict.set("Length", length as i64);
        }
        if let Some(auth_event) = &self.auth_event {
            dict.set("AuthEvent", Object::Name(auth_event.clone()));
        }
        dict
    }
}

/// The algorithm part of an /Encrypt dictionary, independent of the security handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionDictionary {
    pub filter: Vec<u8>,
    pub sub_filter: Option<Vec<u8>>,
    /// /V, one of 1, 2, 4 or 5.
    pub version: i64,
    /// /Length in bits.
    pub length: u32,
    pub crypt_filters: BTreeMap<Vec<u8>, CryptFilterEntry>,
    pub stream_filter: Vec<u8>,
    pub string_filter: Vec<u8>,
    pub embedded_file_filter: Vec<u8>,
    pub encrypt_metadata: bool,
}

const IDENTITY: &[u8] = b"Identity";
const STANDARD_CRYPT_FILTER: &[u8] = b"StdCF";

impl EncryptionDictionary {
    /// A dictionary for the standard security handler. Versions 4 and 5 get a single /StdCF
    /// filter using AES.
    pub fn standard(version: i64, length: u32, encrypt_metadata: bool) -> Self {
        match version {
            4 => Self::with_crypt_filter(4, CryptMethod::AesV2, encrypt_metadata),
            5 => Self::with_crypt_filter(5, CryptMethod::AesV3, encrypt_metadata),
            _ => EncryptionDictionary {
                filter: b"Standard".to_vec(),
                sub_filter: None,
                version,
                length: if version == 1 { 40 } else { length },
                crypt_filters: BTreeMap::new(),
                stream_filter: IDENTITY.to_vec(),
                string_filter: IDENTITY.to_vec(),
                embedded_file_filter: IDENTITY.to_vec(),
                encrypt_metadata,
            },
        }
    }

    /// A version 4 or 5 dictionary whose strings and streams use one /StdCF filter.
    pub fn with_crypt_filter(version: i64, method: CryptMethod, encrypt_metadata: bool) -> Self {
        let mut crypt_filters = BTreeMap::new();
        crypt_filters.insert(STANDARD_CRYPT_FILTER.to_vec(), CryptFilterEntry::new(method));

        EncryptionDictionary {
            filter: b"Standard".to_vec(),
            sub_filter: None,
            version,
            length: if version == 5 { 256 } else { 128 },
            crypt_filters,
            stream_filter: STANDARD_CRYPT_FILTER.to_vec(),
            string_filter: STANDARD_CRYPT_FILTER.to_vec(),
            embedded_file_filter: STANDARD_CRYPT_FILTER.to_vec(),
            encrypt_metadata,
        }
    }

    pub fn from_dictionary(dict: &Dictionary) -> Result<Self, DecryptionError> {
        let filter = dict
            .get(b"Filter")
            .and_then(Object::as_name)
            .map_err(|_| DecryptionError::InvalidType)?
            .to_vec();
        if filter != b"Standard" {
            return Err(DecryptionError::UnsupportedSecurityHandler(filter));
        }

        let sub_filter = dict.get(b"SubFilter").and_then(Object::as_name).ok().map(<[u8]>::to_vec);

        let version = dict
            .get(b"V")
            .map_err(|_| DecryptionError::MissingVersion)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)?;

        let length = match dict.get(b"Length") {
            Ok(length) => Some(length.as_i64().map_err(|_| DecryptionError::InvalidType)?),
            Err(_) => None,
        };

        let length = match version {
            0 | 3 => return Err(DecryptionError::InvalidVersion),
            1 => match length.unwrap_or(40) {
                40 => 40,
                _ => return Err(DecryptionError::InvalidKeyLength),
            },
            2 => match length.unwrap_or(40) {
                length @ 40..=128 if length % 8 == 0 => length as u32,
                _ => return Err(DecryptionError::InvalidKeyLength),
            },
            // Refined from the /CF entry below.
            4 => 128,
            5 => 256,
            _ => return Err(DecryptionError::UnsupportedVersion),
        };

        let mut crypt_filters = BTreeMap::new();
        if version >= 4 {
            let filters = dict
                .get(b"CF")
                .map_err(|_| DecryptionError::MissingCryptFilters)?
                .as_dict()
                .map_err(|_| DecryptionError::InvalidType)?;

            for (name, entry) in filters {
                let entry = entry.as_dict().map_err(|_| DecryptionError::InvalidType)?;
                crypt_filters.insert(name.clone(), CryptFilterEntry::from_dictionary(entry)?);
            }
        }

        let filter_name = |key: &[u8]| -> Result<Option<Vec<u8>>, DecryptionError> {
            match dict.get(key) {
                Ok(name) => Ok(Some(name.as_name().map_err(|_| DecryptionError::InvalidType)?.to_vec())),
                Err(_) => Ok(None),
            }
        };

        let stream_filter = filter_name(b"StmF")?.unwrap_or_else(|| IDENTITY.to_vec());
        let string_filter = filter_name(b"StrF")?.unwrap_or_else(|| IDENTITY.to_vec());
        let embedded_file_filter = filter_name(b"EFF")?.unwrap_or_else(|| stream_filter.clone());

        let encrypt_metadata = match dict.get(b"EncryptMetadata") {
            Ok(value) => value.as_bool().map_err(|_| DecryptionError::InvalidType)?,
            Err(_) => true,
        };

        let mut dictionary = EncryptionDictionary {
            filter,
            sub_filter,
            version,
            length,
            crypt_filters,
            stream_filter,
            string_filter,
            embedded_file_filter,
            encrypt_metadata,
        };

        // Fail on parsing rather than on the first object when a filter is undefined.
        for name in [&dictionary.stream_filter, &dictionary.string_filter, &dictionary.embedded_file_filter] {
            dictionary.default_filter(name, true)?;
        }

        if version == 4 {
            let key_length = dictionary.key_length_bytes();
            if !(5..=16).contains(&key_length) {
                return Err(DecryptionError::InvalidKeyLength);
            }
            dictionary.length = key_length as u32 * 8;
        }

        Ok(dictionary)
    }

    /// The file encryption key length in bytes for revisions 2 to 4.
    ///
    /// Version 4 takes it from the /CF entry of the stream or string filter and falls back to
    /// /Length when that entry has none.
    pub fn key_length_bytes(&self) -> usize {
        match self.crypt_filter_key_length() {
            Some(length) => length as usize,
            None => (self.length / 8) as usize,
        }
    }

    fn crypt_filter_key_length(&self) -> Option<u32> {
        if self.version != 4 {
            return None;
        }

        [&self.stream_filter, &self.string_filter]
            .into_iter()
            .filter_map(|name| self.crypt_filters.get(name))
            .filter(|entry| entry.method != CryptMethod::Identity)
            .find_map(|entry| entry.length)
    }

    /// Map a crypt filter name to its implementation.
    ///
    /// `Identity` always names the identity filter. Versions 1 and 2 have a single implicit RC4
    /// filter; later versions look the name up in /CF.
    pub fn resolve_filter(&self, name: &[u8], strict_padding: bool) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        if name == IDENTITY {
            return Ok(Arc::new(IdentityCryptFilter));
        }

        if self.version < 4 {
            return Ok(Arc::new(Rc4CryptFilter));
        }

        self.crypt_filters
            .get(name)
            .map(|entry| entry.method.to_filter(strict_padding))
            .ok_or_else(|| DecryptionError::MissingCryptFilter(name.to_vec()))
    }

    /// The filter for a default filter name (/StrF, /StmF or /EFF), which versions 1 and 2 do
    /// not have.
    fn default_filter(&self, name: &[u8], strict_padding: bool) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        if self.version < 4 {
            return Ok(Arc::new(Rc4CryptFilter));
        }

        self.resolve_filter(name, strict_padding)
    }

    pub fn string_crypt_filter(&self, strict_padding: bool) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        self.default_filter(&self.string_filter, strict_padding)
    }

    pub fn stream_crypt_filter(&self, strict_padding: bool) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        self.default_filter(&self.stream_filter, strict_padding)
    }

    pub fn embedded_file_crypt_filter(&self, strict_padding: bool) -> Result<Arc<dyn CryptFilter>, DecryptionError> {
        self.default_filter(&self.embedded_file_filter, strict_padding)
    }

    /// Write the algorithm entries back into an /Encrypt dictionary.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = dictionary! {
            "Filter" => Object::Name(self.filter.clone()),
            "V" => self.version,
            "Length" => self.length as i64,
        };

        if let Some(sub_filter) = &self.sub_filter {
            dict.set("SubFilter", Object::Name(sub_filter.clone()));
        }

        if self.version >= 4 {
            let filters = self
                .crypt_filters
                .iter()
                .map(|(name, entry)| (name.clone(), Object::Dictionary(entry.to_dictionary())))
                .collect::<Dictionary>();
            dict.set("CF", filters);
            dict.set("StmF", Object::Name(self.stream_filter.clone()));
            dict.set("StrF", Object::Name(self.string_filter.clone()));
            if self.embedded_file_filter != self.stream_filter {
                dict.set("EFF", Object::Name(self.embedded_file_filter.clone()));
            }
            dict.set("EncryptMetadata", self.encrypt_metadata);
        }

        dict
    }
}

/// The standard security handler entries of an /Encrypt dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardSecurityParams {
    pub revision: Revision,
    /// /P, the permission flags as a 32-bit pattern.
    pub permissions: i32,
    /// /O, 32 bytes for revision 4 and earlier, 48 bytes otherwise.
    pub owner_value: Vec<u8>,
    /// /U, 32 bytes for revision 4 and earlier, 48 bytes otherwise.
    pub user_value: Vec<u8>,
    /// /OE (revision 5 and later).
    pub owner_encrypted: Option<Vec<u8>>,
    /// /UE (revision 5 and later).
    pub user_encrypted: Option<Vec<u8>>,
    /// /Perms (revision 5 and later).
    pub permissions_encrypted: Option<Vec<u8>>,
    pub encrypt_metadata: bool,
}

impl StandardSecurityParams {
    pub fn from_dictionary(dict: &Dictionary) -> Result<Self, DecryptionError> {
        let revision = dict
            .get(b"R")
            .map_err(|_| DecryptionError::MissingRevision)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)?;
        let revision = Revision::try_from(revision)?;

        let string = |key: &[u8], missing: DecryptionError| -> Result<Vec<u8>, DecryptionError> {
            dict.get(key)
                .map_err(|_| missing)?
                .as_str()
                .map(<[u8]>::to_vec)
                .map_err(|_| DecryptionError::InvalidType)
        };
        let optional_string = |key: &[u8]| -> Result<Option<Vec<u8>>, DecryptionError> {
            match dict.get(key) {
                Ok(value) => Ok(Some(value.as_str().map_err(|_| DecryptionError::InvalidType)?.to_vec())),
                Err(_) => Ok(None),
            }
        };

        let mut owner_value = string(b"O", DecryptionError::MissingOwnerPassword)?;
        let mut user_value = string(b"U", DecryptionError::MissingUserPassword)?;

        // Any integer representation of /P is reduced to its low-order 32 bits.
        let permissions = dict
            .get(b"P")
            .map_err(|_| DecryptionError::MissingPermissions)?
            .as_i64()
            .map_err(|_| DecryptionError::InvalidType)? as i32;

        let encrypt_metadata = match dict.get(b"EncryptMetadata") {
            Ok(value) => value.as_bool().map_err(|_| DecryptionError::InvalidType)?,
            Err(_) => true,
        };

        let (owner_encrypted, user_encrypted, mut permissions_encrypted) = if revision.is_aes256() {
            // Only the first 48 bytes of /O and /U are used.
            if owner_value.len() < 48 || user_value.len() < 48 {
                return Err(DecryptionError::InvalidHashLength);
            }
            owner_value.truncate(48);
            user_value.truncate(48);

            (
                Some(string(b"OE", DecryptionError::MissingOwnerPassword)?),
                Some(string(b"UE", DecryptionError::MissingUserPassword)?),
                optional_string(b"Perms")?,
            )
        } else {
            (None, None, None)
        };

        if let Some(perms) = permissions_encrypted.as_mut() {
            if perms.len() < 16 {
                return Err(DecryptionError::InvalidEncryptedKeyLength);
            }
            perms.truncate(16);
        }

        let params = StandardSecurityParams {
            revision,
            permissions,
            owner_value,
            user_value,
            owner_encrypted,
            user_encrypted,
            permissions_encrypted,
            encrypt_metadata,
        };
        params.validate()?;

        Ok(params)
    }

    /// Check the lengths of the password entries.
    pub fn validate(&self) -> Result<(), DecryptionError> {
        if self.revision.is_aes256() {
            if self.owner_value.len() != 48 || self.user_value.len() != 48 {
                return Err(DecryptionError::InvalidHashLength);
            }

            let encrypted = [&self.owner_encrypted, &self.user_encrypted];
            if encrypted.into_iter().flatten().any(|value| value.len() != 32) {
                return Err(DecryptionError::InvalidEncryptedKeyLength);
            }
            if self.permissions_encrypted.as_ref().is_some_and(|value| value.len() != 16) {
                return Err(DecryptionError::InvalidEncryptedKeyLength);
            }
        } else if self.owner_value.len() != 32 || self.user_value.len() != 32 {
            return Err(DecryptionError::InvalidHashLength);
        }

        Ok(())
    }

    /// Write the handler entries into an /Encrypt dictionary.
    pub fn write_to(&self, dict: &mut Dictionary) {
        let hex = |value: &[u8]| Object::String(value.to_vec(), StringFormat::Hexadecimal);

        dict.set("R", self.revision.number());
        dict.set("P", self.permissions as i64);
        dict.set("O", hex(&self.owner_value));
        dict.set("U", hex(&self.user_value));

        if let Some(owner_encrypted) = &self.owner_encrypted {
            dict.set("OE", hex(owner_encrypted));
        }
        if let Some(user_encrypted) = &self.user_encrypted {
            dict.set("UE", hex(user_encrypted));
        }
        if let Some(perms) = &self.permissions_encrypted {
            dict.set("Perms", hex(perms));
        }
    }
}

/// The first element of the trailer /ID array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileIdentifier(Vec<u8>);

impl FileIdentifier {
    pub fn new(id: Vec<u8>) -> Self {
        FileIdentifier(id)
    }

    pub fn from_trailer(trailer: &Dictionary) -> Option<Self> {
        let ids = trailer.get(b"ID").and_then(Object::as_array).ok()?;
        let first = ids.first()?.as_str().ok()?;

        Some(FileIdentifier(first.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aes_dictionary() -> Dictionary {
        dictionary! {
            "Filter" => "Standard",
            "V" => 4,
            "Length" => 128,
            "CF" => dictionary! {
                "StdCF" => dictionary! {
                    "CFM" => "AESV2",
                    "Length" => 16,
                    "AuthEvent" => "DocOpen",
                },
            },
            "StmF" => "StdCF",
            "StrF" => "StdCF",
            "EncryptMetadata" => false,
        }
    }

    #[test]
    fn parses_crypt_filters() {
        let dictionary = EncryptionDictionary::from_dictionary(&aes_dictionary()).unwrap();

        assert_eq!(dictionary.version, 4);
        assert_eq!(dictionary.length, 128);
        assert!(!dictionary.encrypt_metadata);
        assert_eq!(dictionary.embedded_file_filter, b"StdCF");

        let entry = &dictionary.crypt_filters[&b"StdCF".to_vec()];
        assert_eq!(entry.method, CryptMethod::AesV2);
        assert_eq!(entry.length, Some(16));
        assert_eq!(entry.auth_event.as_deref(), Some(&b"DocOpen"[..]));

        assert_eq!(dictionary.string_crypt_filter(true).unwrap().method(), b"AESV2");
        assert_eq!(dictionary.resolve_filter(b"Identity", true).unwrap().method(), b"Identity");
        assert!(matches!(
            dictionary.resolve_filter(b"Other", true),
            Err(DecryptionError::MissingCryptFilter(name)) if name == b"Other"
        ));
    }

    #[test]
    fn crypt_filter_sets_v4_key_length() {
        let rc4_filter = |length: i64| {
            let mut dict = aes_dictionary();
            dict.set(
                "CF",
                dictionary! { "StdCF" => dictionary! { "CFM" => "V2", "Length" => length } },
            );
            EncryptionDictionary::from_dictionary(&dict)
        };

        let bytes = rc4_filter(5).unwrap();
        assert_eq!(bytes.key_length_bytes(), 5);
        assert_eq!(bytes.length, 40);

        // Lengths above 32 are bits.
        assert_eq!(rc4_filter(40).unwrap().key_length_bytes(), 5);
        assert!(matches!(rc4_filter(3), Err(DecryptionError::InvalidKeyLength)));

        // Without a /Length in the filter the key is 128 bits.
        let mut dict = aes_dictionary();
        dict.set("CF", dictionary! { "StdCF" => dictionary! { "CFM" => "V2" } });
        assert_eq!(EncryptionDictionary::from_dictionary(&dict).unwrap().key_length_bytes(), 16);
    }

    #[test]
    fn absent_filter_names_mean_identity() {
        let mut dict = aes_dictionary();
        dict.remove(b"StmF");
        dict.remove(b"StrF");

        let dictionary = EncryptionDictionary::from_dictionary(&dict).unwrap();
        assert_eq!(dictionary.stream_crypt_filter(true).unwrap().method(), b"Identity");
        assert_eq!(dictionary.string_crypt_filter(true).unwrap().method(), b"Identity");
    }

    #[test]
    fn undefined_filter_fails_parsing() {
        let mut dict = aes_dictionary();
        dict.set("StrF", "Missing");
        assert!(matches!(
            EncryptionDictionary::from_dictionary(&dict),
            Err(DecryptionError::MissingCryptFilter(_))
        ));

        dict.remove(b"CF");
        assert!(matches!(
            EncryptionDictionary::from_dictionary(&dict),
            Err(DecryptionError::MissingCryptFilters)
        ));
    }

    #[test]
    fn version_and_length_rules() {
        let parse = |version: i64, length: Option<i64>| {
            let mut dict = dictionary! { "Filter" => "Standard", "V" => version };
            if let Some(length) = length {
                dict.set("Length", length);
            }
            EncryptionDictionary::from_dictionary(&dict)
        };

        assert_eq!(parse(1, None).unwrap().key_length_bytes(), 5);
        assert_eq!(parse(2, Some(128)).unwrap().key_length_bytes(), 16);
        assert_eq!(parse(2, None).unwrap().length, 40);
        assert_eq!(parse(2, Some(56)).unwrap().length, 56);
        assert!(matches!(parse(1, Some(128)), Err(DecryptionError::InvalidKeyLength)));
        assert!(matches!(parse(2, Some(44)), Err(DecryptionError::InvalidKeyLength)));
        assert!(matches!(parse(2, Some(256)), Err(DecryptionError::InvalidKeyLength)));
        assert!(matches!(parse(0, None), Err(DecryptionError::InvalidVersion)));
        assert!(matches!(parse(3, None), Err(DecryptionError::InvalidVersion)));
        assert!(matches!(parse(6, None), Err(DecryptionError::UnsupportedVersion)));

        let rc4 = parse(2, Some(128)).unwrap();
        assert_eq!(rc4.stream_crypt_filter(true).unwrap().method(), b"V2");
        assert_eq!(rc4.string_crypt_filter(true).unwrap().method(), b"V2");
    }

    #[test]
    fn other_security_handlers_are_rejected() {
        let dict = dictionary! { "Filter" => "Adobe.PubSec", "V" => 4 };
        assert!(matches!(
            EncryptionDictionary::from_dictionary(&dict),
            Err(DecryptionError::UnsupportedSecurityHandler(name)) if name == b"Adobe.PubSec"
        ));

        let missing = dictionary! { "Filter" => "Standard" };
        assert!(matches!(
            EncryptionDictionary::from_dictionary(&missing),
            Err(DecryptionError::MissingVersion)
        ));
    }

    #[test]
    fn dictionary_round_trip() {
        let dictionary = EncryptionDictionary::with_crypt_filter(4, CryptMethod::V2, false);
        let parsed = EncryptionDictionary::from_dictionary(&dictionary.to_dictionary()).unwrap();
        assert_eq!(parsed, dictionary);
    }

    #[test]
    fn security_params_lengths() {
        let mut dict = dictionary! {
            "R" => 3,
            "P" => 0xfffff0c0_u32 as i64,
            "O" => Object::string_literal(vec![0u8; 32]),
            "U" => Object::string_literal(vec![0u8; 32]),
        };

        let params = StandardSecurityParams::from_dictionary(&dict).unwrap();
        assert_eq!(params.revision, Revision::R3);
        assert_eq!(params.permissions, 0xfffff0c0_u32 as i32);
        assert!(params.encrypt_metadata);

        dict.set("P", -3904);
        assert_eq!(StandardSecurityParams::from_dictionary(&dict).unwrap().permissions, -3904);

        dict.set("U", Object::string_literal(vec![0u8; 31]));
        assert!(matches!(
            StandardSecurityParams::from_dictionary(&dict),
            Err(DecryptionError::InvalidHashLength)
        ));

        dict.remove(b"U");
        assert!(matches!(
            StandardSecurityParams::from_dictionary(&dict),
            Err(DecryptionError::MissingUserPassword)
        ));

        dict.set("R", 7);
        assert!(matches!(
            StandardSecurityParams::from_dictionary(&dict),
            Err(DecryptionError::UnsupportedRevision)
        ));
    }

    #[test]
    fn aes256_params_keep_48_bytes() {
        let dict = dictionary! {
            "R" => 6,
            "P" => -4,
            "O" => Object::string_literal(vec![1u8; 127]),
            "U" => Object::string_literal(vec![2u8; 48]),
            "OE" => Object::string_literal(vec![3u8; 32]),
            "UE" => Object::string_literal(vec![4u8; 32]),
            "Perms" => Object::string_literal(vec![5u8; 16]),
        };

        let params = StandardSecurityParams::from_dictionary(&dict).unwrap();
        assert_eq!(params.owner_value, vec![1u8; 48]);
        assert_eq!(params.permissions_encrypted, Some(vec![5u8; 16]));

        let mut written = Dictionary::new();
        params.write_to(&mut written);
        assert_eq!(StandardSecurityParams::from_dictionary(&written).unwrap(), params);

        let mut short = dict.clone();
        short.set("UE", Object::string_literal(vec![4u8; 16]));
        assert!(matches!(
            StandardSecurityParams::from_dictionary(&short),
            Err(DecryptionError::InvalidEncryptedKeyLength)
        ));
    }

    #[test]
    fn file_identifier_from_trailer() {
        let trailer = dictionary! {
            "ID" => vec![Object::string_literal(b"first".to_vec()), Object::string_literal(b"second".to_vec())],
        };
        assert_eq!(FileIdentifier::from_trailer(&trailer).unwrap().as_bytes(), b"first");
        assert!(FileIdentifier::from_trailer(&Dictionary::new()).is_none());
    }
}
