//! The numbered algorithms of the standard security handler (ISO 32000-2:2020, 7.6.4).
//!
//! Everything here is a pure function over byte slices; choosing which algorithm applies to a
//! document is the job of [`StandardSecurityHandler`](super::StandardSecurityHandler).

use aes::cipher::{BlockDecryptMut as _, BlockEncryptMut as _, KeyInit as _, KeyIvInit as _};
use md5::{Digest as _, Md5};
use sha2::{Sha256, Sha384, Sha512};

use super::DecryptionError;
use super::Revision;
use super::rc4::Rc4;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// If the password string is less than 32 bytes long, pad it by appending the required number of
/// additional bytes from the beginning of the following padding string.
pub const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes (first step of algorithm 2).
///
/// If the password is n bytes long, the first 32 - n bytes of [`PAD_BYTES`] are appended. An
/// empty password is replaced by the whole padding string.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let len = password.len().min(32);

    let mut padded = [0u8; 32];
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PAD_BYTES[..32 - len]);
    padded
}

/// The number of bytes of the RC4 file encryption key, 5 for revision 2.
fn rc4_key_length(revision: Revision, key_length: usize) -> Result<usize, DecryptionError> {
    let n = match revision {
        Revision::R2 => 5,
        _ => key_length,
    };

    // The maximum supported key length is 16 bytes (128 bits) due to the use of MD5.
    if !(5..=16).contains(&n) {
        return Err(DecryptionError::InvalidKeyLength);
    }

    Ok(n)
}

/// Compute a file encryption key in order to encrypt/decrypt a document (revision 4 and
/// earlier).
///
/// This implements Algorithm 2 as described in ISO 32000-2:2020 (PDF 2.0). `key_length` is the
/// value of /Length in bytes.
pub fn compute_file_encryption_key_r4(
    revision: Revision,
    password: &[u8],
    owner_value: &[u8],
    p: i32,
    file_id: &[u8],
    encrypt_metadata: bool,
    key_length: usize,
) -> Result<Vec<u8>, DecryptionError> {
    let n = rc4_key_length(revision, key_length)?;

    // Initialize the MD5 hash function and pass the padded password as input to this function.
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));

    // Pass the value of the encryption dictionary's O entry (owner password hash) to the MD5 hash
    // function.
    hasher.update(owner_value);

    // Convert the integer value of the P entry (permissions) to a 32-bit unsigned binary number
    // and pass these bytes to the MD5 hash function, low-order byte first.
    hasher.update((p as u32).to_le_bytes());

    // Pass the first element of the file's file identifier array to the MD5 hash function.
    hasher.update(file_id);

    // (Security handlers of revision 4 or greater) If document metadata is not being encrypted,
    // pass 4 bytes with the value 0xFFFFFFFF to the MD5 hash function.
    if revision.hashes_metadata_flag() && !encrypt_metadata {
        hasher.update(b"\xff\xff\xff\xff");
    }

    let mut hash = hasher.finalize();

    // (Security handlers of revision 3 or greater) Do the following 50 times: take the output from
    // the previous MD5 hash and pass the first n bytes of the output as input into a new MD5 hash.
    for _ in 0..revision.md5_rounds() {
        hash = Md5::digest(&hash[..n]);
    }

    // Set the file encryption key to the first n bytes of the output from the final MD5 hash.
    Ok(hash[..n].to_vec())
}

/// The RC4 key protecting the O entry, derived from the owner password (steps a-d of
/// algorithm 3).
fn compute_owner_key_r4(revision: Revision, key_length: usize, owner_password: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    let n = rc4_key_length(revision, key_length)?;

    let mut hash = Md5::digest(pad_password(owner_password));

    // (Security handlers of revision 3 or greater) Do the following 50 times: take the output from
    // the previous MD5 hash and pass it as input into a new MD5 hash.
    for _ in 0..revision.md5_rounds() {
        hash = Md5::digest(hash);
    }

    Ok(hash[..n].to_vec())
}

/// Runs RC4 over `data` once with `key` and then, for revision 3 or greater, 19 more times with
/// the key bytes XORed with the round counter. `reverse` undoes the forward direction.
fn rc4_rounds(revision: Revision, key: &[u8], data: &[u8], reverse: bool) -> Vec<u8> {
    let mut round_key = vec![0u8; key.len()];
    let mut apply = |counter: u8, data: &[u8]| {
        for (in_byte, out_byte) in key.iter().zip(round_key.iter_mut()) {
            *out_byte = in_byte ^ counter;
        }
        Rc4::new(&round_key).encrypt(data)
    };

    let counters = 0..=revision.rc4_extra_rounds();
    if reverse {
        counters.rev().fold(data.to_vec(), |data, counter| apply(counter, &data))
    } else {
        counters.fold(data.to_vec(), |data, counter| apply(counter, &data))
    }
}

/// Compute the encryption dictionary's O-entry value (revision 4 and earlier).
///
/// This implements Algorithm 3 as described in ISO 32000-2:2020 (PDF 2.0). When there is no
/// owner password the user password is used instead.
pub fn compute_hashed_owner_password_r4(
    revision: Revision,
    key_length: usize,
    owner_password: Option<&[u8]>,
    user_password: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let key = compute_owner_key_r4(revision, key_length, owner_password.unwrap_or(user_password))?;

    // Encrypt the padded user password with the RC4 key (and, for revision 3 or greater, 19 more
    // times with derived keys). The result is the value of the O entry.
    Ok(rc4_rounds(revision, &key, &pad_password(user_password), false))
}

/// Recover the padded user password from the O entry using the owner password.
///
/// These are the decryption steps of Algorithm 7 as described in ISO 32000-2:2020 (PDF 2.0);
/// the caller authenticates the result as a user password.
pub fn recover_user_password_r4(
    revision: Revision,
    key_length: usize,
    owner_password: &[u8],
    owner_value: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let key = compute_owner_key_r4(revision, key_length, owner_password)?;

    // Decrypt the O entry with keys XORed with 19 down to 1 (revision 3 or greater), then with
    // the unmodified key.
    Ok(rc4_rounds(revision, &key, owner_value, true))
}

/// Compute the encryption dictionary's U-entry value (revision 2).
///
/// This implements Algorithm 4 as described in ISO 32000-2:2020 (PDF 2.0).
pub fn compute_hashed_user_password_r2(file_encryption_key: &[u8]) -> Vec<u8> {
    // Encrypt the 32-byte padding string using an RC4 encryption function with the file
    // encryption key.
    Rc4::new(file_encryption_key).encrypt(PAD_BYTES)
}

/// Compute the encryption dictionary's U-entry value (revision 3 or 4).
///
/// This implements Algorithm 5 as described in ISO 32000-2:2020 (PDF 2.0). Only the first 16
/// bytes are significant; the rest is zero.
pub fn compute_hashed_user_password_r3_r4(file_encryption_key: &[u8], file_id: &[u8]) -> Vec<u8> {
    // Initialize the MD5 hash function and pass the 32-byte padding string and the first element
    // of the file identifier array.
    let mut hasher = Md5::new();
    hasher.update(PAD_BYTES);
    hasher.update(file_id);
    let hash = hasher.finalize();

    // Encrypt the 16-byte result of the hash with the file encryption key, then 19 more times
    // with the key bytes XORed with the iteration counter.
    let mut result = rc4_rounds(Revision::R3, file_encryption_key, &hash, false);

    result.resize(32, 0);
    result
}

/// Compute a hash (revision 5 and later).
///
/// This implements Algorithm 2.B as described in ISO 32000-2:2020 (PDF 2.0). Revision 5 uses a
/// single SHA-256 of the input. `user_key` is the 48-byte U string when checking or creating
/// the owner key.
pub fn compute_hash(revision: Revision, password: &[u8], salt: &[u8], user_key: Option<&[u8]>) -> [u8; 32] {
    // Take the SHA-256 hash of the original input to the algorithm and name the resulting 32
    // bytes, K.
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    if let Some(user_key) = user_key {
        hasher.update(user_key);
    }
    let mut k = hasher.finalize().to_vec();

    if revision.uses_hardened_hash() {
        let user_key = user_key.unwrap_or_default();
        let mut k1 = Vec::with_capacity(64 * (password.len() + 64 + user_key.len()));

        // Perform the following steps at least 64 times, until the value of the last byte in E is
        // less than or equal to (round number) - 32.
        for round in 1u32.. {
            // K1 is 64 repetitions of K0 = password || K || user key.
            k1.clear();
            for _ in 0..64 {
                k1.extend_from_slice(password);
                k1.extend_from_slice(&k);
                k1.extend_from_slice(user_key);
            }

            // Encrypt K1 with AES-128 (CBC, no padding), using the first 16 bytes of K as the key
            // and the second 16 bytes of K as the initialization vector. K1 is a multiple of 64
            // bytes, so no padding is needed. The result is E.
            let (key, iv) = (&k[..16], &k[16..32]);
            let mut encryptor = Aes128CbcEnc::new(key.into(), iv.into());
            for block in k1.chunks_exact_mut(16) {
                encryptor.encrypt_block_mut(block.into());
            }
            let e = &k1;

            // The first 16 bytes of E as a big-endian integer, modulo 3, select the next hash.
            // 256 is congruent to 1 modulo 3, so the byte sum has the same remainder.
            k = match e[..16].iter().map(|v| *v as u32).sum::<u32>() % 3 {
                0 => Sha256::digest(e).to_vec(),
                1 => Sha384::digest(e).to_vec(),
                _ => Sha512::digest(e).to_vec(),
            };

            if round >= 64 && e.last().copied().unwrap_or(0) as u32 <= round - 32 {
                break;
            }
        }
    }

    // The first 32 bytes of the final K are the output of the algorithm.
    let mut output = [0u8; 32];
    output.copy_from_slice(&k[..32]);
    output
}

/// Decrypt a wrapped file encryption key (OE or UE) using AES-256 in CBC mode with no padding
/// and an initialization vector of zero.
pub fn unwrap_file_encryption_key(key: &[u8; 32], wrapped: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if wrapped.len() != 32 {
        return Err(DecryptionError::InvalidEncryptedKeyLength);
    }

    let mut file_encryption_key = wrapped.to_vec();
    let mut decryptor = Aes256CbcDec::new(&(*key).into(), &[0u8; 16].into());
    for block in file_encryption_key.chunks_exact_mut(16) {
        decryptor.decrypt_block_mut(block.into());
    }

    Ok(file_encryption_key)
}

/// Inverse of [`unwrap_file_encryption_key`].
pub fn wrap_file_encryption_key(key: &[u8; 32], file_encryption_key: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if file_encryption_key.len() != 32 {
        return Err(DecryptionError::InvalidKeyLength);
    }

    let mut wrapped = file_encryption_key.to_vec();
    let mut encryptor = Aes256CbcEnc::new(&(*key).into(), &[0u8; 16].into());
    for block in wrapped.chunks_exact_mut(16) {
        encryptor.encrypt_block_mut(block.into());
    }

    Ok(wrapped)
}

/// Compute the encryption dictionary's U and UE values (revision 5 and later).
///
/// This implements Algorithm 8 as described in ISO 32000-2:2020 (PDF 2.0). `salts` holds the
/// user validation salt followed by the user key salt.
pub fn compute_hashed_user_password_r6(
    revision: Revision,
    file_encryption_key: &[u8],
    user_password: &[u8],
    salts: &[u8; 16],
) -> Result<(Vec<u8>, Vec<u8>), DecryptionError> {
    let (validation_salt, key_salt) = salts.split_at(8);

    // The 48-byte U string is the hash of password || validation salt, followed by both salts.
    let mut user_value = compute_hash(revision, user_password, validation_salt, None).to_vec();
    user_value.extend_from_slice(salts);

    // Hash password || key salt and use the result to wrap the file encryption key as UE.
    let key = compute_hash(revision, user_password, key_salt, None);
    let user_encrypted = wrap_file_encryption_key(&key, file_encryption_key)?;

    Ok((user_value, user_encrypted))
}

/// Compute the encryption dictionary's O and OE values (revision 5 and later).
///
/// This implements Algorithm 9 as described in ISO 32000-2:2020 (PDF 2.0). The 48-byte U string
/// from [`compute_hashed_user_password_r6`] takes part in both hashes.
pub fn compute_hashed_owner_password_r6(
    revision: Revision,
    file_encryption_key: &[u8],
    owner_password: &[u8],
    salts: &[u8; 16],
    user_value: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), DecryptionError> {
    let (validation_salt, key_salt) = salts.split_at(8);

    let mut owner_value = compute_hash(revision, owner_password, validation_salt, Some(user_value)).to_vec();
    owner_value.extend_from_slice(salts);

    let key = compute_hash(revision, owner_password, key_salt, Some(user_value));
    let owner_encrypted = wrap_file_encryption_key(&key, file_encryption_key)?;

    Ok((owner_value, owner_encrypted))
}

/// Compute the encryption dictionary's Perms (permissions) value (revision 5 and later).
///
/// This implements Algorithm 10 as described in ISO 32000-2:2020 (PDF 2.0). `filler` becomes
/// bytes 12-15, which readers ignore.
pub fn compute_permissions(
    file_encryption_key: &[u8],
    p: i32,
    encrypt_metadata: bool,
    filler: [u8; 4],
) -> Result<Vec<u8>, DecryptionError> {
    let key: &[u8; 32] = file_encryption_key
        .try_into()
        .map_err(|_| DecryptionError::InvalidKeyLength)?;

    // Extend P to 64 bits by setting the upper 32 bits to all 1s, low-order byte first.
    let mut bytes = [0u8; 16];
    bytes[..4].copy_from_slice(&(p as u32).to_le_bytes());
    bytes[4..8].copy_from_slice(&[0xff; 4]);

    // Byte 8 is "T" or "F" according to EncryptMetadata, bytes 9-11 are "adb".
    bytes[8] = if encrypt_metadata { b'T' } else { b'F' };
    bytes[9..12].copy_from_slice(b"adb");
    bytes[12..].copy_from_slice(&filler);

    // Encrypt the 16-byte block using AES-256 in ECB mode with the file encryption key.
    Aes256EcbEnc::new(&(*key).into()).encrypt_block_mut((&mut bytes[..]).into());

    Ok(bytes.to_vec())
}

/// Validate the permissions (revision 5 and later).
///
/// This implements Algorithm 13 as described in ISO 32000-2:2020 (PDF 2.0).
pub fn validate_permissions(
    file_encryption_key: &[u8],
    permissions_encrypted: &[u8],
    p: i32,
    encrypt_metadata: bool,
) -> Result<(), DecryptionError> {
    let key: &[u8; 32] = file_encryption_key
        .try_into()
        .map_err(|_| DecryptionError::InvalidKeyLength)?;
    let mut bytes: [u8; 16] = permissions_encrypted
        .try_into()
        .map_err(|_| DecryptionError::InvalidEncryptedKeyLength)?;

    // Decrypt the 16-byte Perms string using AES-256 in ECB mode with the file encryption key.
    Aes256EcbDec::new(&(*key).into()).decrypt_block_mut((&mut bytes[..]).into());

    // Bytes 9-11 must be "adb", bytes 0-3 must match P and byte 8 must match EncryptMetadata.
    let metadata_flag = if encrypt_metadata { b'T' } else { b'F' };
    if &bytes[9..12] != b"adb" || bytes[..4] != (p as u32).to_le_bytes() || bytes[8] != metadata_flag {
        return Err(DecryptionError::PermissionsMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_ID: [u8; 16] = [
        0x4e, 0x00, 0x99, 0xe5, 0x36, 0x78, 0x93, 0x24, 0xff, 0xd5, 0x82, 0xe4, 0xec, 0x0e, 0xa3, 0xb4,
    ];

    // The O entry as it appears in the test document, including two backslash escape bytes.
    const OWNER_VALUE: [u8; 34] = [
        0xE6, 0x00, 0xEC, 0xC2, 0x02, 0x88, 0xAD, 0x8B, 0x5C, 0x72, 0x64, 0xA9, 0x5C, 0x29, 0xC6, 0xA8, 0x3E, 0xE2,
        0x51, 0x76, 0x79, 0xAA, 0x02, 0x18, 0xBE, 0xCE, 0xEA, 0x8B, 0x79, 0x86, 0x72, 0x6A, 0x8C, 0xDB,
    ];

    const P: i32 = 0xfffff0c0_u32 as i32;

    #[test]
    fn pad_password_empty() {
        let padded = pad_password(b"");
        assert_eq!(padded.len(), 32);
        assert_eq!(padded[0], 0x28);
        assert_eq!(padded[31], 0x7A);
        assert_eq!(padded, PAD_BYTES);
    }

    #[test]
    fn pad_password_short_and_long() {
        let padded = pad_password(b"bla");
        assert_eq!(&padded[..3], b"bla");
        assert_eq!(padded[3], 0x28);
        assert_eq!(padded[31], 0x64);

        let long = [b'x'; 40];
        assert_eq!(pad_password(&long), [b'x'; 32]);
    }

    #[test]
    fn file_encryption_key_r3() {
        let key = compute_file_encryption_key_r4(Revision::R3, b"", &OWNER_VALUE, P, &FILE_ID, true, 16).unwrap();

        assert_eq!(
            key,
            [0xf8, 0x94, 0x9c, 0x5a, 0xf5, 0xa0, 0xc0, 0xca, 0x30, 0xb8, 0x91, 0xc1, 0xbb, 0x2c, 0x4f, 0xf5]
        );
    }

    #[test]
    fn file_encryption_key_metadata_flag_is_revision_gated() {
        let r3 = |encrypt_metadata| {
            compute_file_encryption_key_r4(Revision::R3, b"", &OWNER_VALUE, P, &FILE_ID, encrypt_metadata, 16).unwrap()
        };
        let r4 = |encrypt_metadata| {
            compute_file_encryption_key_r4(Revision::R4, b"", &OWNER_VALUE, P, &FILE_ID, encrypt_metadata, 16).unwrap()
        };

        assert_eq!(r3(true), r3(false));
        assert_eq!(r3(true), r4(true));
        assert_ne!(r4(true), r4(false));
    }

    #[test]
    fn file_encryption_key_r2_is_40_bits() {
        let key = compute_file_encryption_key_r4(Revision::R2, b"", &OWNER_VALUE, P, &FILE_ID, true, 16).unwrap();
        assert_eq!(key.len(), 5);

        let too_long = compute_file_encryption_key_r4(Revision::R3, b"", &OWNER_VALUE, P, &FILE_ID, true, 32);
        assert!(matches!(too_long, Err(DecryptionError::InvalidKeyLength)));
    }

    #[test]
    fn hashed_owner_password_r3() {
        let owner_value = compute_hashed_owner_password_r4(Revision::R3, 16, Some(b"test"), b"").unwrap();

        assert_eq!(
            owner_value,
            [
                0xE6, 0x00, 0xEC, 0xC2, 0x02, 0x88, 0xAD, 0x8B, 0x0d, 0x64, 0xA9, 0x29, 0xC6, 0xA8, 0x3E, 0xE2, 0x51,
                0x76, 0x79, 0xAA, 0x02, 0x18, 0xBE, 0xCE, 0xEA, 0x8B, 0x79, 0x86, 0x72, 0x6A, 0x8C, 0xDB
            ]
        );
    }

    #[test]
    fn hashed_user_password_r3() {
        let key = compute_file_encryption_key_r4(Revision::R3, b"", &OWNER_VALUE, P, &FILE_ID, true, 16).unwrap();
        let user_value = compute_hashed_user_password_r3_r4(&key, &FILE_ID);

        assert_eq!(user_value.len(), 32);
        assert_eq!(
            user_value[..16],
            [0x59, 0x66, 0x38, 0x6c, 0x76, 0xfe, 0x95, 0x7d, 0x3d, 0x0d, 0x14, 0x3d, 0x36, 0xfd, 0x01, 0x3d]
        );
        assert_eq!(user_value[16..], [0u8; 16]);
    }

    #[test]
    fn owner_password_recovers_user_password() {
        for revision in [Revision::R2, Revision::R3, Revision::R4] {
            let owner_value = compute_hashed_owner_password_r4(revision, 16, Some(b"owner"), b"user").unwrap();
            let recovered = recover_user_password_r4(revision, 16, b"owner", &owner_value).unwrap();
            assert_eq!(recovered, pad_password(b"user"));

            let wrong = recover_user_password_r4(revision, 16, b"user", &owner_value).unwrap();
            assert_ne!(wrong, pad_password(b"user"));
        }
    }

    #[test]
    fn hardened_hash_differs_from_plain_sha256() {
        let r5 = compute_hash(Revision::R5, b"user", b"saltsalt", None);
        let r6 = compute_hash(Revision::R6, b"user", b"saltsalt", None);

        assert_eq!(r5[..], Sha256::digest(b"usersaltsalt")[..]);
        assert_ne!(r5, r6);
        assert_eq!(r6, compute_hash(Revision::R6, b"user", b"saltsalt", None));
    }

    #[test]
    fn file_encryption_key_wrapping() {
        let key = [7u8; 32];
        let file_encryption_key: Vec<u8> = (0..32).collect();

        let wrapped = wrap_file_encryption_key(&key, &file_encryption_key).unwrap();
        assert_ne!(wrapped, file_encryption_key);
        assert_eq!(unwrap_file_encryption_key(&key, &wrapped).unwrap(), file_encryption_key);

        assert!(matches!(
            unwrap_file_encryption_key(&key, &wrapped[..16]),
            Err(DecryptionError::InvalidEncryptedKeyLength)
        ));
    }

    #[test]
    fn hashed_passwords_r6() {
        let file_encryption_key = [0x42u8; 32];
        let user_salts = *b"uvalsaltukeysalt";
        let owner_salts = *b"ovalsaltokeysalt";

        let (user_value, user_encrypted) =
            compute_hashed_user_password_r6(Revision::R6, &file_encryption_key, b"user", &user_salts).unwrap();
        let (owner_value, owner_encrypted) =
            compute_hashed_owner_password_r6(Revision::R6, &file_encryption_key, b"owner", &owner_salts, &user_value)
                .unwrap();

        assert_eq!(user_value.len(), 48);
        assert_eq!(owner_value.len(), 48);
        assert_eq!(&user_value[32..], &user_salts);

        // The key salt hash unwraps UE back to the file encryption key.
        let user_key = compute_hash(Revision::R6, b"user", b"ukeysalt", None);
        assert_eq!(unwrap_file_encryption_key(&user_key, &user_encrypted).unwrap(), file_encryption_key);

        let owner_key = compute_hash(Revision::R6, b"owner", b"okeysalt", Some(&user_value));
        assert_eq!(unwrap_file_encryption_key(&owner_key, &owner_encrypted).unwrap(), file_encryption_key);
    }

    #[test]
    fn permissions_block() {
        let key = [0x11u8; 32];
        let perms = compute_permissions(&key, -4, true, *b"junk").unwrap();

        assert!(validate_permissions(&key, &perms, -4, true).is_ok());
        assert!(matches!(
            validate_permissions(&key, &perms, P, true),
            Err(DecryptionError::PermissionsMismatch)
        ));
        assert!(matches!(
            validate_permissions(&key, &perms, -4, false),
            Err(DecryptionError::PermissionsMismatch)
        ));
        assert!(validate_permissions(&[0x12u8; 32], &perms, -4, true).is_err());
    }
}
