use aes::cipher::block_padding::{PadType, RawPadding, UnpadError};
use log::warn;

/// Pad block with bytes with value equal to the number of bytes added.
///
/// PKCS#5 is described in [RFC 2898](https://tools.ietf.org/html/rfc2898).
#[derive(Clone, Copy, Debug)]
pub struct Pkcs5;

impl Pkcs5 {
    /// Validates the padding at the end of `data` and returns the unpadded prefix.
    ///
    /// The final byte gives the pad length, which must be in 1..=16 and no longer than the data.
    /// In strict mode all pad bytes must carry that same value.
    pub fn unpad(data: &[u8], strict: bool) -> Result<&[u8], UnpadError> {
        let n = *data.last().ok_or(UnpadError)? as usize;
        if n == 0 || n > 16 || n > data.len() {
            return Err(UnpadError);
        }
        let s = data.len() - n;
        if strict && data[s..].iter().any(|&v| v as usize != n) {
            return Err(UnpadError);
        }
        Ok(&data[..s])
    }

    /// Like [`Pkcs5::unpad`], but falls back to the best guess instead of failing.
    pub fn unpad_lenient(data: &[u8]) -> &[u8] {
        match Self::unpad(data, true) {
            Ok(unpadded) => unpadded,
            Err(_) => {
                warn!("malformed PKCS#5 padding in {} bytes of AES plaintext", data.len());
                Self::unpad(data, false).unwrap_or(data)
            }
        }
    }
}

impl RawPadding for Pkcs5 {
    const TYPE: PadType = PadType::Reversible;

    #[inline]
    fn raw_pad(block: &mut [u8], pos: usize) {
        if block.len() > 16 {
            panic!("block size is too big for PKCS#5");
        }
        if pos >= block.len() {
            panic!("`pos` is bigger or equal to block size");
        }
        let n = (block.len() - pos) as u8;
        for b in &mut block[pos..] {
            *b = n;
        }
    }

    #[inline]
    fn raw_unpad(block: &[u8]) -> Result<&[u8], UnpadError> {
        if block.len() > 16 {
            panic!("block size is too big for PKCS#5");
        }
        Pkcs5::unpad(block, true)
    }
}
