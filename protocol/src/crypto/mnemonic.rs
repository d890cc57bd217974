//! # 25-Word Mnemonics
//!
//! A human-transcribable form of a 32-byte key: the key is read as a
//! little-endian bit string and cut into 24 eleven-bit indices into the
//! BIP-39 English word list, then a 25th word is appended whose index is
//! the first 11 bits of `SHA-512/256(key)`.
//!
//! The same encoding serves account seeds and the master derivation keys
//! a wallet daemon hands out; only the caller's interpretation differs.

use bip39::Language;

use super::hash::sha512_256;
use super::keys::Keypair;
use crate::config::PRIVATE_KEY_LENGTH;
use crate::error::MnemonicError;

/// Words in a mnemonic, checksum included.
pub const MNEMONIC_WORDS: usize = 25;

const KEY_LENGTH: usize = 32;
const BITS_PER_WORD: u32 = 11;
const WORD_MASK: u32 = (1 << BITS_PER_WORD) - 1;

/// Mnemonic for a 32-byte key.
pub fn from_key(key: &[u8; KEY_LENGTH]) -> String {
    let words = Language::English.word_list();
    let mut out: Vec<&str> = to_u11(key)
        .into_iter()
        .map(|i| words[usize::from(i)])
        .collect();
    out.push(words[usize::from(checksum(key))]);
    out.join(" ")
}

/// Key bytes of a mnemonic. Words are matched case-insensitively and may
/// be separated by any whitespace.
pub fn to_key(mnemonic: &str) -> Result<[u8; KEY_LENGTH], MnemonicError> {
    let lowered = mnemonic.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let Some((check_word, key_words)) = words.split_last() else {
        return Err(MnemonicError::WrongLength(0));
    };
    if words.len() != MNEMONIC_WORDS {
        return Err(MnemonicError::WrongLength(words.len()));
    }

    let indices = key_words
        .iter()
        .map(|w| word_index(w))
        .collect::<Result<Vec<u16>, _>>()?;
    let bytes = from_u11(&indices);
    // 24 words carry 264 bits; the eight past the key must be zero.
    if bytes[KEY_LENGTH..].iter().any(|b| *b != 0) {
        return Err(MnemonicError::NonZeroPadding);
    }
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&bytes[..KEY_LENGTH]);

    if word_index(check_word)? != checksum(&key) {
        return Err(MnemonicError::InvalidChecksum);
    }
    Ok(key)
}

/// Mnemonic for a 64-byte `seed ‖ public key` private key. Only the seed
/// is encoded; the public half is checked and then dropped.
pub fn from_private_key(private_key: &[u8]) -> Result<String, MnemonicError> {
    let keypair = Keypair::from_private_key(private_key)?;
    let mut seed = [0u8; KEY_LENGTH];
    seed.copy_from_slice(&keypair.private_key()[..KEY_LENGTH]);
    Ok(from_key(&seed))
}

/// The 64-byte private key a mnemonic stands for.
pub fn to_private_key(mnemonic: &str) -> Result<[u8; PRIVATE_KEY_LENGTH], MnemonicError> {
    Ok(to_keypair(mnemonic)?.private_key())
}

pub fn to_keypair(mnemonic: &str) -> Result<Keypair, MnemonicError> {
    Ok(Keypair::from_seed(&to_key(mnemonic)?))
}

pub fn from_master_derivation_key(mdk: &[u8; KEY_LENGTH]) -> String {
    from_key(mdk)
}

pub fn to_master_derivation_key(mnemonic: &str) -> Result<[u8; KEY_LENGTH], MnemonicError> {
    to_key(mnemonic)
}

fn word_index(word: &str) -> Result<u16, MnemonicError> {
    Language::English
        .word_list()
        .binary_search(&word)
        .ok()
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| MnemonicError::UnknownWord(word.to_string()))
}

fn checksum(key: &[u8; KEY_LENGTH]) -> u16 {
    let digest = sha512_256(key);
    to_u11(&digest[..2])[0]
}

/// Little-endian regrouping of bytes into 11-bit values. A partial final
/// group is emitted as is.
fn to_u11(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / 11 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for b in bytes {
        acc |= u32::from(*b) << bits;
        bits += 8;
        if bits >= BITS_PER_WORD {
            out.push((acc & WORD_MASK) as u16);
            acc >>= BITS_PER_WORD;
            bits -= BITS_PER_WORD;
        }
    }
    if bits > 0 {
        out.push((acc & WORD_MASK) as u16);
    }
    out
}

fn from_u11(words: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 11 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for w in words {
        acc |= u32::from(*w) << bits;
        bits += BITS_PER_WORD;
        while bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push((acc & 0xff) as u8);
    }
    out
}
