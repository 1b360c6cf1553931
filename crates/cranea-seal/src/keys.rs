//! Fixed-size sealed key blocks.

use cranea_core::{Gid, Iv, Key, IV_LEN, KEY_LEN};

use crate::codec::{decryptor, encryptor};

/// Wire size of a [`SealedKey`].
pub const SEALED_KEY_LEN: usize = IV_LEN + KEY_LEN;

/// Wire size of an [`ActionSlot`]: IV, gid block, action key.
pub const ACTION_SLOT_LEN: usize = IV_LEN + 16 + KEY_LEN;

/// A key encrypted under a wrapping key with a fresh IV.
///
/// Carries no integrity tag of its own. Opening with the wrong wrapping key
/// yields a wrong key, which the next envelope's magic check rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedKey([u8; SEALED_KEY_LEN]);

impl SealedKey {
    /// Encrypt `secret` under `wrap`.
    pub fn seal(wrap: &Key, secret: &Key) -> Self {
        let iv = Iv::generate();
        let mut out = [0u8; SEALED_KEY_LEN];
        out[..IV_LEN].copy_from_slice(iv.as_bytes());
        out[IV_LEN..].copy_from_slice(secret.as_bytes());
        encryptor(wrap, &iv).encrypt(&mut out[IV_LEN..]);
        Self(out)
    }

    /// Decrypt under `wrap`.
    pub fn open(&self, wrap: &Key) -> Key {
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.0[..IV_LEN]);
        let mut body = [0u8; KEY_LEN];
        body.copy_from_slice(&self.0[IV_LEN..]);
        decryptor(wrap, &Iv(iv)).decrypt(&mut body);
        Key(body)
    }

    pub const fn from_bytes(bytes: [u8; SEALED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SEALED_KEY_LEN] {
        &self.0
    }
}

/// Where an action-table entry points once its command key is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTarget {
    pub gid: Gid,
    pub key: Key,
    /// Only eligible when the player's whole input matched.
    pub exact: bool,
}

/// One candidate in a location's action table.
///
/// ```text
/// IV || CFB(command_key, IV)[ gid block (16) || action key (16) ]
/// gid block: byte 0 = exact flag, bytes 4..8 = gid (LE), rest zero
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSlot([u8; ACTION_SLOT_LEN]);

impl ActionSlot {
    /// Seal a target under the command key that reaches it.
    pub fn seal(command_key: &Key, target: &SlotTarget) -> Self {
        let iv = Iv::generate();
        let mut out = [0u8; ACTION_SLOT_LEN];
        out[..IV_LEN].copy_from_slice(iv.as_bytes());
        out[IV_LEN] = target.exact as u8;
        out[IV_LEN + 4..IV_LEN + 8].copy_from_slice(&target.gid.get().to_le_bytes());
        out[IV_LEN + 16..].copy_from_slice(target.key.as_bytes());
        encryptor(command_key, &iv).encrypt(&mut out[IV_LEN..]);
        Self(out)
    }

    /// Open with a command key.
    ///
    /// Returns `None` when the gid block's padding is not zero, which is
    /// what a different command key colliding on the same hash produces.
    pub fn open(&self, command_key: &Key) -> Option<SlotTarget> {
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.0[..IV_LEN]);
        let mut body = [0u8; ACTION_SLOT_LEN - IV_LEN];
        body.copy_from_slice(&self.0[IV_LEN..]);
        decryptor(command_key, &Iv(iv)).decrypt(&mut body);

        let exact = match body[0] {
            0 => false,
            1 => true,
            _ => return None,
        };
        if body[1..4].iter().chain(&body[8..16]).any(|&b| b != 0) {
            return None;
        }
        let gid = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&body[16..]);
        Some(SlotTarget {
            gid: Gid(gid),
            key: Key(key),
            exact,
        })
    }

    pub const fn from_bytes(bytes: [u8; ACTION_SLOT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; ACTION_SLOT_LEN] {
        &self.0
    }
}
