//! Key derivation.
//!
//! Three pure functions relate keys to each other and to text:
//!
//! - [`hash_key`]: key to lookup hash (one-way)
//! - [`command_key`]: normalized command text to key (deterministic)
//! - [`conjunction_key`]: set of item take-keys to one unlock key (XOR)
//!
//! All digests are Blake3 with a per-purpose domain separation tag.

use blake3::Hasher;

use crate::types::{Key, KeyHash, KEY_LEN};

const KEY_HASH_DOMAIN: &str = "cranea 2024 key hash v1";
const COMMAND_PREFIX: &[u8] = b"cranea-command-v1:";

/// One-way digest of a key, used to index lookup tables.
pub fn hash_key(key: &Key) -> KeyHash {
    let mut hasher = Hasher::new_derive_key(KEY_HASH_DOMAIN);
    hasher.update(key.as_bytes());
    let mut out = [0u8; 20];
    hasher.finalize_xof().fill(&mut out);
    KeyHash(out)
}

/// Deterministic key for a normalized command string.
///
/// Every player who types the same normalized text derives the same key,
/// so the action table can be keyed by `hash_key(command_key(cmd))`.
pub fn command_key(cmd: &str) -> Key {
    let mut hasher = Hasher::new();
    hasher.update(COMMAND_PREFIX);
    hasher.update(cmd.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(&hash.as_bytes()[..KEY_LEN]);
    Key(out)
}

/// Hash stored for an item title, compared against joined player arguments.
pub fn title_hash(title: &str) -> KeyHash {
    hash_key(&command_key(title))
}

/// XOR of every take-key in a conjunction.
///
/// Order-independent. A key listed twice cancels itself out, so
/// `conjunction_key([a, a])` is the zero key, same as an empty conjunction.
pub fn conjunction_key<'a, I>(keys: I) -> Key
where
    I: IntoIterator<Item = &'a Key>,
{
    keys.into_iter().fold(Key::ZERO, |acc, k| acc ^ *k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_key_deterministic() {
        let key = Key::from_bytes([9; KEY_LEN]);
        assert_eq!(hash_key(&key), hash_key(&key));
        assert_ne!(hash_key(&key), hash_key(&Key::ZERO));
    }

    #[test]
    fn test_command_key_depends_on_text() {
        assert_eq!(command_key("take rock"), command_key("take rock"));
        assert_ne!(command_key("take rock"), command_key("take rocks"));
        assert_ne!(command_key(""), command_key(" "));
    }

    #[test]
    fn test_title_hash() {
        assert_eq!(title_hash("rock"), hash_key(&command_key("rock")));
    }

    #[test]
    fn test_conjunction_key_empty_is_zero() {
        assert_eq!(conjunction_key(Vec::<&Key>::new()), Key::ZERO);
    }

    #[test]
    fn test_conjunction_key_self_cancels() {
        let a = Key::generate();
        assert_eq!(conjunction_key([&a, &a]), conjunction_key(Vec::<&Key>::new()));

        let b = Key::generate();
        assert_eq!(conjunction_key([&a, &b, &a]), conjunction_key([&b]));
    }

    proptest! {
        #[test]
        fn prop_conjunction_key_commutes(a in any::<[u8; 16]>(), b in any::<[u8; 16]>(), c in any::<[u8; 16]>()) {
            let (a, b, c) = (Key(a), Key(b), Key(c));
            prop_assert_eq!(conjunction_key([&a, &b]), conjunction_key([&b, &a]));
            prop_assert_eq!(conjunction_key([&a, &b, &c]), conjunction_key([&c, &a, &b]));
        }

        #[test]
        fn prop_command_key_stable(cmd in "[a-z ]{0,24}") {
            prop_assert_eq!(command_key(&cmd), command_key(&cmd));
        }
    }
}
