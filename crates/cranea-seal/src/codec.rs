//! Streaming seal/open over any byte stream.

use std::io::{self, Read, Write};

use aes::Aes128;
use cfb_mode::cipher::KeyIvInit;
use cfb_mode::{BufDecryptor, BufEncryptor};
use cranea_core::{Gid, Iv, Key, KeyHash, IV_LEN, KEY_HASH_LEN, KEY_LEN};

use crate::error::{Result, SealError};

/// First plaintext bytes of every sealed object.
pub const MAGIC: [u8; 8] = *b"cranea01";

/// Ciphertext pulled from the source per refill.
const REFILL_CHUNK: usize = 512;

pub(crate) type CfbEncryptor = BufEncryptor<Aes128>;
pub(crate) type CfbDecryptor = BufDecryptor<Aes128>;

pub(crate) fn encryptor(key: &Key, iv: &Iv) -> CfbEncryptor {
    CfbEncryptor::new(key.as_bytes().into(), iv.as_bytes().into())
}

pub(crate) fn decryptor(key: &Key, iv: &Iv) -> CfbDecryptor {
    CfbDecryptor::new(key.as_bytes().into(), iv.as_bytes().into())
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SealError::TooLong(len))
}

// ─────────────────────────────────────────────────────────────────────────────
// Writer
// ─────────────────────────────────────────────────────────────────────────────

/// Encrypting writer for one sealed object.
///
/// Created with [`SealWriter::begin`], which emits a fresh IV and the magic
/// tag. Implements [`Write`], so a nested envelope can be sealed through it.
pub struct SealWriter<W: Write> {
    sink: W,
    cipher: CfbEncryptor,
    scratch: Vec<u8>,
}

impl<W: Write> SealWriter<W> {
    /// Start a sealed object under `key`.
    pub fn begin(mut sink: W, key: &Key) -> Result<Self> {
        let iv = Iv::generate();
        sink.write_all(iv.as_bytes())?;
        let mut writer = Self {
            sink,
            cipher: encryptor(key, &iv),
            scratch: Vec::with_capacity(64),
        };
        writer.put_bytes(&MAGIC)?;
        Ok(writer)
    }

    /// Encrypt and write raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.scratch.clear();
        self.scratch.extend_from_slice(bytes);
        self.cipher.encrypt(&mut self.scratch);
        self.sink.write_all(&self.scratch)?;
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.put_bytes(&[v])
    }

    pub fn put_bool(&mut self, v: bool) -> Result<()> {
        self.put_u8(v as u8)
    }

    pub fn put_u32(&mut self, v: u32) -> Result<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> Result<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    /// Write a collection length as a `u32` count.
    pub fn put_len(&mut self, len: usize) -> Result<()> {
        self.put_u32(len_u32(len)?)
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_str(&mut self, s: &str) -> Result<()> {
        self.put_len(s.len())?;
        self.put_bytes(s.as_bytes())
    }

    pub fn put_key(&mut self, key: &Key) -> Result<()> {
        self.put_bytes(key.as_bytes())
    }

    pub fn put_key_hash(&mut self, hash: &KeyHash) -> Result<()> {
        self.put_bytes(hash.as_bytes())
    }

    pub fn put_gid(&mut self, gid: Gid) -> Result<()> {
        self.put_u32(gid.get())
    }

    /// Finish the object and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl<W: Write> Write for SealWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put_bytes(buf).map_err(|e| match e {
            SealError::Io(io) => io,
            other => io::Error::other(other),
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reader
// ─────────────────────────────────────────────────────────────────────────────

/// Decrypting reader for one sealed object.
///
/// Holds a small plaintext buffer and tops it up from the source whenever a
/// request would underflow it. The source may run past the end of the
/// object; surplus bytes are decrypted into the buffer and never returned.
pub struct SealReader<R: Read> {
    source: R,
    cipher: CfbDecryptor,
    plain: Vec<u8>,
    pos: usize,
}

impl<R: Read> SealReader<R> {
    /// Read the IV, then decrypt and check the magic tag.
    pub fn open(mut source: R, key: &Key) -> Result<Self> {
        let mut iv = [0u8; IV_LEN];
        source.read_exact(&mut iv).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => SealError::Truncated(IV_LEN),
            _ => SealError::Io(e),
        })?;
        let mut reader = Self {
            source,
            cipher: decryptor(key, &Iv(iv)),
            plain: Vec::with_capacity(REFILL_CHUNK),
            pos: 0,
        };
        let magic: [u8; 8] = reader.get_array()?;
        if magic != MAGIC {
            return Err(SealError::BadMagic);
        }
        Ok(reader)
    }

    fn refill(&mut self) -> io::Result<usize> {
        self.plain.resize(REFILL_CHUNK, 0);
        let n = loop {
            match self.source.read(&mut self.plain) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.plain.clear();
                    self.pos = 0;
                    return Err(e);
                }
            }
        };
        self.plain.truncate(n);
        self.cipher.decrypt(&mut self.plain);
        self.pos = 0;
        Ok(n)
    }

    /// Fill `out` with the next plaintext bytes.
    pub fn take_exact(&mut self, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < out.len() {
            if self.pos == self.plain.len() && self.refill()? == 0 {
                return Err(SealError::Truncated(out.len() - filled));
            }
            let n = (out.len() - filled).min(self.plain.len() - self.pos);
            out[filled..filled + n].copy_from_slice(&self.plain[self.pos..self.pos + n]);
            self.pos += n;
            filled += n;
        }
        Ok(())
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.take_exact(&mut out)?;
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.get_array::<1>()?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SealError::InvalidFlag(other)),
        }
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.get_array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.get_array()?))
    }

    /// Read a `u32` count.
    pub fn get_len(&mut self) -> Result<usize> {
        Ok(self.get_u32()? as usize)
    }

    /// Read `len` bytes without trusting `len` for preallocation.
    pub fn get_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.by_ref().take(len as u64).read_to_end(&mut out)?;
        if out.len() != len {
            return Err(SealError::Truncated(len - out.len()));
        }
        Ok(out)
    }

    /// Length-prefixed UTF-8 string.
    pub fn get_str(&mut self) -> Result<String> {
        let len = self.get_len()?;
        let bytes = self.get_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| SealError::InvalidString)
    }

    pub fn get_key(&mut self) -> Result<Key> {
        Ok(Key(self.get_array::<KEY_LEN>()?))
    }

    pub fn get_key_hash(&mut self) -> Result<KeyHash> {
        Ok(KeyHash(self.get_array::<KEY_HASH_LEN>()?))
    }

    pub fn get_gid(&mut self) -> Result<Gid> {
        Ok(Gid(self.get_u32()?))
    }
}

impl<R: Read> Read for SealReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos == self.plain.len() && self.refill()? == 0 {
            return Ok(0);
        }
        let n = buf.len().min(self.plain.len() - self.pos);
        buf[..n].copy_from_slice(&self.plain[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
