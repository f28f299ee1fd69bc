//! RSA 密钥材料工具
//! RSA key-material utilities
//!
//! 生成 RSA 密钥对，并以 OpenSSH 私钥格式和 authorized_keys 行格式进行
//! 序列化、写盘和加载。空闲定时器不依赖本模块。
//!
//! Generates RSA key pairs and serializes, persists and loads them in the
//! OpenSSH private-key and authorized_keys line formats. The idle timer does
//! not depend on this module.

use crate::error::KeyError;
use rand_core::OsRng;
use ssh_key::{
    Algorithm, LineEnding, PrivateKey, PublicKey,
    private::{KeypairData, RsaKeypair},
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The smallest modulus accepted for new keys.
pub const MIN_RSA_BITS: usize = 2048;

/// A freshly generated RSA key pair.
///
/// 新生成的 RSA 密钥对。
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    private_key: PrivateKey,
}

impl RsaKeyPair {
    /// The private key, usable as an SSH signer.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public half, carrying the comment given at generation.
    pub fn public_key(&self) -> &PublicKey {
        self.private_key.public_key()
    }

    /// The private key in OpenSSH PEM-style armour.
    ///
    /// 以 OpenSSH PEM 风格封装的私钥文本。
    pub fn private_key_openssh(&self) -> Result<String, KeyError> {
        Ok(self.private_key.to_openssh(LineEnding::LF)?.to_string())
    }

    /// The public key as a newline-terminated authorized_keys line.
    ///
    /// 以换行结尾的 authorized_keys 行形式的公钥。
    pub fn authorized_key_line(&self) -> Result<String, KeyError> {
        rsa_to_authorized_key(self.public_key())
    }

    /// Writes the private key to `path` and the public key to `path.pub`,
    /// both readable by the owner only.
    ///
    /// 将私钥写入 `path`，公钥写入 `path.pub`，两者仅所有者可读。
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), KeyError> {
        let path = path.as_ref();
        let pub_path = public_key_path(path);
        debug!(path = %path.display(), pub_path = %pub_path.display(), "writing RSA key pair");

        write_private_file(path, self.private_key_openssh()?.as_bytes())?;
        write_private_file(&pub_path, self.authorized_key_line()?.as_bytes())?;
        Ok(())
    }
}

/// Generates an RSA key pair of `bits`. A non-empty `comment` (typically an
/// e-mail address) is attached to the public key.
///
/// 生成 `bits` 位的 RSA 密钥对。非空的 `comment`（通常是电子邮件地址）会附加到公钥上。
pub fn generate_rsa_key_pair(bits: usize, comment: &str) -> Result<RsaKeyPair, KeyError> {
    if bits < MIN_RSA_BITS {
        return Err(KeyError::KeyTooSmall {
            bits,
            min: MIN_RSA_BITS,
        });
    }

    debug!(bits, "generating RSA key pair");
    let keypair = RsaKeypair::random(&mut OsRng, bits)?;
    let private_key = PrivateKey::new(KeypairData::Rsa(keypair), comment)?;
    Ok(RsaKeyPair { private_key })
}

/// Renders a public key as a newline-terminated authorized_keys line.
pub fn rsa_to_authorized_key(public_key: &PublicKey) -> Result<String, KeyError> {
    let mut line = public_key.to_openssh()?;
    line.push('\n');
    Ok(line)
}

/// Parses an OpenSSH private key, rejecting anything but RSA.
///
/// 解析 OpenSSH 私钥，拒绝非 RSA 密钥。
pub fn parse_rsa_private_key(text: impl AsRef<[u8]>) -> Result<PrivateKey, KeyError> {
    let private_key = PrivateKey::from_openssh(text)?;
    match private_key.algorithm() {
        Algorithm::Rsa { .. } => Ok(private_key),
        other => Err(KeyError::NotRsa(other.to_string())),
    }
}

/// Reads and parses an RSA private key from disk.
pub fn load_rsa_private_key(path: impl AsRef<Path>) -> Result<PrivateKey, KeyError> {
    let path = path.as_ref();
    let text = fs::read(path).map_err(|source| KeyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rsa_private_key(text)
}

/// Parses the first key of an authorized_keys blob. Blank lines and `#`
/// comments are skipped.
///
/// 解析 authorized_keys 文本中的第一个公钥，跳过空行和 `#` 注释。
pub fn parse_authorized_key(text: &str) -> Result<PublicKey, KeyError> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .ok_or(KeyError::NoPublicKey)?;
    Ok(PublicKey::from_openssh(line)?)
}

/// Reads a public key from disk. By convention such files end in `.pub`, but
/// that is not checked.
pub fn load_public_key(path: impl AsRef<Path>) -> Result<PublicKey, KeyError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_authorized_key(&text)
}

fn public_key_path(path: &Path) -> PathBuf {
    let mut pub_path = path.as_os_str().to_owned();
    pub_path.push(".pub");
    PathBuf::from(pub_path)
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), KeyError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
