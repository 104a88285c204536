//! Whole-file adapters over the byte level API.
//!
//! Each call reads the source file completely, makes one byte level call and
//! writes the destination through a sibling temporary file that is renamed
//! into place. The destination is left untouched when anything fails.
//!
//! Encrypted files hold the structured text form of the result with any key
//! removed; [`AsymmetricResult`] files hold the compact form. Concurrent
//! calls against the same destination are not coordinated.

use crate::*;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

/// Encrypt `src` into `dst` with AES-256-CBC.
///
/// The returned result carries the generated key when `key` is `None`; the
/// key is never written to `dst`.
pub fn encrypt_symmetric<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    key: Option<&[u8]>,
) -> Result<SymmetricResult> {
    let plaintext = read(src.as_ref())?;
    let result = symmetric::encrypt(&plaintext, key)?;
    write_atomic(dst.as_ref(), result.without_key().to_text()?.as_bytes())?;
    Ok(result)
}

/// Decrypt a file written by [`encrypt_symmetric`] into `dst`.
pub fn decrypt_symmetric<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    key: &[u8],
) -> Result<Vec<u8>> {
    let result = SymmetricResult::from_text(&read_text(src.as_ref())?)?;
    let plaintext = symmetric::decrypt(&result, Some(key))?;
    write_atomic(dst.as_ref(), &plaintext)?;
    Ok(plaintext)
}

/// Encrypt a small file directly to `public_key`.
pub fn encrypt_asymmetric<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    public_key: &PublicKey,
) -> Result<AsymmetricResult> {
    let plaintext = read(src.as_ref())?;
    let result = asymmetric::encrypt(&plaintext, public_key)?;
    write_atomic(dst.as_ref(), result.to_compact().as_bytes())?;
    Ok(result)
}

/// Decrypt a file written by [`encrypt_asymmetric`] into `dst`.
pub fn decrypt_asymmetric<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    private_key: &PrivateKey,
) -> Result<Vec<u8>> {
    let result = AsymmetricResult::from_compact(&read_text(src.as_ref())?)?;
    let plaintext = asymmetric::decrypt(&result, private_key)?;
    write_atomic(dst.as_ref(), &plaintext)?;
    Ok(plaintext)
}

/// Seal a file of any size into an envelope for `public_key`.
pub fn encrypt_hybrid<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    public_key: &PublicKey,
) -> Result<HybridResult> {
    let plaintext = read(src.as_ref())?;
    let envelope = hybrid::encrypt(&plaintext, public_key)?;
    write_atomic(dst.as_ref(), envelope.to_text()?.as_bytes())?;
    Ok(envelope)
}

/// Open an envelope file written by [`encrypt_hybrid`] into `dst`.
pub fn decrypt_hybrid<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    private_key: &PrivateKey,
) -> Result<Vec<u8>> {
    let envelope = HybridResult::from_text(&read_text(src.as_ref())?)?;
    let plaintext = hybrid::decrypt(&envelope, private_key)?;
    write_atomic(dst.as_ref(), &plaintext)?;
    Ok(plaintext)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    tracing::debug!(path = %path.display(), "reading");
    Ok(fs::read(path)?)
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = read(path)?;
    String::from_utf8(bytes).map_err(|_| Error::Format(format!("{} is not text", path.display())))
}

fn temp_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    dst.with_file_name(name)
}

/// Write to a temporary file next to `dst`, then rename over `dst`.
fn write_atomic(dst: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path(dst);
    let written = fs::File::create(&tmp).and_then(|mut f| {
        f.write_all(contents)?;
        f.sync_all()
    });
    let renamed = written.and_then(|_| fs::rename(&tmp, dst));
    if let Err(e) = renamed {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary file");
        }
        return Err(e.into());
    }
    tracing::debug!(path = %dst.display(), len = contents.len(), "written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    #[fixture]
    #[once]
    fn key_pair() -> KeyPair {
        asymmetric::generate_key_pair(2048).unwrap()
    }

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn symmetric_round_trip(dir: TempDir) {
        let src = dir.path().join("plain.txt");
        let enc = dir.path().join("plain.txt.enc");
        let out = dir.path().join("plain.out");
        fs::write(&src, b"hello world").unwrap();

        let result = encrypt_symmetric(&src, &enc, None).unwrap();
        let key = result.key().unwrap().to_vec();
        let on_disk = fs::read_to_string(&enc).unwrap();
        assert!(!on_disk.contains("\"key\""));
        assert_eq!(SymmetricResult::from_text(&on_disk).unwrap(), result.without_key());

        let plaintext = decrypt_symmetric(&enc, &out, &key).unwrap();
        assert_eq!(plaintext, b"hello world");
        assert_eq!(fs::read(&out).unwrap(), b"hello world");
    }

    #[rstest]
    fn asymmetric_round_trip(dir: TempDir, key_pair: &KeyPair) {
        let src = dir.path().join("secret");
        let enc = dir.path().join("secret.enc");
        let out = dir.path().join("secret.out");
        fs::write(&src, vec![3u8; 100]).unwrap();

        let result = encrypt_asymmetric(&src, &enc, key_pair.public_key()).unwrap();
        assert_eq!(fs::read_to_string(&enc).unwrap(), result.to_compact());
        decrypt_asymmetric(&enc, &out, key_pair.private_key()).unwrap();
        assert_eq!(fs::read(&out).unwrap(), vec![3u8; 100]);
    }

    #[rstest]
    fn asymmetric_too_large_leaves_no_output(dir: TempDir, key_pair: &KeyPair) {
        let src = dir.path().join("big");
        let enc = dir.path().join("big.enc");
        fs::write(&src, vec![0u8; 4096]).unwrap();
        assert!(matches!(
            encrypt_asymmetric(&src, &enc, key_pair.public_key()),
            Err(Error::PlaintextTooLarge { .. })
        ));
        assert!(!enc.exists());
    }

    #[rstest]
    fn hybrid_round_trip(dir: TempDir, key_pair: &KeyPair) {
        let src = dir.path().join("video.bin");
        let enc = dir.path().join("video.bin.env");
        let out = dir.path().join("video.out");
        let data: Vec<u8> = (0..300_000).map(|i| (i % 256) as u8).collect();
        fs::write(&src, &data).unwrap();

        let envelope = encrypt_hybrid(&src, &enc, key_pair.public_key()).unwrap();
        let on_disk = HybridResult::from_text(&fs::read_to_string(&enc).unwrap()).unwrap();
        assert_eq!(envelope, on_disk);

        let plaintext = decrypt_hybrid(&enc, &out, key_pair.private_key()).unwrap();
        assert_eq!(plaintext, data);
        assert_eq!(fs::read(&out).unwrap(), data);
    }

    #[rstest]
    fn failed_decrypt_keeps_destination(dir: TempDir, key_pair: &KeyPair) {
        let enc = dir.path().join("broken.env");
        let out = dir.path().join("out");
        fs::write(&enc, b"{\"encrypted_key\":").unwrap();
        fs::write(&out, b"previous").unwrap();
        assert!(matches!(
            decrypt_hybrid(&enc, &out, key_pair.private_key()),
            Err(Error::Format(_))
        ));
        assert_eq!(fs::read(&out).unwrap(), b"previous");
    }

    #[rstest]
    fn missing_source_is_io_error(dir: TempDir) {
        let result = encrypt_symmetric(dir.path().join("nope"), dir.path().join("out"), None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[rstest]
    fn unwritable_destination_is_io_error(dir: TempDir) {
        let src = dir.path().join("plain");
        fs::write(&src, b"data").unwrap();
        let dst = dir.path().join("missing-dir").join("out");
        assert!(matches!(
            encrypt_symmetric(&src, &dst, None),
            Err(Error::Io(_))
        ));
        assert!(!dst.exists());
    }

    #[rstest]
    fn overwrite_existing_destination(dir: TempDir) {
        let src = dir.path().join("plain");
        let dst = dir.path().join("out");
        fs::write(&src, b"fresh").unwrap();
        fs::write(&dst, b"stale").unwrap();
        encrypt_symmetric(&src, &dst, None).unwrap();
        assert!(SymmetricResult::from_text(&fs::read_to_string(&dst).unwrap()).is_ok());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
