//! Persist generated images under the static directory.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use chatrelay_core::utils::timestamp_millis;

/// Write `bytes` to `<static_dir>/images/output_<millis>.webp` and return the
/// public path (`/images/output_<millis>.webp`).
///
/// If two images land in the same millisecond the later one takes the next
/// free timestamp.
pub async fn save_image(static_dir: &Path, bytes: &[u8]) -> std::io::Result<String> {
    let dir = static_dir.join("images");
    tokio::fs::create_dir_all(&dir).await?;

    let mut stamp = timestamp_millis();
    loop {
        let file_name = format!("output_{stamp}.webp");
        let path = dir.join(&file_name);

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                debug!(path = %path.display(), bytes = bytes.len(), "saved generated image");
                return Ok(format!("/images/{file_name}"));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_image_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let public = save_image(tmp.path(), b"webp-bytes").await.unwrap();

        assert!(public.starts_with("/images/output_"));
        assert!(public.ends_with(".webp"));

        let on_disk = tmp.path().join(public.trim_start_matches('/'));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"webp-bytes");
    }

    #[tokio::test]
    async fn test_same_millisecond_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let a = save_image(tmp.path(), b"a").await.unwrap();
        let b = save_image(tmp.path(), b"b").await.unwrap();

        assert_ne!(a, b);
        let count = std::fs::read_dir(tmp.path().join("images")).unwrap().count();
        assert_eq!(count, 2);
    }
}
