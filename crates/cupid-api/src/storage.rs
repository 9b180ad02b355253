use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// On-disk store for uploaded images.
///
/// Files live at `{storage_dir}/{relative path}` where the relative path
/// is the one handed to `upload_file`, e.g. `proposals/{slug}/…` or
/// `responses/…`. Public URLs are `{public_url}/files/{relative path}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("File storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Absolute path for a stored file. Rejects anything that could
    /// escape the storage directory.
    pub fn file_path(&self, relative: &str) -> Result<PathBuf> {
        if relative.is_empty() || relative.len() > 512 {
            bail!("invalid storage path");
        }
        let path = Path::new(relative);
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().unwrap_or_default();
                    let clean = !part.is_empty()
                        && part
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
                    if !clean {
                        bail!("invalid storage path '{}'", relative);
                    }
                }
                _ => bail!("invalid storage path '{}'", relative),
            }
        }
        Ok(self.dir.join(path))
    }

    pub async fn write_file(&self, relative: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        debug!("Stored {} ({} bytes)", relative, data.len());
        Ok(())
    }

    /// `Ok(None)` when the file does not exist.
    pub async fn read_file(&self, relative: &str) -> Result<Option<Vec<u8>>> {
        let path = self.file_path(relative)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn delete_file(&self, relative: &str) -> Result<()> {
        let path = self.file_path(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted stored file {}", relative);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stored file {} already gone", relative);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Public URL for a stored file.
pub fn public_url_for(public_url: &str, relative: &str) -> String {
    format!("{}/files/{}", public_url.trim_end_matches('/'), relative)
}

/// Inverse of [`public_url_for`]. `None` for URLs this server did not issue.
pub fn relative_path_for<'a>(public_url: &str, url: &'a str) -> Option<&'a str> {
    let base = public_url.trim_end_matches('/');
    url.strip_prefix(base)?
        .strip_prefix("/files/")
        .filter(|rest| !rest.is_empty())
}

/// Content type served for a stored image.
pub fn content_type_for(relative: &str) -> &'static str {
    let ext = relative
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
