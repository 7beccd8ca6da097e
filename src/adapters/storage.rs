use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

/// `.<name>.<suffix>` next to the target, so renames never cross filesystems.
fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    target.with_file_name(format!(".{}.{}", file_name, suffix))
}

/// One artifact on its way into place.
struct Staged {
    target: PathBuf,
    tmp: PathBuf,
    /// Previous version of `target`, moved aside while committing.
    backup: Option<PathBuf>,
}

impl Staged {
    fn write(target: PathBuf, data: &[u8]) -> std::io::Result<Self> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = sibling(&target, "tmp");
        if let Err(e) = fs::write(&tmp, data) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(Self {
            target,
            tmp,
            backup: None,
        })
    }

    fn commit(&mut self) -> std::io::Result<()> {
        if self.target.is_file() {
            let backup = sibling(&self.target, "bak");
            fs::rename(&self.target, &backup)?;
            self.backup = Some(backup);
        }
        fs::rename(&self.tmp, &self.target)
    }

    /// Undoes [`Staged::commit`]; `committed` tells whether the final rename happened.
    fn revert(&self, committed: bool) {
        if committed {
            let _ = fs::remove_file(&self.target);
        } else {
            let _ = fs::remove_file(&self.tmp);
        }
        if let Some(backup) = &self.backup {
            let _ = fs::rename(backup, &self.target);
        }
    }

    fn finish(&self) {
        if let Some(backup) = &self.backup {
            let _ = fs::remove_file(backup);
        }
    }
}

impl Storage for LocalStorage {
    async fn write_all(&self, files: &[(String, Vec<u8>)]) -> Result<Vec<String>> {
        let base = Path::new(&self.base_path);

        // Stage every artifact before touching any target.
        let mut staged: Vec<Staged> = Vec::with_capacity(files.len());
        for (name, data) in files {
            match Staged::write(base.join(name), data) {
                Ok(s) => staged.push(s),
                Err(e) => {
                    tracing::warn!("Staging {} failed, discarding {} staged files", name, staged.len());
                    staged.iter().for_each(|s| s.revert(false));
                    return Err(e.into());
                }
            }
        }

        for i in 0..staged.len() {
            if let Err(e) = staged[i].commit() {
                tracing::warn!(
                    "Moving {} into place failed, rolling back",
                    staged[i].target.display()
                );
                for (j, s) in staged.iter().enumerate() {
                    s.revert(j < i);
                }
                return Err(e.into());
            }
        }

        let mut written = Vec::with_capacity(staged.len());
        for (s, (_, data)) in staged.iter().zip(files) {
            s.finish();
            tracing::debug!("Wrote {} bytes to {}", data.len(), s.target.display());
            written.push(s.target.display().to_string());
        }
        Ok(written)
    }
}
