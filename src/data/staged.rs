//! Write-then-rename file updates

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// File contents written beside their target, not yet visible
///
/// `commit` renames the temporary file into place. Dropping an uncommitted
/// file removes the temporary file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `contents` to a temporary sibling of `target`
    pub fn write(target: &Path, contents: &[u8]) -> anyhow::Result<Self> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let file_name = target
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid target path: {}", target.display()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp = target.with_file_name(tmp_name);

        fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;

        Ok(Self {
            tmp,
            target: target.to_path_buf(),
            committed: false,
        })
    }

    /// Path the contents will land at
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace the target
    pub fn commit(mut self) -> anyhow::Result<()> {
        fs::rename(&self.tmp, &self.target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                self.tmp.display(),
                self.target.display()
            )
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}
