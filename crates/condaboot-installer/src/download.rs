use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use condaboot_core::InstallerSource;
use condaboot_security::sha256_hex_file;

use crate::error::BootstrapError;
use crate::PrefixLayout;

const COPY_CHUNK_BYTES: usize = 1024 * 1024;

/// Downloads the installer into the state directory and verifies its digest
/// when the source carries one. A failed verification removes the artifact.
pub fn fetch_installer<Progress>(
    layout: &PrefixLayout,
    source: &InstallerSource,
    progress: Progress,
) -> Result<PathBuf>
where
    Progress: FnMut(u64, Option<u64>),
{
    layout.ensure_state_dir()?;
    let installer_path = layout.installer_scratch_path();
    download_to(&source.url, &installer_path, progress)?;

    if let Some(expected) = &source.sha256 {
        let actual = sha256_hex_file(&installer_path)?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            let _ = fs::remove_file(&installer_path);
            return Err(BootstrapError::ChecksumMismatch {
                expected: expected.clone(),
                actual,
            }
            .into());
        }
    }

    Ok(installer_path)
}

fn download_to<Progress>(url: &str, dest: &Path, mut progress: Progress) -> Result<()>
where
    Progress: FnMut(u64, Option<u64>),
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create download dir: {}", parent.display()))?;
    }

    let part_path = dest.with_file_name(format!(
        "{}.part",
        dest.file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("installer")
    ));

    if let Err(err) = stream_response(url, &part_path, &mut progress) {
        let _ = fs::remove_file(&part_path);
        return Err(err);
    }

    if dest.exists() {
        fs::remove_file(dest)
            .with_context(|| format!("failed to replace stale installer: {}", dest.display()))?;
    }
    fs::rename(&part_path, dest).with_context(|| {
        format!(
            "failed to move downloaded installer into place: {}",
            dest.display()
        )
    })?;

    Ok(())
}

fn stream_response<Progress>(url: &str, part_path: &Path, progress: &mut Progress) -> Result<()>
where
    Progress: FnMut(u64, Option<u64>),
{
    let mut response = reqwest::blocking::Client::new()
        .get(url)
        .send()
        .with_context(|| format!("failed to request installer: {url}"))?
        .error_for_status()
        .with_context(|| format!("installer download was rejected: {url}"))?;

    let total = response.content_length();
    let mut out = File::create(part_path)
        .with_context(|| format!("failed to create download file: {}", part_path.display()))?;
    let mut buffer = vec![0u8; COPY_CHUNK_BYTES];
    let mut downloaded = 0u64;

    loop {
        let read = response
            .read(&mut buffer)
            .with_context(|| format!("failed to read installer payload: {url}"))?;
        if read == 0 {
            break;
        }
        out.write_all(&buffer[..read])
            .with_context(|| format!("failed to write download file: {}", part_path.display()))?;
        downloaded += read as u64;
        progress(downloaded, total);
    }

    out.flush()
        .with_context(|| format!("failed to flush download file: {}", part_path.display()))?;
    Ok(())
}
