//! # Model Provisioning
//!
//! Makes sure every model artifact exists in the model directory before the
//! inference services are built. A missing file with a configured URL is
//! downloaded once over HTTPS; there is no retry and no resume.
//!
//! Downloads stream into a `.part` file and are moved into place only after
//! the body is complete (and, if configured, its SHA-256 matches). A present
//! file is trusted as-is and never triggers network access.
//!
//! ## Model Packs
//!
//! A URL ending in `.zip` names a model pack. Every `.onnx` member of the pack
//! is unpacked flat into the model directory, skipping files already there,
//! so the other models of the same pack are then found locally. The checksum
//! applies to the downloaded archive.

use crate::config::ModelArtifact;
use crate::error::ProvisionError;
use crate::logger::log;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Large model files can take a long time on slow links
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Return the local path of `artifact`, downloading it into `dir` first if
/// it is not there yet.
pub fn ensure_model(artifact: &ModelArtifact, dir: &Path) -> Result<PathBuf, ProvisionError> {
    let path = dir.join(&artifact.file_name);
    if path.is_file() {
        log::debug!("Model {} present at {}", artifact.file_name, path.display());
        return Ok(path);
    }

    let url = artifact.url.as_deref().ok_or_else(|| ProvisionError::Missing {
        file_name: artifact.file_name.clone(),
        path: path.clone(),
    })?;

    fs::create_dir_all(dir).map_err(|source| ProvisionError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let pack = is_model_pack(url);
    let partial = if pack {
        dir.join(format!("{}.zip.part", artifact.file_name))
    } else {
        dir.join(format!("{}.part", artifact.file_name))
    };

    log::info!("Downloading model {} from {}", artifact.file_name, url);
    let result = download(url, &partial).and_then(|bytes| {
        if let Some(expected) = artifact.sha256.as_deref() {
            verify_checksum(&partial, &artifact.file_name, expected)?;
        }
        if pack {
            let unpacked = unpack_models(&partial, dir)?;
            log::info!("Unpacked {} model(s) from {}: {:?}", unpacked.len(), url, unpacked);
            if !path.is_file() {
                return Err(ProvisionError::NotInPack {
                    file_name: artifact.file_name.clone(),
                    url: url.to_string(),
                });
            }
            let _ = fs::remove_file(&partial);
        } else {
            fs::rename(&partial, &path).map_err(|source| ProvisionError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(bytes)
    });

    match result {
        Ok(bytes) => {
            log::info!(
                "Model {} downloaded ({})",
                artifact.file_name,
                format_file_size(bytes)
            );
            Ok(path)
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn is_model_pack(url: &str) -> bool {
    url.split(['?', '#'])
        .next()
        .is_some_and(|path| path.to_ascii_lowercase().ends_with(".zip"))
}

/// Unpack every `.onnx` member of `archive` into `dir`, ignoring the
/// archive's folder layout. Returns the names of the files written.
fn unpack_models(archive: &Path, dir: &Path) -> Result<Vec<String>, ProvisionError> {
    let pack_err = |source| ProvisionError::Pack {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive).map_err(|source| ProvisionError::Io {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(pack_err)?;

    let mut written = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(pack_err)?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        else {
            continue;
        };
        if !name.to_ascii_lowercase().ends_with(".onnx") {
            continue;
        }

        let destination = dir.join(&name);
        if destination.is_file() {
            continue;
        }
        let partial = dir.join(format!("{}.part", name));
        let io_err = |source| ProvisionError::Io {
            path: partial.clone(),
            source,
        };
        let copied = File::create(&partial)
            .and_then(|mut out| io::copy(&mut entry, &mut out))
            .and_then(|_| fs::rename(&partial, &destination));
        if let Err(e) = copied {
            let _ = fs::remove_file(&partial);
            return Err(io_err(e));
        }
        written.push(name);
    }
    Ok(written)
}

/// Single blocking GET streamed into `destination`; returns bytes written
fn download(url: &str, destination: &Path) -> Result<u64, ProvisionError> {
    let http_err = |source| ProvisionError::Http {
        url: url.to_string(),
        source,
    };
    let io_err = |source| ProvisionError::Io {
        path: destination.to_path_buf(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(http_err)?;

    let start = Instant::now();
    let mut response = client.get(url).send().map_err(http_err)?;
    if !response.status().is_success() {
        return Err(ProvisionError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let mut file = File::create(destination).map_err(io_err)?;
    let bytes = response.copy_to(&mut file).map_err(http_err)?;
    file.sync_all().map_err(io_err)?;

    log::debug!("Fetched {} bytes in {:?}", bytes, start.elapsed());
    Ok(bytes)
}

/// Compare the SHA-256 of `file_path` against a hex digest
fn verify_checksum(
    file_path: &Path,
    file_name: &str,
    expected: &str,
) -> Result<(), ProvisionError> {
    let actual = sha256_hex(file_path).map_err(|source| ProvisionError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ProvisionError::Checksum {
            file_name: file_name.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Hex SHA-256 of a file, read in fixed-size chunks
pub fn sha256_hex(file_path: &Path) -> std::io::Result<String> {
    let mut file = File::open(file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_index])
}
