//! Prebuilt parser release download and extraction.
//!
//! The release archive is downloaded in full, optionally verified against a
//! pinned SHA-256, and unpacked with its single top-level directory stripped.
//!
//! # Cache
//!
//! The cache directory is the cache key: if it exists and has any entry the
//! whole step is skipped. Extraction happens in a sibling temporary directory
//! that is renamed into place only after the archive unpacked cleanly, so a
//! failed run never leaves a populated cache behind.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Serialize;
use tar::Archive;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ParserSource;
use crate::consts::APP_NAME;
use crate::platform::PlatformProfile;
use crate::util::hash::hash_bytes;

/// Errors that can occur while fetching the parser release.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The platform has no parser release to fetch.
  #[error("no prebuilt parser release exists for {0}")]
  NoRelease(PlatformProfile),

  /// The HTTP request itself failed (DNS, connection, TLS, ...).
  #[error("fetch failed for {url}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("fetch failed for {url}: HTTP {status}\n{body}")]
  Status { url: String, status: u16, body: String },

  /// SHA256 hash mismatch after download.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  /// The archive is truncated, not gzip/tar, or empty.
  #[error("corrupt archive {archive}")]
  Corrupt {
    archive: String,
    #[source]
    source: io::Error,
  },

  /// Filesystem failure around the cache directory.
  #[error("failed to prepare cache directory '{path}'")]
  Cache {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// What the fetch step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
  pub cache_dir: PathBuf,
  pub archive: String,
  pub url: String,
  /// False when an existing cache was reused.
  pub downloaded: bool,
  /// Size of the downloaded archive; zero on a cache hit.
  pub bytes: u64,
}

/// Ensure the parser release for `profile` is unpacked in the cache directory.
pub fn fetch_parser(profile: PlatformProfile, source: &ParserSource) -> Result<FetchOutcome, FetchError> {
  let archive = profile.parser_archive_name().ok_or(FetchError::NoRelease(profile))?;
  let url = source.url_for(profile);
  let cache_dir = &source.cache_dir;

  if cache_is_populated(cache_dir) {
    info!(path = %cache_dir.display(), "using cached parser release");
    return Ok(FetchOutcome {
      cache_dir: cache_dir.clone(),
      archive,
      url,
      downloaded: false,
      bytes: 0,
    });
  }

  let bytes = download(&url)?;

  if let Some(expected) = &source.sha256 {
    let actual = hash_bytes(&bytes);
    if &actual != expected {
      return Err(FetchError::HashMismatch {
        url,
        expected: expected.clone(),
        actual,
      });
    }
    debug!(sha256 = %actual, "archive hash verified");
  }

  install(&bytes, &archive, cache_dir)?;

  info!(path = %cache_dir.display(), size = bytes.len(), "parser release unpacked");

  Ok(FetchOutcome {
    cache_dir: cache_dir.clone(),
    archive,
    url,
    downloaded: true,
    bytes: bytes.len() as u64,
  })
}

/// A cache directory counts as valid once it has at least one entry.
pub fn cache_is_populated(dir: &Path) -> bool {
  fs::read_dir(dir)
    .map(|mut entries| entries.next().is_some())
    .unwrap_or(false)
}

fn download(url: &str) -> Result<Vec<u8>, FetchError> {
  info!(url = %url, "fetching parser release");

  let request_err = |source| FetchError::Request {
    url: url.to_string(),
    source,
  };
  let client = reqwest::blocking::Client::builder()
    .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(request_err)?;
  let response = client.get(url).send().map_err(request_err)?;

  let status = response.status();
  if !status.is_success() {
    let body = response.text().unwrap_or_default();
    return Err(FetchError::Status {
      url: url.to_string(),
      status: status.as_u16(),
      body,
    });
  }

  let bytes = response.bytes().map_err(request_err)?;

  Ok(bytes.to_vec())
}

/// Write the archive next to the cache, unpack it, and move the result into place.
fn install(bytes: &[u8], archive: &str, cache_dir: &Path) -> Result<(), FetchError> {
  let cache_err = |source| FetchError::Cache {
    path: cache_dir.to_path_buf(),
    source,
  };

  let parent = cache_dir
    .parent()
    .ok_or_else(|| cache_err(io::Error::new(io::ErrorKind::InvalidInput, "cache directory has no parent")))?;
  fs::create_dir_all(parent).map_err(cache_err)?;

  let scratch = tempfile::Builder::new()
    .prefix(".parser-fetch-")
    .tempdir_in(parent)
    .map_err(cache_err)?;

  let archive_path = scratch.path().join(archive);
  fs::write(&archive_path, bytes).map_err(cache_err)?;

  let unpacked = scratch.path().join("unpacked");
  unpack_tar_gz(&archive_path, &unpacked).map_err(|source| FetchError::Corrupt {
    archive: archive.to_string(),
    source,
  })?;

  fs::remove_file(&archive_path).map_err(cache_err)?;
  debug!(archive = %archive_path.display(), "removed downloaded archive");

  // An empty cache directory would otherwise block the rename on Windows.
  if cache_dir.exists() {
    fs::remove_dir(cache_dir).map_err(cache_err)?;
  }
  fs::rename(&unpacked, cache_dir).map_err(cache_err)?;

  Ok(())
}

/// Unpack a `.tar.gz`, stripping the first path component of every entry.
///
/// Fails if the archive is unreadable, yields no files, or has an entry that
/// would land outside `dest`: a traversing path, a write through a symlink
/// pointing elsewhere, or a symlink or hard link whose target leaves `dest`.
pub fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> io::Result<()> {
  let file = File::open(archive_path)?;
  let decoder = GzDecoder::new(BufReader::new(file));
  let mut archive = Archive::new(decoder);

  fs::create_dir_all(dest)?;
  let root = dunce::canonicalize(dest)?;
  let mut unpacked = 0usize;

  for entry in archive.entries()? {
    let mut entry = entry?;
    let path = entry.path()?.into_owned();

    // Strip the first component (e.g., slang-linux/)
    let stripped = strip_top(&path);
    if stripped.as_os_str().is_empty() {
      continue;
    }
    if !is_plain_relative(&stripped) {
      return Err(escapes(&path));
    }

    let dest_path = root.join(&stripped);
    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
      if !dunce::canonicalize(parent)?.starts_with(&root) {
        return Err(escapes(&path));
      }
    }

    match entry.header().entry_type() {
      tar::EntryType::Symlink => {
        let target = entry.link_name()?.ok_or_else(|| escapes(&path))?.into_owned();
        let parent = dest_path.parent().map(dunce::canonicalize).transpose()?;
        if !resolves_within(&root, parent.as_deref().unwrap_or(&root), &target) {
          return Err(escapes(&path));
        }
        entry.unpack(&dest_path)?;
      }
      tar::EntryType::Link => {
        // Hard link targets name another archive entry, top directory included.
        let target = entry.link_name()?.ok_or_else(|| escapes(&path))?.into_owned();
        let target = strip_top(&target);
        if target.as_os_str().is_empty() || !is_plain_relative(&target) {
          return Err(escapes(&path));
        }
        let source = dunce::canonicalize(root.join(target))?;
        if !source.starts_with(&root) {
          return Err(escapes(&path));
        }
        fs::hard_link(source, &dest_path)?;
      }
      _ => {
        entry.unpack(&dest_path)?;
      }
    }
    unpacked += 1;
  }

  if unpacked == 0 {
    return Err(io::Error::new(io::ErrorKind::InvalidData, "archive contains no entries"));
  }

  Ok(())
}

fn strip_top(path: &Path) -> PathBuf {
  path.components().skip(1).collect()
}

fn is_plain_relative(path: &Path) -> bool {
  path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Whether `target`, read relative to `base`, stays under `root` without
/// following any links.
fn resolves_within(root: &Path, base: &Path, target: &Path) -> bool {
  let mut resolved = base.to_path_buf();
  for component in target.components() {
    match component {
      Component::Normal(part) => resolved.push(part),
      Component::CurDir => {}
      Component::ParentDir => {
        if resolved == root || !resolved.pop() {
          return false;
        }
      }
      Component::RootDir | Component::Prefix(_) => return false,
    }
  }
  resolved.starts_with(root)
}

fn escapes(path: &Path) -> io::Error {
  io::Error::new(
    io::ErrorKind::InvalidData,
    format!("entry escapes archive root: {}", path.display()),
  )
}
