//! Cookie extraction from Firefox's session-recovery archive.
//!
//! Firefox keeps a snapshot of the live session (open tabs, cookies) in
//! `sessionstore-backups/recovery.jsonlz4` under the active profile. The
//! file is a JSON document behind an 8-byte `mozLz40\0` signature and an
//! lz4 block with a little-endian size prefix. Reading it gives us the
//! cookies of a browser that is already signed in, so no credentials ever
//! pass through this code.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{Result, SessionError};

/// Signature prefixing every mozLz4 archive.
pub const MOZLZ4_MAGIC: &[u8; 8] = b"mozLz40\0";

/// One cookie entry from the session store.
///
/// Only the fields this crate reads are modeled; the archive carries many
/// more per entry and they are ignored on decode.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// The exact host the cookie was stored for. Missing in rare entries,
    /// which then never match any host filter.
    #[serde(default)]
    pub host: String,
}

#[derive(Debug, Deserialize)]
struct SessionStore {
    cookies: Vec<SessionCookie>,
}

/// Locate the recovery archive of the first Firefox profile that has one.
///
/// Looks in the platform's profile root: `~/.mozilla/firefox` on Linux,
/// the user data directory under `Firefox/Profiles` on macOS and
/// `Mozilla/Firefox/Profiles` on Windows.
pub fn find_session_file() -> Option<PathBuf> {
    for root in profile_roots() {
        let Ok(entries) = fs::read_dir(&root) else {
            continue;
        };
        for entry in entries.flatten() {
            let candidate = entry
                .path()
                .join("sessionstore-backups")
                .join("recovery.jsonlz4");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn profile_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if cfg!(target_os = "macos") {
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("Firefox").join("Profiles"));
        }
    } else if cfg!(target_os = "windows") {
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("Mozilla").join("Firefox").join("Profiles"));
        }
    } else if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".mozilla").join("firefox"));
    }
    roots
}

/// Decode the cookies from a `recovery.jsonlz4` archive.
///
/// # Errors
///
/// Fails when the file cannot be read, the `mozLz40\0` signature is absent,
/// the lz4 payload is truncated, or the JSON store does not decode.
pub fn load_session_cookies(path: &Path) -> Result<Vec<SessionCookie>> {
    let raw = fs::read(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = raw
        .strip_prefix(MOZLZ4_MAGIC.as_slice())
        .ok_or_else(|| SessionError::UnrecognizedArchive {
            path: path.to_path_buf(),
        })?;
    let json = lz4_flex::block::decompress_size_prepended(payload).map_err(|source| {
        SessionError::Decompress {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let store: SessionStore = serde_json::from_slice(&json)?;
    Ok(store.cookies)
}

/// Filter cookies down to those stored for exactly `host`, as a
/// name-to-value map. Later entries win on duplicate names.
pub fn cookies_for_host<'a>(
    cookies: &'a [SessionCookie],
    host: &str,
) -> HashMap<&'a str, &'a str> {
    cookies
        .iter()
        .filter(|c| c.host == host)
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect()
}

/// Build a blocking HTTP client whose jar is seeded with `host`'s cookies
/// from the first Firefox session archive found on this machine.
pub fn client_for_host(host: &str) -> Result<Client> {
    let path = find_session_file().ok_or(SessionError::NoSessionArchive)?;
    debug!("loading session cookies from {}", path.display());
    let cookies = load_session_cookies(&path)?;
    client_with_cookies(host, &cookies_for_host(&cookies, host))
}

/// Build a blocking HTTP client carrying the given cookies for `host`.
pub fn client_with_cookies(host: &str, cookies: &HashMap<&str, &str>) -> Result<Client> {
    let url: Url = format!("https://{host}/")
        .parse()
        .map_err(|_| SessionError::InvalidHost(host.to_string()))?;
    let jar = Jar::default();
    for (name, value) in cookies {
        jar.add_cookie_str(&format!("{name}={value}; Domain={host}"), &url);
    }
    debug!("seeded {} cookie(s) for {host}", cookies.len());
    Ok(Client::builder().cookie_provider(Arc::new(jar)).build()?)
}
