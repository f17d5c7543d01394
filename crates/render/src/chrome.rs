//! Chrome/Chromium executable resolution.
//!
//! Headless-browser binaries are large, platform-specific, and may or may
//! not be pre-provisioned depending on where the service runs (ephemeral
//! containers vs. persistent hosts). [`ExecutableResolver`] walks an
//! ordered chain of strategies, short-circuiting on the first hit:
//!
//! 1. the configured override path, when it exists on disk;
//! 2. a build previously installed under the cache directory (the
//!    fetcher consulted with downloads disabled — cheap and idempotent);
//! 3. the rendering library's own default-location lookup;
//! 4. a best-effort scan of the cache directory for a file named `chrome`;
//! 5. the usual binary names on `PATH`, then well-known absolute install
//!    locations;
//! 6. an on-demand install into the cache directory.
//!
//! Resolution happens once per render invocation; nothing is memoized
//! across calls, so a successful install makes later invocations hit
//! strategy 2. Two concurrent first-time installs may race on the cache
//! directory; the install is idempotent, so the loser's work is merely
//! redundant.

use crate::error::{ErrorKind, Result};
use billkit_config::ChromeConfig;
use headless_chrome::browser::default_executable;
use headless_chrome::browser::fetcher::{Fetcher, FetcherOptions};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Binary names probed on `PATH`.
const PATH_NAMES: &[&str] = &["google-chrome", "chromium", "chromium-browser", "chrome"];

/// Well-known absolute install locations, checked in order.
const SYSTEM_PATHS: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/opt/google/chrome/chrome",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Resolves or provisions a usable browser executable.
pub struct ExecutableResolver {
    override_path: Option<PathBuf>,
    cache_dir: PathBuf,
}

impl ExecutableResolver {
    pub fn new(config: &ChromeConfig) -> Self {
        Self { override_path: config.executable.clone(), cache_dir: config.cache_dir.clone() }
    }

    /// Returns a path to an existing browser executable, installing one
    /// into the cache directory as a last resort. Fails only when every
    /// strategy is exhausted.
    #[instrument(skip_all)]
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.override_path {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using configured chrome executable");
                return Ok(path.clone());
            }
            tracing::warn!(
                path = %path.display(),
                "configured chrome executable does not exist; falling back to discovery"
            );
        }
        if let Some(path) = self.installed() {
            tracing::debug!(path = %path.display(), "reusing previously installed chromium");
            return Ok(path);
        }
        if let Ok(path) = default_executable() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using system default chrome location");
                return Ok(path);
            }
        }
        if let Some(path) = scan_for_chrome(&self.cache_dir) {
            tracing::debug!(path = %path.display(), "found chrome binary inside cache directory");
            return Ok(path);
        }
        if let Some(path) = system_chrome() {
            tracing::debug!(path = %path.display(), "found system chrome installation");
            return Ok(path);
        }
        tracing::info!(
            cache_dir = %self.cache_dir.display(),
            "no usable browser found; installing chromium (this may take a while)"
        );
        self.install()
    }

    /// Strategy 2: a build already present under the cache directory.
    fn installed(&self) -> Option<PathBuf> {
        self.fetch(false).ok().filter(|path| path.exists())
    }

    /// Strategy 6: download and unpack a build into the cache directory.
    fn install(&self) -> Result<PathBuf> {
        match self.fetch(true) {
            Ok(path) if path.exists() => {
                tracing::info!(path = %path.display(), "chromium install complete");
                Ok(path)
            }
            Ok(path) => exn::bail!(ErrorKind::ChromeInstall(
                self.cache_dir.clone(),
                format!("installer reported {} but no file exists there", path.display()),
            )),
            Err(reason) => exn::bail!(ErrorKind::ChromeInstall(self.cache_dir.clone(), reason)),
        }
    }

    fn fetch(&self, allow_download: bool) -> std::result::Result<PathBuf, String> {
        let options = FetcherOptions::default()
            .with_allow_download(allow_download)
            .with_install_dir(Some(self.cache_dir.clone()));
        Fetcher::new(options).fetch().map_err(|err| err.to_string())
    }
}

/// Strategy 4: best-effort recursive search for a file literally named
/// `chrome`. Unreadable directories are skipped silently.
fn scan_for_chrome(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = scan_for_chrome(&path) {
                return Some(found);
            }
        } else if path.file_name().is_some_and(|name| name == "chrome") {
            return Some(path);
        }
    }
    None
}

/// Strategy 5: `PATH` probe, then well-known absolute locations.
fn system_chrome() -> Option<PathBuf> {
    for name in PATH_NAMES {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }
    SYSTEM_PATHS.iter().map(PathBuf::from).find(|path| path.exists())
}
