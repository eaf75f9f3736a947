//! Session configuration validation.
//!
//! Centralises the session cookie settings so they are validated consistently
//! and can be tested in isolation. Debug builds tolerate missing toggles and
//! fall back to safe defaults; release builds require everything explicit.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as parsed from the command line or environment.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: Option<bool>,
    /// Requested `SameSite` policy, one of `Strict|Lax|None`.
    pub same_site: Option<String>,
    /// Allow a generated in-memory key when the key file is unreadable.
    pub allow_ephemeral_key: Option<bool>,
    /// Path to the session signing key material.
    pub key_file: Option<PathBuf>,
}

/// Session settings derived from configuration toggles.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

impl std::fmt::Debug for SessionSettings {
    // The signing key is secret material and must never appear in output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("cookie_secure", &self.cookie_secure)
            .field("same_site", &self.same_site)
            .finish_non_exhaustive()
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A required toggle is missing in a release build.
    #[error("missing required session setting: {name}")]
    MissingSetting {
        /// The absent toggle.
        name: &'static str,
    },
    /// A toggle is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidSetting {
        /// The offending toggle.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Attempted key path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The session key file exists but is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Attempted key path.
        path: PathBuf,
        /// Observed key length.
        length: usize,
        /// Required minimum.
        min_len: usize,
    },
    /// `SameSite=None` requires a secure cookie setting in release builds.
    #[error("same-site None requires secure session cookies")]
    InsecureSameSiteNone,
    /// Release builds must not allow ephemeral session keys.
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

/// Validate toggles and load the signing key.
pub fn session_settings(
    options: &SessionOptions,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = cookie_secure_setting(options, mode)?;
    let same_site = same_site_setting(options, mode, cookie_secure)?;
    let allow_ephemeral = allow_ephemeral_setting(options, mode)?;
    let key = session_key(options, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn cookie_secure_setting(
    options: &SessionOptions,
    mode: BuildMode,
) -> Result<bool, SessionConfigError> {
    match options.cookie_secure {
        Some(flag) => Ok(flag),
        None => {
            if mode.is_debug() {
                warn!("session cookie security not set; defaulting to secure");
                Ok(true)
            } else {
                Err(SessionConfigError::MissingSetting {
                    name: "session-cookie-secure",
                })
            }
        }
    }
}

fn same_site_setting(
    options: &SessionOptions,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    let Some(value) = options.same_site.as_deref() else {
        if mode.is_debug() {
            warn!("session same-site policy not set; using default");
            return Ok(default_same_site);
        }
        return Err(SessionConfigError::MissingSetting {
            name: "session-same-site",
        });
    };

    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => {
            if !cookie_secure {
                if mode.is_debug() {
                    warn!("same-site None without secure cookies; browsers may reject them");
                } else {
                    return Err(SessionConfigError::InsecureSameSiteNone);
                }
            }
            Ok(SameSite::None)
        }
        _ => {
            if mode.is_debug() {
                warn!(value = %value, "invalid session same-site policy, using default");
                Ok(default_same_site)
            } else {
                Err(SessionConfigError::InvalidSetting {
                    name: "session-same-site",
                    value: value.to_owned(),
                    expected: SAMESITE_EXPECTED,
                })
            }
        }
    }
}

fn allow_ephemeral_setting(
    options: &SessionOptions,
    mode: BuildMode,
) -> Result<bool, SessionConfigError> {
    match options.allow_ephemeral_key {
        Some(true) => {
            if mode.is_debug() {
                Ok(true)
            } else {
                Err(SessionConfigError::EphemeralNotAllowed)
            }
        }
        Some(false) => Ok(false),
        None => {
            if mode.is_debug() {
                Ok(false)
            } else {
                Err(SessionConfigError::MissingSetting {
                    name: "session-allow-ephemeral-key",
                })
            }
        }
    }
}

fn session_key(
    options: &SessionOptions,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = options
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary session key (dev only)"
                );
                Ok(Key::generate())
            } else {
                Err(SessionConfigError::KeyRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn explicit_options(key_file: Option<PathBuf>) -> SessionOptions {
        SessionOptions {
            cookie_secure: Some(true),
            same_site: Some("Strict".to_owned()),
            allow_ephemeral_key: Some(false),
            key_file,
        }
    }

    fn temp_key_file(len: usize) -> PathBuf {
        let path = std::env::temp_dir().join(format!("session_key_{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, vec![b'k'; len]).expect("write key file");
        path
    }

    #[rstest]
    fn release_accepts_explicit_settings_and_long_key() {
        let path = temp_key_file(64);
        let settings = session_settings(&explicit_options(Some(path.clone())), BuildMode::Release)
            .expect("valid settings");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Strict);
        std::fs::remove_file(path).expect("cleanup");
    }

    #[rstest]
    fn release_rejects_short_key() {
        let path = temp_key_file(16);
        let err = session_settings(&explicit_options(Some(path.clone())), BuildMode::Release)
            .expect_err("short key rejected");
        assert!(matches!(err, SessionConfigError::KeyTooShort { .. }));
        std::fs::remove_file(path).expect("cleanup");
    }

    #[rstest]
    fn release_rejects_missing_toggles() {
        let err = session_settings(&SessionOptions::default(), BuildMode::Release)
            .expect_err("missing toggles rejected");
        assert!(matches!(err, SessionConfigError::MissingSetting { .. }));
    }

    #[rstest]
    fn release_rejects_insecure_same_site_none() {
        let options = SessionOptions {
            cookie_secure: Some(false),
            same_site: Some("None".to_owned()),
            allow_ephemeral_key: Some(false),
            key_file: None,
        };
        let err = session_settings(&options, BuildMode::Release)
            .expect_err("insecure SameSite=None rejected");
        assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
    }

    #[rstest]
    fn debug_defaults_when_unset() {
        let settings = session_settings(&SessionOptions::default(), BuildMode::Debug)
            .expect("debug tolerates missing settings");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
    }

    #[rstest]
    fn release_rejects_ephemeral_keys() {
        let options = SessionOptions {
            cookie_secure: Some(true),
            same_site: Some("Strict".to_owned()),
            allow_ephemeral_key: Some(true),
            key_file: None,
        };
        let err =
            session_settings(&options, BuildMode::Release).expect_err("ephemeral key rejected");
        assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
    }
}
