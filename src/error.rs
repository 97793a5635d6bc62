//! Error taxonomy for the whole core.
//!
//! Only device, allocation, asset and configuration failures are fatal.
//! Drawing outside the screen and spawning into a full pool are not
//! errors at all and never show up here.

use thiserror::Error;

use crate::video::ModeId;

/// Failures reported by the video device collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("mode {0} is not supported by the device")]
    UnsupportedMode(ModeId),
    #[error("memory grant of {size} bytes at {base:#x} refused")]
    GrantRefused { base: u32, size: usize },
    #[error("video memory mapping failed: {0}")]
    MapFailed(String),
    #[error("mapped {mapped} bytes but the mode needs {expected}")]
    MappingSize { expected: usize, mapped: usize },
    #[error("could not set video mode {mode}: {reason}")]
    SetMode { mode: ModeId, reason: String },
    #[error("presenting the frame failed: {0}")]
    Present(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("could not allocate a {size}-byte back buffer")]
pub struct AllocationError {
    pub size: usize,
}

/// The blocking wait returned without a notification.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("all interrupt producers are gone")]
    Disconnected,
    #[error("interrupt receive failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("pixmap {name} is {width}x{height} but carries {len} pixels")]
    Malformed {
        name: &'static str,
        width: usize,
        height: usize,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad score line {line}: {content:?}")]
    Parse { line: usize, content: String },
    #[error("name {0:?} cannot be stored as one word")]
    BadName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ArcadeError>;
