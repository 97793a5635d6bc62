//! Real-time core of an interrupt-driven arcade shooter.
//!
//! A [`session::Session`] owns everything a running game needs and
//! [`dispatch::run`] drives it from an [`input::InterruptSource`]. Drawing
//! goes through a double-buffered [`framebuffer::FrameBuffer`] over a
//! [`video::VideoDevice`]; [`host`] provides terminal-backed versions of
//! both collaborators.

pub mod bullets;
pub mod compute;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod entities;
pub mod error;
pub mod framebuffer;
pub mod host;
pub mod input;
pub mod pool;
pub mod scores;
pub mod session;
pub mod sprite;
pub mod state;
pub mod video;

pub use error::{ArcadeError, Result};
