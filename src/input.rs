//! Hardware notifications and the keyboard/pointer state derived from them.

use std::collections::VecDeque;

use crate::error::ReceiveError;

// ── Scancodes (set 1) ────────────────────────────────────────────────────────

pub const SCAN_ESC_PRESSED: u8 = 0x01;
pub const SCAN_ESC_RELEASED: u8 = 0x81;
pub const SCAN_BACKSPACE: u8 = 0x0E;
pub const SCAN_ENTER: u8 = 0x1C;
pub const SCAN_A_PRESSED: u8 = 0x1E;
pub const SCAN_A_RELEASED: u8 = 0x9E;
pub const SCAN_D_PRESSED: u8 = 0x20;
pub const SCAN_D_RELEASED: u8 = 0xA0;
pub const SCAN_W_PRESSED: u8 = 0x11;
pub const SCAN_W_RELEASED: u8 = 0x91;

/// Release codes are the make code with the top bit set.
pub const BREAK_BIT: u8 = 0x80;

const LETTER_ROWS: [(u8, &str); 3] = [(0x10, "QWERTYUIOP"), (0x1E, "ASDFGHJKL"), (0x2C, "ZXCVBNM")];

/// Letter for a make code, if it is one.
pub fn letter(scancode: u8) -> Option<char> {
    LETTER_ROWS.iter().find_map(|&(first, row)| {
        let offset = scancode.checked_sub(first)? as usize;
        row.chars().nth(offset)
    })
}

/// Make code for a letter, case-insensitive.
pub fn scancode_for(ch: char) -> Option<u8> {
    let ch = ch.to_ascii_uppercase();
    LETTER_ROWS.iter().find_map(|&(first, row)| {
        row.chars().position(|c| c == ch).map(|i| first + i as u8)
    })
}

/// Movement keys currently held down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl HeldKeys {
    pub fn apply(&mut self, scancode: u8) {
        match scancode {
            SCAN_A_PRESSED => self.left = true,
            SCAN_A_RELEASED => self.left = false,
            SCAN_D_PRESSED => self.right = true,
            SCAN_D_RELEASED => self.right = false,
            SCAN_W_PRESSED => self.jump = true,
            SCAN_W_RELEASED => self.jump = false,
            _ => {}
        }
    }
}

// ── Pointer ──────────────────────────────────────────────────────────────────

/// One assembled pointer packet. `dy` is positive upward, as the device
/// reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerPacket {
    pub dx: i16,
    pub dy: i16,
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

// ── Notifications ────────────────────────────────────────────────────────────

/// Everything that was pending when the blocking wait returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    pub timer: bool,
    pub scancode: Option<u8>,
    pub packet: Option<PointerPacket>,
}

impl Notification {
    pub fn tick() -> Self {
        Notification {
            timer: true,
            ..Notification::default()
        }
    }

    pub fn key(scancode: u8) -> Self {
        Notification {
            scancode: Some(scancode),
            ..Notification::default()
        }
    }

    pub fn pointer(packet: PointerPacket) -> Self {
        Notification {
            packet: Some(packet),
            ..Notification::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.timer && self.scancode.is_none() && self.packet.is_none()
    }
}

/// Interrupt subscription collaborator.
pub trait InterruptSource {
    /// Block until at least one interrupt is pending.
    fn wait(&mut self) -> Result<Notification, ReceiveError>;
}

/// Replays a fixed list of notifications, then reports disconnection.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInterrupts {
    queue: VecDeque<Result<Notification, String>>,
}

impl ScriptedInterrupts {
    pub fn new(notifications: impl IntoIterator<Item = Notification>) -> Self {
        ScriptedInterrupts {
            queue: notifications.into_iter().map(Ok).collect(),
        }
    }

    /// `ticks` timer interrupts followed by an ESC release.
    pub fn ticks_then_escape(ticks: usize) -> Self {
        let mut script = Self::new(std::iter::repeat(Notification::tick()).take(ticks));
        script.push(Notification::key(SCAN_ESC_RELEASED));
        script
    }

    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(Ok(notification));
    }

    /// Queue a failed receive.
    pub fn push_failure(&mut self, reason: impl Into<String>) {
        self.queue.push_back(Err(reason.into()));
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl InterruptSource for ScriptedInterrupts {
    fn wait(&mut self) -> Result<Notification, ReceiveError> {
        match self.queue.pop_front() {
            Some(Ok(notification)) => Ok(notification),
            Some(Err(reason)) => Err(ReceiveError::Failed(reason)),
            None => Err(ReceiveError::Disconnected),
        }
    }
}
