//! Terminal stand-ins for the hardware collaborators.
//!
//! [`TerminalVideo`] presents every committed frame with half-block cells,
//! two pixels rows per terminal row. [`TerminalInterrupts`] runs a timer
//! thread and a terminal event thread that both feed one channel; each
//! blocking wait returns whatever was pending, merged into a single
//! [`Notification`].

use std::collections::{HashMap, VecDeque};
use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind},
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use tracing::{debug, trace, warn};

use crate::error::{DeviceError, ReceiveError};
use crate::framebuffer::decode;
use crate::input::{
    self, InterruptSource, Notification, PointerPacket, BREAK_BIT, SCAN_A_PRESSED, SCAN_BACKSPACE,
    SCAN_D_PRESSED, SCAN_ENTER, SCAN_ESC_PRESSED, SCAN_ESC_RELEASED, SCAN_W_PRESSED,
};
use crate::video::{ModeId, VideoDevice, VideoMemory, VideoMode};

/// A key with no press or repeat for this many ticks counts as released.
/// Covers terminals that never report key releases: OS key repeat is at
/// least 15 Hz, so a held key refreshes well inside the window.
const HOLD_WINDOW_TICKS: u32 = 4;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ── Shared geometry ──────────────────────────────────────────────────────────

/// Screen and terminal sizes shared between the video side and the event
/// thread, which needs them to turn cell positions into pixels.
#[derive(Debug)]
pub struct Geometry {
    width: AtomicI32,
    height: AtomicI32,
    cols: AtomicI32,
    rows: AtomicI32,
    home_x: AtomicI32,
    home_y: AtomicI32,
    /// Bumped on every mode set.
    generation: AtomicU32,
}

impl Geometry {
    pub fn new() -> Arc<Self> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        Arc::new(Geometry {
            width: AtomicI32::new(1),
            height: AtomicI32::new(1),
            cols: AtomicI32::new(cols as i32),
            rows: AtomicI32::new(rows as i32),
            home_x: AtomicI32::new(0),
            home_y: AtomicI32::new(0),
            generation: AtomicU32::new(0),
        })
    }

    fn set_mode(&self, mode: &VideoMode, home: (i32, i32)) {
        self.width.store(mode.width(), Ordering::Relaxed);
        self.height.store(mode.height(), Ordering::Relaxed);
        self.home_x.store(home.0, Ordering::Relaxed);
        self.home_y.store(home.1, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
    }

    fn set_terminal(&self, cols: u16, rows: u16) {
        self.cols.store(cols.max(1) as i32, Ordering::Relaxed);
        self.rows.store(rows.max(1) as i32, Ordering::Relaxed);
    }

    /// Pixel under the centre of a terminal cell.
    fn cell_to_pixel(&self, column: u16, row: u16) -> (i32, i32) {
        let width = self.width.load(Ordering::Relaxed);
        let height = self.height.load(Ordering::Relaxed);
        let cols = self.cols.load(Ordering::Relaxed).max(1);
        let rows = self.rows.load(Ordering::Relaxed).max(1);
        (
            (column as i32 * 2 + 1) * width / (2 * cols),
            (row as i32 * 2 + 1) * height / (2 * rows),
        )
    }
}

// ── Video ────────────────────────────────────────────────────────────────────

/// Video device drawing on the terminal.
pub struct TerminalVideo {
    geometry: Arc<Geometry>,
    /// Cursor start at the reference resolution.
    cursor_start: (i32, i32),
    queried: Option<VideoMode>,
}

impl TerminalVideo {
    pub fn new(geometry: Arc<Geometry>, cursor_start: (i32, i32)) -> Self {
        TerminalVideo {
            geometry,
            cursor_start,
            queried: None,
        }
    }
}

impl VideoDevice for TerminalVideo {
    fn mode_info(&mut self, mode: ModeId) -> Result<VideoMode, DeviceError> {
        let info = VideoMode::describe(mode);
        self.queried = Some(info);
        Ok(info)
    }

    fn map_memory(&mut self, base: u32, size: usize) -> Result<Box<dyn VideoMemory>, DeviceError> {
        let mode = self
            .queried
            .ok_or_else(|| DeviceError::MapFailed("no mode was queried before mapping".into()))?;
        if size != mode.frame_len() {
            return Err(DeviceError::MappingSize {
                expected: mode.frame_len(),
                mapped: size,
            });
        }
        debug!(base, size, "mapped terminal video memory");
        Ok(Box::new(TerminalMemory {
            bytes: vec![0; size],
            mode,
            geometry: Arc::clone(&self.geometry),
        }))
    }

    fn set_mode(&mut self, mode: ModeId) -> Result<(), DeviceError> {
        let info = match self.queried {
            Some(info) if info.id == mode => info,
            _ => return Err(DeviceError::UnsupportedMode(mode)),
        };
        let home = (info.scale_x(self.cursor_start.0), info.scale_y(self.cursor_start.1));
        self.geometry.set_mode(&info, home);

        let mut out = io::stdout();
        out.queue(terminal::Clear(terminal::ClearType::All))
            .and_then(|out| out.flush())
            .map_err(|e| DeviceError::SetMode {
                mode,
                reason: e.to_string(),
            })
    }

    fn exit(&mut self) -> Result<(), DeviceError> {
        let mut out = io::stdout();
        out.queue(style::ResetColor)?;
        out.queue(terminal::Clear(terminal::ClearType::All))?;
        out.flush()?;
        Ok(())
    }
}

struct TerminalMemory {
    bytes: Vec<u8>,
    mode: VideoMode,
    geometry: Arc<Geometry>,
}

impl TerminalMemory {
    fn sample(&self, x: i32, y: i32) -> Color {
        let bpp = self.mode.bytes_per_pixel();
        let at = (y as usize * self.mode.x_resolution as usize + x as usize) * bpp;
        let mut raw = [0u8; 4];
        if let Some(px) = self.bytes.get(at..at + bpp) {
            raw[..bpp].copy_from_slice(px);
        }
        let rgb = decode(self.mode.bits_per_pixel, u32::from_le_bytes(raw));
        Color::Rgb {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }
}

impl VideoMemory for TerminalMemory {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Downsample the frame to the terminal: each cell shows an upper
    /// half block with the top pixel as foreground and the bottom pixel as
    /// background.
    fn flush(&mut self) -> Result<(), DeviceError> {
        let (cols, rows) = terminal::size()?;
        self.geometry.set_terminal(cols, rows);

        let width = self.mode.width();
        let height = self.mode.height();
        let sub_rows = rows as i32 * 2;
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut colors: Option<(Color, Color)> = None;

        for row in 0..rows {
            out.queue(cursor::MoveTo(0, row))?;
            for col in 0..cols {
                let x = (col as i32 * 2 + 1) * width / (2 * cols as i32);
                let top_y = (row as i32 * 4 + 1) * height / (2 * sub_rows);
                let bottom_y = (row as i32 * 4 + 3) * height / (2 * sub_rows);
                let cell = (self.sample(x, top_y), self.sample(x, bottom_y));

                if colors != Some(cell) {
                    out.queue(style::SetForegroundColor(cell.0))?;
                    out.queue(style::SetBackgroundColor(cell.1))?;
                    colors = Some(cell);
                }
                out.queue(Print('▀'))?;
            }
        }
        out.queue(style::ResetColor)?;
        out.flush()?;
        Ok(())
    }
}

// ── Interrupts ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
enum HostEvent {
    Tick,
    Key(u8),
    Pointer(PointerPacket),
    Failed(String),
}

/// Make code for a terminal key. Arrow keys double as A, D and W.
pub fn scancode_for_key(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Esc => Some(SCAN_ESC_PRESSED),
        KeyCode::Enter => Some(SCAN_ENTER),
        KeyCode::Backspace => Some(SCAN_BACKSPACE),
        KeyCode::Left => Some(SCAN_A_PRESSED),
        KeyCode::Right => Some(SCAN_D_PRESSED),
        KeyCode::Up => Some(SCAN_W_PRESSED),
        KeyCode::Char(c) => input::scancode_for(c),
        _ => None,
    }
}

/// Turns absolute mouse cells into relative packets, the way a real
/// pointer reports motion.
#[derive(Debug, Default)]
struct PointerTracker {
    last: (i32, i32),
    generation: u32,
    left: bool,
    right: bool,
    middle: bool,
}

impl PointerTracker {
    fn packet(&mut self, geometry: &Geometry, mouse: MouseEvent) -> Option<PointerPacket> {
        let generation = geometry.generation.load(Ordering::Acquire);
        if generation != self.generation {
            // The cursor was recreated at its home position.
            self.generation = generation;
            self.last = (
                geometry.home_x.load(Ordering::Relaxed),
                geometry.home_y.load(Ordering::Relaxed),
            );
        }

        let mut set = |button: MouseButton, down: bool| match button {
            MouseButton::Left => self.left = down,
            MouseButton::Right => self.right = down,
            MouseButton::Middle => self.middle = down,
        };
        match mouse.kind {
            MouseEventKind::Down(button) | MouseEventKind::Drag(button) => set(button, true),
            MouseEventKind::Up(button) => set(button, false),
            MouseEventKind::Moved => {}
            _ => return None,
        }

        let (x, y) = geometry.cell_to_pixel(mouse.column, mouse.row);
        let dx = (x - self.last.0).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        let dy = (self.last.1 - y).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        self.last = (x, y);

        Some(PointerPacket {
            dx,
            dy,
            left: self.left,
            right: self.right,
            middle: self.middle,
        })
    }
}

/// Timer and terminal events merged into interrupt-style notifications.
pub struct TerminalInterrupts {
    rx: Receiver<HostEvent>,
    backlog: VecDeque<HostEvent>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl TerminalInterrupts {
    /// Spawn the producers. `key_releases` tells whether the terminal
    /// reports releases itself; without them releases are synthesised.
    pub fn start(tick_hz: u32, geometry: Arc<Geometry>, key_releases: bool) -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs(1) / tick_hz.max(1);

        let timer = {
            let tx = tx.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    thread::sleep(period);
                    if tx.send(HostEvent::Tick).is_err() {
                        break;
                    }
                }
            })
        };

        let events = {
            let stop = Arc::clone(&stop);
            let hold = period * HOLD_WINDOW_TICKS;
            thread::spawn(move || read_terminal(tx, stop, geometry, key_releases, hold))
        };

        TerminalInterrupts {
            rx,
            backlog: VecDeque::new(),
            stop,
            threads: vec![timer, events],
        }
    }

    fn merge(&mut self) -> Result<Notification, ReceiveError> {
        let mut notification = Notification::default();
        while let Some(event) = self.backlog.front() {
            match event {
                HostEvent::Tick => notification.timer = true,
                HostEvent::Key(_) if notification.scancode.is_some() => break,
                HostEvent::Pointer(_) if notification.packet.is_some() => break,
                HostEvent::Key(code) => notification.scancode = Some(*code),
                HostEvent::Pointer(packet) => notification.packet = Some(*packet),
                HostEvent::Failed(_) if !notification.is_empty() => break,
                HostEvent::Failed(reason) => {
                    let reason = reason.clone();
                    self.backlog.pop_front();
                    return Err(ReceiveError::Failed(reason));
                }
            }
            self.backlog.pop_front();
        }
        Ok(notification)
    }
}

impl InterruptSource for TerminalInterrupts {
    fn wait(&mut self) -> Result<Notification, ReceiveError> {
        if self.backlog.is_empty() {
            let first = self.rx.recv().map_err(|_| ReceiveError::Disconnected)?;
            self.backlog.push_back(first);
        }
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.backlog.push_back(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if self.backlog.is_empty() => {
                    return Err(ReceiveError::Disconnected)
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        self.merge()
    }
}

impl Drop for TerminalInterrupts {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

fn read_terminal(
    tx: Sender<HostEvent>,
    stop: Arc<AtomicBool>,
    geometry: Arc<Geometry>,
    key_releases: bool,
    hold: Duration,
) {
    let mut pointer = PointerTracker::default();
    // Make codes of keys held on terminals without release events.
    let mut held: HashMap<u8, Instant> = HashMap::new();

    while !stop.load(Ordering::Relaxed) {
        let mut outgoing = Vec::new();

        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    translate_key(key, key_releases, &mut held, &mut outgoing);
                }
                Ok(Event::Mouse(mouse)) => {
                    outgoing.extend(pointer.packet(&geometry, mouse).map(HostEvent::Pointer));
                }
                Ok(Event::Resize(cols, rows)) => geometry.set_terminal(cols, rows),
                Ok(_) => {}
                Err(e) => outgoing.push(HostEvent::Failed(e.to_string())),
            },
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "terminal poll failed");
                outgoing.push(HostEvent::Failed(e.to_string()));
                thread::sleep(POLL_INTERVAL);
            }
        }

        let now = Instant::now();
        held.retain(|&code, seen| {
            let live = now.duration_since(*seen) <= hold;
            if !live {
                outgoing.push(HostEvent::Key(code | BREAK_BIT));
            }
            live
        });

        for event in outgoing {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

fn translate_key(key: KeyEvent, key_releases: bool, held: &mut HashMap<u8, Instant>, out: &mut Vec<HostEvent>) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        out.push(HostEvent::Key(SCAN_ESC_RELEASED));
        return;
    }
    let Some(make) = scancode_for_key(key.code) else {
        return;
    };
    trace!(code = ?key.code, make, "key");

    match key.kind {
        KeyEventKind::Press => {
            out.push(HostEvent::Key(make));
            if !key_releases {
                held.insert(make, Instant::now());
            }
        }
        KeyEventKind::Repeat => {
            if !key_releases {
                held.insert(make, Instant::now());
            }
        }
        KeyEventKind::Release => out.push(HostEvent::Key(make | BREAK_BIT)),
    }
}
