//! The interrupt dispatch loop.
//!
//! One thread blocks on the interrupt source, then services every flag of
//! the wakeup in a fixed order: timer, keyboard, pointer. Which handlers
//! run is decided by [`state::actions`] for the current screen.

use tracing::{debug, error, info, warn};

use crate::error::{ReceiveError, Result};
use crate::input::{InterruptSource, Notification, PointerPacket, SCAN_ESC_RELEASED};
use crate::session::Session;
use crate::state::{self, Action, GameState, Source};

/// What a finished loop went through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub wakeups: u64,
    pub ticks: u64,
    pub receive_failures: u64,
}

/// Run until the session reaches [`GameState::Exit`] or the interrupt
/// source goes away. The device is torn down on both paths.
pub fn run(session: &mut Session, source: &mut dyn InterruptSource) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    loop {
        if session.state() == GameState::Exit {
            for &action in state::actions(Source::Timer, GameState::Exit) {
                perform(session, action, None, false)?;
            }
            break;
        }

        let notification = match source.wait() {
            Ok(notification) => notification,
            Err(ReceiveError::Disconnected) => {
                info!("interrupt source closed");
                session.shutdown()?;
                break;
            }
            Err(e) => {
                warn!(error = %e, "skipping wakeup");
                summary.receive_failures += 1;
                continue;
            }
        };
        summary.wakeups += 1;
        if notification.timer {
            summary.ticks += 1;
        }

        service(session, notification)?;
    }

    info!(
        wakeups = summary.wakeups,
        ticks = summary.ticks,
        failures = summary.receive_failures,
        "dispatch loop finished"
    );
    Ok(summary)
}

/// Handle one wakeup. Each pending kind runs at most once.
pub fn service(session: &mut Session, notification: Notification) -> Result<()> {
    if notification.timer {
        on_timer(session)?;
    }
    if let Some(scancode) = notification.scancode {
        on_key(session, scancode)?;
    }
    if let Some(packet) = notification.packet {
        on_pointer(session, packet)?;
    }
    Ok(())
}

fn on_timer(session: &mut Session) -> Result<()> {
    let state = session.state();
    for &action in state::actions(Source::Timer, state) {
        perform(session, action, None, false)?;
    }
    if state != GameState::Exit {
        session.present()?;
    }
    Ok(())
}

fn on_key(session: &mut Session, scancode: u8) -> Result<()> {
    if scancode == SCAN_ESC_RELEASED {
        session.transition(GameState::Exit);
        return Ok(());
    }
    for &action in state::actions(Source::Keyboard, session.state()) {
        perform(session, action, Some(scancode), false)?;
    }
    Ok(())
}

fn on_pointer(session: &mut Session, packet: PointerPacket) -> Result<()> {
    let clicked = session.move_pointer(packet);
    for &action in state::actions(Source::Pointer, session.state()) {
        perform(session, action, None, clicked)?;
    }
    Ok(())
}

fn perform(session: &mut Session, action: Action, scancode: Option<u8>, clicked: bool) -> Result<()> {
    match action {
        Action::RenderResolutionSelect => session.render_resolution_select(),
        Action::RenderMenu => session.render_menu(),
        Action::RenderLeaderboard => session.render_leaderboard(),
        Action::RenderScoreboard => session.render_scoreboard(),
        Action::StepGame => {
            session.step_game();
        }
        Action::Shutdown => {
            if let Err(e) = session.shutdown() {
                error!(error = %e, "device teardown failed");
                return Err(e.into());
            }
        }
        Action::TrackKeys => {
            if let Some(code) = scancode {
                session.track_keys(code);
            }
        }
        Action::EditName => {
            if let Some(code) = scancode {
                session.edit_name(code);
            }
        }
        // Screen changes only happen on the press edge.
        Action::PickResolution if clicked => session.pick_resolution()?,
        Action::PickMenu if clicked => session.pick_menu(),
        Action::BackToMenu if clicked => session.back_to_menu(),
        Action::PickResolution | Action::PickMenu | Action::BackToMenu => {}
        Action::Fire => {
            if session.fire() {
                debug!("shot fired");
            }
        }
    }
    Ok(())
}
