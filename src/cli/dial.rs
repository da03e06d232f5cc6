//! Interactive terminal dial
//!
//! SPACE toggles playback, ENTER grabs or releases the handle, LEFT/RIGHT
//! turn it while grabbed, Q or ESC quits.

use std::io::{stdout, Write};
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{cursor, ExecutableCommand};

use crate::config::Config;
use crate::engine::{AudioBackend, DeviceBackend};
use crate::error::Result;
use crate::presets::{PresetSource, RandomPresets};
use crate::session::{Session, Snapshot};

/// Handle rotation per arrow key press, in degrees
const STEP_DEG: f64 = 10.0;

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Exit,
}

/// Keyboard state around a session
pub struct Dial<B: AudioBackend, P: PresetSource> {
    session: Session<B, P>,
    /// Raw pointer angle of the on-screen handle, in (-180, 180]
    handle_deg: f64,
    status: Option<String>,
}

impl<B: AudioBackend, P: PresetSource> Dial<B, P> {
    pub fn new(session: Session<B, P>) -> Self {
        Self {
            session,
            handle_deg: 0.0,
            status: None,
        }
    }

    pub fn session(&self) -> &Session<B, P> {
        &self.session
    }

    pub fn handle_deg(&self) -> f64 {
        self.handle_deg
    }

    /// Apply one key press; session errors become the status line
    pub fn handle_key(&mut self, code: KeyCode) -> KeyAction {
        let outcome = match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return KeyAction::Exit,
            KeyCode::Char(' ') => self.session.toggle_play().map(|playing| {
                Some(if playing { "playing" } else { "stopped" }.to_string())
            }),
            KeyCode::Enter => self.toggle_drag(),
            KeyCode::Left => self.turn(-STEP_DEG),
            KeyCode::Right => self.turn(STEP_DEG),
            _ => Ok(None),
        };

        match outcome {
            Ok(Some(status)) => self.status = Some(status),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "dial action failed");
                self.status = Some(format!("error: {}", e));
            }
        }
        KeyAction::Continue
    }

    fn toggle_drag(&mut self) -> Result<Option<String>> {
        if self.session.is_dragging() {
            let track = self.session.end_drag()?;
            return Ok(track.map(|t| format!("{} [{}]", t.pair, t.inspiration)));
        }
        if self.session.begin_drag(self.handle_deg) {
            Ok(Some("turning".to_string()))
        } else {
            Ok(Some("press SPACE to play first".to_string()))
        }
    }

    fn turn(&mut self, delta: f64) -> Result<Option<String>> {
        if !self.session.is_dragging() {
            return Ok(None);
        }
        self.handle_deg = super::commands::wrap_angle(self.handle_deg + delta);
        self.session.drag_to(self.handle_deg)?;
        Ok(None)
    }

    /// Lines to draw for the current state
    pub fn render_lines(&self) -> Vec<String> {
        let Snapshot {
            playing,
            dragging,
            octave_offset,
            track,
            ..
        } = self.session.snapshot();
        let range = self.session.mapper().range();

        let width = 41usize;
        let position = ((octave_offset - range.min) / range.span() * (width - 1) as f64)
            .round()
            .clamp(0.0, (width - 1) as f64) as usize;
        let mut meter: Vec<char> = vec!['-'; width];
        meter[width / 2] = '|';
        meter[position] = 'O';

        let live = self
            .session
            .engine()
            .current_pair()
            .unwrap_or(track.pair);

        vec![
            "Binaural dial   SPACE=play/stop  ENTER=grab/release  LEFT/RIGHT=turn  Q=quit"
                .to_string(),
            String::new(),
            format!(
                "State:   {}{}",
                if playing { "PLAYING" } else { "STOPPED" },
                if dragging { " (turning)" } else { "" }
            ),
            format!("Track:   {}  [{}]", track.pair, track.inspiration),
            format!("Now:     L {:.2} Hz  R {:.2} Hz", live.left(), live.right()),
            format!("Handle:  {:>7.1} deg", self.handle_deg),
            format!(
                "Octave:  {:+.3}  {:+.0} [{}] {:+.0}",
                octave_offset,
                range.min,
                meter.into_iter().collect::<String>(),
                range.max
            ),
            String::new(),
            self.status.clone().unwrap_or_default(),
        ]
    }

    /// Stop playback before exit
    pub fn shutdown(&mut self) -> Result<()> {
        if self.session.is_playing() {
            self.session.toggle_play()?;
        }
        Ok(())
    }
}

/// Run the dial against the default output device.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let session = Session::new(DeviceBackend::new(), RandomPresets::new(), config);
    let mut dial = Dial::new(session);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(cursor::Hide)?;

    let result = with_panic_cleanup(cleanup_terminal, || event_loop(&mut dial));
    cleanup_terminal();

    dial.shutdown()?;
    // Let the fade-out play before the stream is dropped
    std::thread::sleep(Duration::from_secs_f64(config.engine.release_secs + 0.1));
    result
}

fn event_loop<B: AudioBackend, P: PresetSource>(dial: &mut Dial<B, P>) -> anyhow::Result<()> {
    draw(dial)?;
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        if let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            if dial.handle_key(code) == KeyAction::Exit {
                return Ok(());
            }
            draw(dial)?;
        }
    }
}

fn draw<B: AudioBackend, P: PresetSource>(dial: &Dial<B, P>) -> anyhow::Result<()> {
    let mut out = stdout();
    out.execute(Clear(ClearType::All))?;
    out.execute(cursor::MoveTo(0, 0))?;
    for line in dial.render_lines() {
        write!(out, "{}\r\n", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Run `f` with `cleanup` chained in front of the current panic hook
///
/// The previous hook is put back once `f` returns.
fn with_panic_cleanup<T>(cleanup: fn(), f: impl FnOnce() -> T) -> T {
    let original = Arc::new(panic::take_hook());
    let chained = Arc::clone(&original);
    panic::set_hook(Box::new(move |info| {
        cleanup();
        (**chained)(info);
    }));

    let result = f();

    // Dropping the chained hook releases its handle on the original
    drop(panic::take_hook());
    if let Ok(original) = Arc::try_unwrap(original) {
        panic::set_hook(original);
    }
    result
}

fn cleanup_terminal() {
    let _ = stdout().execute(cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OfflineBackend;
    use crate::presets::CyclingPresets;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dial() -> Dial<OfflineBackend, CyclingPresets> {
        let config = Config::default();
        Dial::new(Session::new(
            OfflineBackend::from_config(&config.engine),
            CyclingPresets::starting_at("Alpha"),
            &config,
        ))
    }

    static CLEANUPS: AtomicUsize = AtomicUsize::new(0);
    static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn count_cleanup() {
        CLEANUPS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_panic_cleanup_hook_is_scoped() {
        panic::set_hook(Box::new(|_| {
            HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
        }));

        let caught = with_panic_cleanup(count_cleanup, || panic::catch_unwind(|| panic!("inside")));
        assert!(caught.is_err());
        assert_eq!(CLEANUPS.load(Ordering::SeqCst), 1);
        assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 1);

        // Outside the scope only the previous hook runs
        let caught = panic::catch_unwind(|| panic!("outside"));
        assert!(caught.is_err());
        assert_eq!(CLEANUPS.load(Ordering::SeqCst), 1);
        assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 2);

        drop(panic::take_hook());
    }

    #[test]
    fn test_quit_keys() {
        let mut dial = dial();
        assert_eq!(dial.handle_key(KeyCode::Char('q')), KeyAction::Exit);
        assert_eq!(dial.handle_key(KeyCode::Esc), KeyAction::Exit);
        assert_eq!(dial.handle_key(KeyCode::Char('x')), KeyAction::Continue);
    }

    #[test]
    fn test_turning_requires_grab() {
        let mut dial = dial();
        dial.handle_key(KeyCode::Char(' '));
        dial.handle_key(KeyCode::Right);
        assert_eq!(dial.handle_deg(), 0.0);

        dial.handle_key(KeyCode::Enter);
        assert!(dial.session().is_dragging());
        for _ in 0..9 {
            dial.handle_key(KeyCode::Right);
        }
        assert!((dial.handle_deg() - 90.0).abs() < 1e-9);
        assert!(dial.session().octave_offset() > 0.0);

        dial.handle_key(KeyCode::Enter);
        assert!(!dial.session().is_dragging());
        assert!(dial.session().track().pair.base > 126.22);
    }

    #[test]
    fn test_grab_while_stopped_sets_hint() {
        let mut dial = dial();
        dial.handle_key(KeyCode::Enter);
        assert!(!dial.session().is_dragging());
        let lines = dial.render_lines();
        assert!(lines.last().unwrap().contains("SPACE"));
    }

    #[test]
    fn test_render_lines_show_state() {
        let mut dial = dial();
        dial.handle_key(KeyCode::Char(' '));
        let lines = dial.render_lines();
        assert!(lines.iter().any(|l| l.contains("PLAYING")));
        assert!(lines.iter().any(|l| l.contains("126.22")));
    }
}
