mod screens;

use std::io;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use asteroids::GameClient;

use crate::keys::{DEFAULT_HOLD_TIMEOUT, KeyTracker};
use screens::View;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    keys: KeyTracker,
    /// Whether the terminal reports key releases.
    key_releases: bool,
    should_quit: bool,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let key_releases = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if key_releases {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            keys: if key_releases {
                KeyTracker::reported()
            } else {
                KeyTracker::with_timeout(DEFAULT_HOLD_TIMEOUT)
            },
            key_releases,
            should_quit: false,
        })
    }

    pub fn run(&mut self, client: &mut GameClient<TcpStream>, server: &str) -> io::Result<()> {
        let extents = client.config().sim.extents;
        let mut error: Option<String> = None;

        while !self.should_quit {
            let now = Instant::now();
            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers, key.kind, now);
                }
            }
            self.keys.expire(now);
            client.set_input(self.keys.input());

            if let Err(e) = client.frame() {
                error = Some(e.to_string());
            }

            let view = View {
                server,
                extents,
                key_releases: self.key_releases,
                error: error.as_deref(),
            };
            self.terminal.draw(|frame| screens::render(frame, &*client, &view))?;

            std::thread::sleep(FRAME_INTERVAL.saturating_sub(now.elapsed()));
        }

        Ok(())
    }

    fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        kind: KeyEventKind,
        now: Instant,
    ) {
        let quit = (modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c'))
            || matches!(code, KeyCode::Char('q') | KeyCode::Esc);
        if quit && kind == KeyEventKind::Press {
            self.should_quit = true;
            return;
        }

        self.keys.handle(code, kind, now);
    }

    pub fn restore_terminal(&mut self) -> io::Result<()> {
        if self.key_releases {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

pub fn run_game(client: &mut GameClient<TcpStream>, server: &str) -> io::Result<()> {
    let mut tui = Tui::new()?;
    tui.run(client, server)
}
