mod tui;

use std::io;
use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use asteroids::net::DEFAULT_COMPRESSION_LEVEL;
use asteroids::{GameServer, ServerConfig, ServerEvent};
use tui::{Tab, TuiState};

#[derive(Parser)]
#[command(name = "asteroids-server")]
#[command(about = "Authoritative asteroids arena server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = asteroids::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = asteroids::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = asteroids::DEFAULT_SYNC_INTERVAL, value_parser = asteroids::parse_interval, help = "Seconds between snapshots")]
    sync_interval: f32,

    #[arg(short = 'a', long = "asteroids", default_value_t = 8, help = "Asteroids spawned at startup")]
    asteroid_count: usize,

    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL, help = "zstd level for snapshot diffs")]
    compression_level: i32,

    #[arg(long, help = "Fixed RNG seed for asteroid spawns")]
    seed: Option<u64>,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        sync_interval: args.sync_interval,
        asteroid_count: args.asteroid_count,
        compression_level: args.compression_level,
        seed: args.seed,
        ..Default::default()
    };

    let mut server = GameServer::bind(&bind_addr, config)
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Server started on {}", server.local_addr()?);
        server.run();
        log::info!("Server shutting down");
    } else {
        run_with_tui(&mut server)?;
    }

    Ok(())
}

fn run_with_tui(server: &mut GameServer<TcpListener>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = server.running();
    let mut tui_state = TuiState::new();

    tui_state.log_info(format!("Server started on {}", server.local_addr()?));

    while running.load(Ordering::SeqCst) {
        server.update();

        for event in server.drain_events() {
            match event {
                ServerEvent::ClientConnected {
                    slot,
                    ship_id,
                    addr,
                } => {
                    let addr = addr.map_or_else(|| "<unknown>".to_string(), |a| a.to_string());
                    tui_state.log_info(format!(
                        "Client {} connected in slot {} (ship {})",
                        addr, slot, ship_id
                    ));
                }
                ServerEvent::ClientDisconnected {
                    slot,
                    ship_id,
                    reason,
                } => {
                    let message = format!("Slot {} (ship {}) {}", slot, ship_id, reason.as_str());
                    if reason.is_orderly() {
                        tui_state.log_info(message);
                    } else {
                        tui_state.log_warn(message);
                    }
                }
                ServerEvent::Error { message } => {
                    tui_state.log_error(message);
                }
            }
        }

        if let Some(slot) = tui_state.take_pending_kick() {
            server.kick(slot);
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let clients = server.client_infos();
                    let on_connections = tui_state.active_tab() == Tab::Connections;

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Tab => tui_state.next_tab(),
                        KeyCode::BackTab => tui_state.prev_tab(),
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        KeyCode::Up if on_connections => {
                            tui_state.select_prev_connection(clients.len());
                        }
                        KeyCode::Down if on_connections => {
                            tui_state.select_next_connection(clients.len());
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') if on_connections => {
                            tui_state.request_kick(&clients);
                        }
                        KeyCode::Char('a') => match server.spawn_asteroid() {
                            Some(slot) => {
                                tui_state.log_info(format!("Spawned asteroid in slot {}", slot))
                            }
                            None => tui_state.log_warn("Asteroid pool full"),
                        },
                        _ => {}
                    }
                }
            }
        }

        let stats = server.stats();
        let clients = server.client_infos();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats, &clients);
        })?;
    }

    tui_state.log_info("Shutting down...");
    server.shutdown_connections();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
