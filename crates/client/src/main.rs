mod keys;
mod tui;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use asteroids::{ClientConfig, GameClient};

#[derive(Parser)]
#[command(name = "asteroids-client")]
#[command(about = "Asteroids arena client")]
struct Args {
    #[arg(
        short,
        long,
        default_value_t = format!("127.0.0.1:{}", asteroids::DEFAULT_PORT),
        help = "Server address to connect to"
    )]
    server: String,

    #[arg(short, long, default_value_t = asteroids::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = asteroids::DEFAULT_SYNC_INTERVAL, value_parser = asteroids::parse_interval, help = "Seconds between input uploads")]
    send_interval: f32,

    #[arg(long, help = "Run without a terminal UI and log the predicted state")]
    headless: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ClientConfig {
        tick_rate: args.tick_rate,
        send_interval: args.send_interval,
        ..ClientConfig::default()
    };
    let mut client = GameClient::connect(&args.server, config)
        .with_context(|| format!("failed to connect to {}", args.server))?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        run_headless(&mut client)?;
    } else {
        tui::run_game(&mut client, &args.server)?;
    }

    Ok(())
}

fn run_headless(client: &mut GameClient<std::net::TcpStream>) -> anyhow::Result<()> {
    let mut last_report = Instant::now();

    loop {
        client.frame()?;

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let state = client.state();
            match client.local_ship() {
                Some(ship) => log::info!(
                    "ship {} at ({:.1}, {:.1}) | {} ships, {} asteroids, {} lasers",
                    ship.id,
                    ship.position.x,
                    ship.position.y,
                    state.ship_count(),
                    state.asteroid_count(),
                    state.laser_count()
                ),
                None => log::info!("waiting for first snapshot"),
            }
        }

        thread::sleep(Duration::from_millis(1));
    }
}
