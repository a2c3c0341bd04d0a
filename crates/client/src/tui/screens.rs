use glam::Vec2;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Paragraph};

use asteroids::net::Transport;
use asteroids::world::heading;
use asteroids::{GameClient, GameState, Ship};

const SHIP_NOSE: f32 = 1.0;
const SHIP_TAIL: f32 = 0.7;
const SHIP_TAIL_ANGLE: f32 = 2.4;

pub struct View<'a> {
    pub server: &'a str,
    pub extents: Vec2,
    pub key_releases: bool,
    pub error: Option<&'a str>,
}

pub fn render<T: Transport>(frame: &mut Frame, client: &GameClient<T>, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(32)])
        .split(frame.area());

    render_arena(frame, chunks[0], client.state(), view.extents);
    render_sidebar(frame, chunks[1], client, view);
}

fn render_arena(frame: &mut Frame, area: Rect, state: &GameState, extents: Vec2) {
    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" Asteroids ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .marker(Marker::Braille)
        .x_bounds([-f64::from(extents.x), f64::from(extents.x)])
        .y_bounds([-f64::from(extents.y), f64::from(extents.y)])
        .paint(|ctx| {
            for asteroid in state.asteroids() {
                ctx.draw(&Circle {
                    x: f64::from(asteroid.position.x),
                    y: f64::from(asteroid.position.y),
                    radius: f64::from(asteroid.size),
                    color: Color::Gray,
                });
            }

            let lasers: Vec<(f64, f64)> = state
                .lasers()
                .map(|laser| (f64::from(laser.position.x), f64::from(laser.position.y)))
                .collect();
            ctx.draw(&Points {
                coords: &lasers,
                color: Color::Red,
            });

            for (_, ship) in state.ships() {
                draw_ship(ctx, ship);
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_ship(ctx: &mut Context, ship: &Ship) {
    let color = if ship.local {
        Color::Yellow
    } else {
        Color::LightBlue
    };

    let nose = ship.position + heading(ship.rotation) * SHIP_NOSE;
    let left = ship.position + heading(ship.rotation - SHIP_TAIL_ANGLE) * SHIP_TAIL;
    let right = ship.position + heading(ship.rotation + SHIP_TAIL_ANGLE) * SHIP_TAIL;

    for (a, b) in [(nose, left), (left, right), (right, nose)] {
        ctx.draw(&CanvasLine {
            x1: f64::from(a.x),
            y1: f64::from(a.y),
            x2: f64::from(b.x),
            y2: f64::from(b.y),
            color,
        });
    }
}

fn render_sidebar<T: Transport>(frame: &mut Frame, area: Rect, client: &GameClient<T>, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(area);

    let (status, status_color) = if client.is_connected() {
        ("Connected", Color::Green)
    } else {
        ("Disconnected", Color::Red)
    };
    let mut connection = vec![
        Line::from(Span::styled(
            status,
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        )),
        label_line("Server: ", view.server.to_string()),
        label_line("Snapshots: ", client.snapshots_received().to_string()),
    ];
    if let Some(error) = view.error {
        connection.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    frame.render_widget(
        Paragraph::new(connection).block(panel(" Connection ", Color::Green)),
        chunks[0],
    );

    let state = client.state();
    let ship_lines = match client.local_ship() {
        Some(ship) => vec![
            label_line("Ship: ", ship.id.to_string()),
            label_line(
                "Position: ",
                format!("{:.1}, {:.1}", ship.position.x, ship.position.y),
            ),
            label_line("Speed: ", format!("{:.2}", ship.velocity.length())),
            label_line("Heading: ", format!("{:.0} deg", ship.rotation.to_degrees())),
            label_line(
                "Input: ",
                format!(
                    "accel {} turn {}{}",
                    client.input().accel,
                    client.input().turn,
                    if client.input().fire { " fire" } else { "" }
                ),
            ),
        ],
        None => vec![Line::from(Span::styled(
            "Waiting for snapshot...",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(
        Paragraph::new(ship_lines).block(panel(" Ship ", Color::Yellow)),
        chunks[1],
    );

    let stats = client.stats();
    let world = vec![
        label_line(
            "Entities: ",
            format!(
                "{} ships {} rocks {} shots",
                state.ship_count(),
                state.asteroid_count(),
                state.laser_count()
            ),
        ),
        label_line(
            "Frames: ",
            format!("{} in / {} out", stats.frames_received, stats.frames_sent),
        ),
        label_line(
            "Bytes: ",
            format!("{} in / {} out", stats.bytes_received, stats.bytes_sent),
        ),
        label_line("Deferred: ", stats.sends_deferred.to_string()),
    ];
    frame.render_widget(
        Paragraph::new(world).block(panel(" Network ", Color::Magenta)),
        chunks[2],
    );

    let mut help = vec![
        Line::from("W/Up thrust  S/Down reverse"),
        Line::from("A/D or Left/Right turn"),
        Line::from("Space fire  q/Esc quit"),
    ];
    if !view.key_releases {
        help.push(Line::from(Span::styled(
            "Hold keys: no release events",
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Left)
            .style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
            .block(panel(" Controls ", Color::DarkGray)),
        chunks[3],
    );
}

fn panel(title: &'static str, color: Color) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn label_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}
