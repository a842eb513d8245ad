use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tui_choropleth::app::App;
use tui_choropleth::config::Args;
use tui_choropleth::ui;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    info!(?args, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &args);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Drag orbits, a press and release in place picks, motion updates hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.set_mouse_pos(mouse.column, mouse.row);
            app.start_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag(mouse.column, mouse.row);
            app.hover_at(mouse.column, mouse.row);
        }
        MouseEventKind::Moved => {
            app.hover_at(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, args: &Args) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(args, size.width as usize, size.height as usize);

    // Main loop
    loop {
        app.poll_assets();

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Orbit with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.orbit(-1, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.orbit(1, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.orbit(0, -1),
                            KeyCode::Down | KeyCode::Char('j') => app.orbit(0, 1),

                            // Layer toggles
                            KeyCode::Char('L') => {
                                let settings = &mut app.renderer.settings;
                                settings.show_labels = !settings.show_labels;
                            }
                            KeyCode::Char('g') | KeyCode::Char('G') => {
                                let settings = &mut app.renderer.settings;
                                settings.show_grid = !settings.show_grid;
                            }
                            KeyCode::Char('o') | KeyCode::Char('O') => {
                                let settings = &mut app.renderer.settings;
                                settings.show_outlines = !settings.show_outlines;
                            }

                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_camera(),
                            KeyCode::Char('x') | KeyCode::Char('X') => app.clear_selection(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}
