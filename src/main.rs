use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{env, fs::File, io, sync::Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sales_atlas::{
    config::{AtlasConfig, DEFAULT_CONFIG_FILE, LoggingSettings},
    state::{AppState, load_sources},
    ui,
};

/// Terminal należy do interfejsu, więc logi idą do pliku.
/// `RUST_LOG` ma pierwszeństwo przed poziomem z konfiguracji.
fn init_logging(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(&settings.file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = AtlasConfig::load_or_default(&config_path)?;
    init_logging(&config.logging)?;
    info!(config = %config_path, "starting sales atlas");

    let (store, basemap) = load_sources(&config)?;
    let mut state = AppState::new(config, store, basemap);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        state.poll_fetches();
        terminal.draw(|f| ui::draw(f, &mut state))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? {
                if state.handle_input(code) {
                    break;
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    info!("sales atlas closed");
    Ok(())
}
