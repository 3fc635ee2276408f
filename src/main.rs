use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use meetups_cal::{
    app::App,
    config, dates, keygen,
    route::HistoryMode,
    tui, AppEvent,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    #[arg(short, long)]
    debug: bool,

    /// Location to open: `/`, `/YEAR/MONTH` or `/YEAR/MONTH/fullscreen`
    #[arg(default_value = "/")]
    location: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a secured search key restricted by a filter
    GenerateKey {
        /// Search key the secured key is derived from
        #[arg(long, env = "ALGOLIA_SEARCH_API_KEY", hide_env_values = true)]
        parent_key: String,

        #[arg(long, default_value = keygen::CONFIRMED_FILTER)]
        filters: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    if let Some(Command::GenerateKey {
        parent_key,
        filters,
    }) = &cli.command
    {
        let key = keygen::generate_secured_api_key(parent_key, &[("filters", filters.as_str())])
            .map_err(meetups_cal::error::Error::from)?;
        println!("Generated key:");
        println!();
        println!("{}", key);
        return Ok(());
    }

    let settings = config::load_config().map_err(|e| {
        println!("ERROR: Could not read the configuration.");
        println!(
            "Set [algolia] app_id and api_key in ~/.config/{}/Settings.toml",
            config::APP_DIR
        );
        println!("or through MEETUPS_CAL__ALGOLIA__APP_ID / MEETUPS_CAL__ALGOLIA__API_KEY.");
        meetups_cal::error::Error::from(e)
    })?;

    let enable_logging = cli.debug || settings.enable_debug_log.unwrap_or(false);
    if enable_logging {
        simple_logging::log_to_file("meetups-cal.log", log::LevelFilter::Debug)?;
    }

    info!("Application started at {}.", cli.location);

    let tz = settings.timezone()?;
    let history_mode = settings.history.unwrap_or(HistoryMode::Push);
    let source = Arc::new(settings.search_client());

    let (tx, rx) = mpsc::channel(16);

    if let Some(minutes) = settings.refresh_interval_minutes.filter(|m| *m > 0) {
        let refresh_duration = Duration::from_secs(minutes * 60);
        let tx_clone = tx.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(refresh_duration);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                info!("Refresh timer triggered. Sending Refresh event.");
                if tx_clone.send(AppEvent::Refresh).await.is_err() {
                    break;
                }
            }
        });
    }

    let mut app = App::new(tz, history_mode, &cli.location, dates::today_in(tz));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = tui::run_app(&mut terminal, &mut app, source, rx, tx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("Application terminated at {}.", app.navigator.current());

    if let Err(err) = res {
        error!("Application runtime error: {}", err);
    }

    Ok(())
}
