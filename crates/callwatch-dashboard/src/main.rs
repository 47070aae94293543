use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use callwatch_core::time;
use callwatch_dashboard::app::{App, AppCommand};
use callwatch_dashboard::config::DashboardConfig;
use callwatch_dashboard::ui;
use callwatch_poller::{
    ActivityFeedState, ActivityPoller, ActivityPollerHandle, DashboardClient, SessionPoller,
    SessionPollerHandle,
};

/// Upper bound between frames so relative times keep moving.
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let config = DashboardConfig::load();
    config.validate()?;
    init_logging(&config)?;

    let poller_config = config.poller_config();
    let client = DashboardClient::new(&poller_config)?;
    tracing::info!(relay = %client.base_url(), "callwatch dashboard starting");

    let mut app = App::new(config.activity_limit);
    let activity = ActivityPoller::new(
        client.clone(),
        poller_config.activity_interval(),
        app.dashboard.activity_query(),
    )
    .spawn();
    let mut sessions = SessionPoller::new(client, poller_config.session_interval()).spawn();

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, &activity, &mut sessions).await;
    ratatui::restore();

    activity.shutdown();
    sessions.shutdown();
    result
}

/// Logs go to `log_file` when configured and are discarded otherwise; the
/// terminal belongs to the UI.
fn init_logging(config: &DashboardConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        },
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        },
    }
    Ok(())
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    activity: &ActivityPollerHandle,
    sessions: &mut SessionPollerHandle,
) -> color_eyre::Result<()> {
    let mut feed_rx: watch::Receiver<ActivityFeedState> = activity.subscribe();
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        terminal.draw(|f| ui::render(f, app, time::now()))?;
        if app.should_quit {
            break;
        }

        let command = tokio::select! {
            _ = redraw.tick() => None,
            Ok(()) = feed_rx.changed() => {
                app.set_feed(feed_rx.borrow_and_update().clone());
                None
            },
            Ok(()) = sessions.state.changed() => {
                app.set_sessions(sessions.state.borrow_and_update().clone());
                None
            },
            Some(live) = sessions.live_sessions.recv() => app.on_new_live_session(&live),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => None,
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        };

        match command {
            Some(AppCommand::Refetch) => activity.refetch(),
            Some(AppCommand::QueryChanged(query)) => activity.set_query(query),
            None => {},
        }
    }

    Ok(())
}
