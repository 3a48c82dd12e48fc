use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roster::config::Config;
use roster::services::activities_api_service::HttpActivitiesApi;
use roster::ui::app::{App, AppEvent, Flow};
use roster::ui::commands::{self, ParseError, USAGE};
use roster::ui::render::render_screen;

#[derive(Parser)]
#[command(name = "roster", about = "Sign up for activities from the terminal")]
struct Cli {
    /// Backend base url; overrides ROSTER_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive roster (default).
    Shell,
    /// Load the roster once, print it and exit.
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("roster: {e}");
            std::process::exit(2);
        }
    };
    let api = match HttpActivitiesApi::new(&config) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("roster: {e}");
            std::process::exit(2);
        }
    };
    info!(api_url = %config.api_url, build = env!("ROSTER_BUILD_ID"), "roster_starting");

    let mut app = App::new(Arc::new(api), &config);
    app.load_all();

    match cli.command.unwrap_or(Mode::Shell) {
        Mode::List => {
            app.settle().await;
            draw(&app);
            if app.roster().load_error().is_some() {
                std::process::exit(1);
            }
        }
        Mode::Shell => run_shell(app).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config, roster::error::ConfigError> {
    let config = Config::load()?;
    match cli.api_url.as_deref() {
        Some(url) => config.with_api_url(url),
        None => Ok(config),
    }
}

async fn run_shell(mut app: App) {
    spawn_input_reader(app.sender());
    println!("{USAGE}");

    while let Some(event) = app.next_event().await {
        match app.handle(event) {
            Flow::Redraw => draw(&app),
            Flow::Help => println!("{USAGE}"),
            Flow::Quit => break,
        }
    }
}

fn spawn_input_reader(tx: tokio::sync::mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match commands::parse(&line) {
                    Ok(command) => {
                        if tx.send(AppEvent::Command(command)).is_err() {
                            return;
                        }
                    }
                    Err(ParseError::Empty) => {}
                    Err(e) => println!("{e}\n{USAGE}"),
                },
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "stdin_read_failed");
                    break;
                }
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

fn draw(app: &App) {
    match render_screen(app) {
        Ok(screen) => println!("{screen}"),
        Err(e) => error!(error = %e, "render_failed"),
    }
}
