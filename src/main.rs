mod app;
mod archetype;
mod config;
mod dialog;
mod forms;
mod id;
mod notice;
mod template;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use archetype::ArchetypeMeta;
use config::AppConfig;
use template::{DirFetcher, TemplateService};

#[derive(Parser, Debug)]
#[command(name = "archet")]
#[command(version = "0.1.0")]
#[command(about = "A terminal editor for openEHR archetype metadata")]
struct Args {
    /// Archetype metadata document to edit
    file: Option<PathBuf>,

    /// Directory containing the templates/ tree
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Print the document as JSON and exit
    #[arg(long)]
    export: bool,

    /// Load every template document and report the outcome
    #[arg(long)]
    check_templates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AppConfig::load().unwrap_or_default();

    let template_root = args
        .templates
        .clone()
        .or_else(|| config.template_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    // Handle CLI-only commands
    if args.check_templates {
        return check_templates(template_root).await;
    }

    let file = args
        .file
        .clone()
        .or_else(|| config.last_file.clone())
        .unwrap_or_else(|| PathBuf::from("archetype.json"));

    if args.export {
        return export_document(&file);
    }

    // Run TUI
    run_tui(config, file, template_root).await
}

fn export_document(file: &PathBuf) -> Result<()> {
    let meta = ArchetypeMeta::load(file)?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

async fn check_templates(template_root: PathBuf) -> Result<()> {
    let service = TemplateService::new(DirFetcher::new(template_root));
    let mut failed = 0;

    for path in app::TEMPLATE_DOCUMENTS {
        match service.load(path, true).await {
            Ok(()) => eprintln!("ok      {}", path),
            Err(template::TemplateError::Fetch(f)) => {
                let reason = notice::request_error_message(f.status, f.body.as_deref())
                    .unwrap_or_else(|| format!("status {}", f.status));
                eprintln!("failed  {} ({})", path, reason);
                failed += 1;
            }
            Err(e) => {
                eprintln!("failed  {} ({})", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} template document(s) failed to load", failed);
    }
    Ok(())
}

async fn run_tui(mut config: AppConfig, file: PathBuf, template_root: PathBuf) -> Result<()> {
    // Remember the document for the next launch
    config.last_file = Some(file.clone());
    let _ = config.save();

    let meta = ArchetypeMeta::load_or_default(&file);
    let templates = TemplateService::new(DirFetcher::new(template_root));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config, file, meta, templates).await;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.overlay.is_none() => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        app.tick();
    }
}
