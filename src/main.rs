use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod app;
mod config;
mod designer;
mod gemini;
mod handler;
mod media;
mod message;
mod tui;
mod ui;

use app::App;
use config::Config;
use gemini::GeminiClient;

#[derive(Parser)]
#[command(name = "visioneer")]
#[command(about = "Chat con IA para rediseñar tu espacio: sube fotos, pide cambios, guarda el resultado")]
struct Cli {
    /// Fotos del espacio a rediseñar (se pueden agregar más dentro de la app)
    images: Vec<PathBuf>,

    /// Modelo para la síntesis de imagen
    #[arg(long)]
    image_model: Option<String>,

    /// Modelo para la descripción en texto
    #[arg(long)]
    text_model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|_| Config::new());
    if cli.image_model.is_some() {
        config.image_model = cli.image_model.clone();
    }
    if cli.text_model.is_some() {
        config.text_model = cli.text_model.clone();
    }

    // The credential is resolved before any terminal or network work; its
    // absence is fatal.
    let api_key = config.resolve_api_key()?;
    let client = GeminiClient::new(&api_key, config.image_model(), config.text_model());

    // Stage CLI-supplied photos up front; a bad path is a startup error
    // rather than a silent skip.
    let mut staged = Vec::with_capacity(cli.images.len());
    for path in &cli.images {
        staged.push(media::stage_source_image(path)?);
    }

    let mut app = App::new(client, staged);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run(
    app: &mut App,
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }

        // Collect the outstanding generation round-trip, if it settled
        app.poll_pending().await;

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
