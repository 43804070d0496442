use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use dotenvy::dotenv;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod composer;
mod config;
mod handlers;
mod lexicon;
mod llm;
mod presenter;
mod state;
mod utils;

use composer::Composer;
use config::CONFIG;
use lexicon::{DesignLanguage, Energy, Piece};
use presenter::export::ExportOutcome;
use presenter::wizard::Transition;
use presenter::{
    CardExporter, CardRasterizer, CardSource, DirectoryDownloader, HttpCardSource,
    NoSharePlatform, Wizard,
};
use state::AppState;
use utils::logging::init_logging;

type MainResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Extra time the card transport waits beyond the composer's own deadline.
const TRANSPORT_GRACE_SECONDS: u64 = 10;

struct CardArgs {
    energy: Energy,
    design_language: DesignLanguage,
    piece: Piece,
    out_dir: PathBuf,
    server: Option<String>,
}

fn card_usage() -> &'static str {
    "Usage: cargo run -- card --energy <name> --design-language <name> --piece <name> [--out <dir>] [--server <url>]"
}

fn parse_card_args(args: &[String]) -> anyhow::Result<Option<CardArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("card") {
        return Ok(None);
    }

    let mut energy = None;
    let mut design_language = None;
    let mut piece = None;
    let mut out_dir = CONFIG.card_export_dir.clone();
    let mut server = None;

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        if matches!(flag, "--help" | "-h") {
            return Err(anyhow!(card_usage()));
        }
        index += 1;
        let value = args
            .get(index)
            .ok_or_else(|| anyhow!("Missing value for {flag}"))?;
        match flag {
            "--energy" => energy = Some(value.parse::<Energy>()?),
            "--design-language" => design_language = Some(value.parse::<DesignLanguage>()?),
            "--piece" => piece = Some(value.parse::<Piece>()?),
            "--out" => out_dir = PathBuf::from(value),
            "--server" => server = Some(value.clone()),
            other => {
                return Err(anyhow!(
                    "Unknown card argument: {other}\n{}",
                    card_usage()
                ));
            }
        }
        index += 1;
    }

    Ok(Some(CardArgs {
        energy: energy.ok_or_else(|| anyhow!("--energy is required"))?,
        design_language: design_language
            .ok_or_else(|| anyhow!("--design-language is required"))?,
        piece: piece.ok_or_else(|| anyhow!("--piece is required"))?,
        out_dir,
        server,
    }))
}

#[tokio::main]
async fn main() -> MainResult {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    if let Some(card_args) = parse_card_args(&args)? {
        return run_card(card_args).await;
    }
    match args.get(1).map(|value| value.as_str()) {
        None | Some("serve") => serve().await,
        Some(other) => Err(format!("Unknown command: {other}\n{}", card_usage()).into()),
    }
}

fn require_api_key() -> MainResult {
    if CONFIG.gemini_api_key.trim().is_empty() {
        return Err("GEMINI_API_KEY is required unless --server is given".into());
    }
    Ok(())
}

async fn serve() -> MainResult {
    require_api_key()?;

    info!(
        "Lexicon ready: {} energies, {} design languages, {} pieces",
        Energy::ALL.len(),
        DesignLanguage::ALL.len(),
        Piece::ALL.len()
    );
    let state = AppState::new(Composer::from_config(&CONFIG));
    let app = handlers::router(state);

    let listener = TcpListener::bind(&CONFIG.bind_addr).await?;
    info!("Card composer listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Card composer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}

async fn run_card(args: CardArgs) -> MainResult {
    match args.server.clone() {
        Some(server) => {
            let client = Client::builder()
                .timeout(Duration::from_secs(
                    CONFIG.compose_timeout_seconds + TRANSPORT_GRACE_SECONDS,
                ))
                .build()?;
            let source = HttpCardSource::new(client, &server)?;
            info!("Requesting card from {}", source.endpoint());
            make_card(&args, &source).await
        }
        None => {
            require_api_key()?;
            make_card(&args, &Composer::from_config(&CONFIG)).await
        }
    }
}

async fn make_card<S: CardSource>(args: &CardArgs, source: &S) -> MainResult {
    let mut wizard = Wizard::new();
    wizard.start()?;
    let transition = wizard.choose_energy(args.energy)?;
    wizard.settle(transition).await;
    let transition = wizard.choose_design_language(args.design_language)?;
    wizard.settle(transition).await;
    if wizard.choose_piece(args.piece)? != Transition::RevealConfirmation {
        return Err("wizard did not reach confirmation".into());
    }

    let card = wizard.generate(source).await?;
    if !card.result.has_image() {
        warn!("No artwork came back; the card uses the placeholder gradient");
    }
    println!("{}\n", card.title());
    for line in card.note_lines() {
        println!("{line}");
    }

    let exporter = CardExporter::new(
        CardRasterizer,
        NoSharePlatform,
        DirectoryDownloader::new(args.out_dir.clone()),
    );
    match wizard.export(&exporter)? {
        Some(ExportOutcome::Downloaded { filename } | ExportOutcome::Shared { filename }) => {
            println!("\nSaved {}", args.out_dir.join(filename).display());
            Ok(())
        }
        Some(ExportOutcome::Cancelled) => Ok(()),
        None => Err("Could not save the card".into()),
    }
}
