//! `eldoria-chat`: talk to one NPC from the terminal.
//!
//! Runs the same scene driver the game uses, with stdin as the follow-up
//! prompt and stdout as the dialogue box.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use eldoria_core::{EldoriaConfig, TargetId};
use eldoria_llm::{ConversationRelay, DialogueTransport, HttpTransport};
use eldoria_scene::{CharacterRegistry, DialogueScene, Presentation, SceneEvent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Talk to an Eldoria NPC. Don't make them angry.
#[derive(Parser)]
#[command(name = "eldoria-chat", version, about)]
struct Cli {
    /// Identity of the NPC to talk to.
    npc: String,

    /// Path to TOML configuration file.
    #[arg(short, long, env = "ELDORIA_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a TOML file of character lore.
    #[arg(long)]
    characters: Option<PathBuf>,

    /// Talk to Ollama directly instead of the dialogue endpoint.
    #[arg(long)]
    relay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EldoriaConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EldoriaConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut characters = match &cli.characters {
        Some(path) => CharacterRegistry::from_file(path)
            .with_context(|| format!("loading characters from {}", path.display()))?,
        None => CharacterRegistry::new(),
    };
    let npc = TargetId::new(cli.npc);
    if characters.lore(&npc).is_none() {
        let lore = format!("You are {}, a resident of Eldoria.", npc.display_name());
        characters.insert(npc.clone(), lore);
    }

    if cli.relay {
        let relay = ConversationRelay::new(&config.relay, &config.stream)
            .context("configuring the Ollama relay")?;
        if let Err(e) = relay.preload().await {
            warn!(error = %e, "model preload failed");
        }
        converse(&config, relay, characters, npc).await
    } else {
        let transport = HttpTransport::new(&config.endpoint);
        info!(url = transport.url(), "using dialogue endpoint");
        converse(&config, transport, characters, npc).await
    }
}

async fn converse<T: DialogueTransport>(
    config: &EldoriaConfig,
    transport: T,
    characters: CharacterRegistry,
    npc: TargetId,
) -> anyhow::Result<()> {
    let terminal = Terminal {
        speaker: npc.display_name(),
    };
    let mut scene = DialogueScene::new(config, transport, characters, terminal);
    let session = scene.session();

    print!("{}: ", npc.display_name());
    scene.handle(SceneEvent::Interact(npc)).await;
    while session.is_active() {
        scene.handle(SceneEvent::Answer).await;
    }
    Ok(())
}

/// Dialogue box on stdout, follow-up prompt on stdin.
struct Terminal {
    speaker: String,
}

impl Presentation for Terminal {
    fn on_text_increment(&mut self, text: &str) {
        print!("{text}");
        io::stdout().flush().ok();
    }

    fn on_hostile_greeting(&mut self, _roster_count: usize, tally: &str) {
        println!("\n\n{tally}");
    }

    fn on_transport_error(&mut self, error: &dyn std::error::Error) {
        eprintln!("\n[{} is not answering: {error}]", self.speaker);
    }

    fn request_follow_up_text(&mut self) -> Option<String> {
        print!("\n\n> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = line.trim_end();
                if !line.trim().is_empty() {
                    print!("{}: ", self.speaker);
                    io::stdout().flush().ok();
                }
                Some(line.to_owned())
            }
        }
    }

    fn disable_controls(&mut self) {}

    fn enable_controls(&mut self) {}

    fn on_dialogue_closed(&mut self) {
        println!();
    }
}
