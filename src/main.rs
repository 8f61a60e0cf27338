use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chatvox::config::Config;
use chatvox::console::{self, ConsoleInput};
use chatvox::controller::{TurnController, TurnOutcome};
use chatvox::personality::Personality;
use chatvox::voice;

#[derive(Parser)]
#[command(name = "chatvox")]
#[command(about = "Voice-driven chat with switchable AI personalities")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// List the built-in personalities
    Personalities,
    /// List the supported recognition languages
    Languages,
    /// List the built-in speech voices
    Voices,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatvox=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| dirs::config_dir().map(|d| d.join("chatvox/config.toml")))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    match cli.command {
        Some(Commands::Chat) | None => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let mut config = Config::load(&config_path).await?;
                config.apply_env();
                info!("Starting chat session");
                run_chat(config).await
            })?;
        }
        Some(Commands::Personalities) => list_personalities(),
        Some(Commands::Languages) => {
            for (label, tag) in voice::LANGUAGES {
                println!("{:<8} {}", tag, label);
            }
        }
        Some(Commands::Voices) => {
            for (id, label) in voice::VOICES {
                println!("{:<20} {}", id, label);
            }
        }
    }

    Ok(())
}

fn list_personalities() {
    for personality in Personality::ALL {
        let profile = personality.profile();
        println!(
            "{} {} ({})\n   {}",
            profile.icon,
            personality.name(),
            profile.display_name,
            profile.description
        );
    }
}

async fn run_chat(config: Config) -> Result<()> {
    if config.llm.api_key.is_empty() {
        warn!("No language model API key configured (set GEMINI_API_KEY)");
    }

    let mut controller = TurnController::from_config(&config)?;

    let personality = controller.state().personality();
    println!(
        "{} AI Chatbot - {}",
        personality.icon(),
        personality.display_name()
    );
    println!("Type /help for actions, /quit to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let input = match console::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("[warning] {}", e);
                continue;
            }
        };

        match input {
            ConsoleInput::Message(text) => {
                let outcome = controller.submit_text(&text).await;
                print_outcome(&outcome);
            }
            ConsoleInput::Audio(path) => match read_recording(&path).await {
                Ok(audio) => {
                    let outcome = controller.submit_audio(&audio).await;
                    if outcome.notices.is_empty() && outcome.reply.is_none() {
                        println!("(recording already processed)");
                    }
                    print_outcome(&outcome);
                }
                Err(e) => println!("[error] {:#}", e),
            },
            ConsoleInput::Personality(name) => match Personality::from_name(&name) {
                Some(p) => {
                    let notice = controller.select_personality(p);
                    println!("{}", console::render_notice(&notice));
                }
                None => println!("[warning] Unknown personality '{}'", name),
            },
            ConsoleInput::Custom(description) => {
                let notice = controller.set_custom_personality(&description);
                println!("{}", console::render_notice(&notice));
            }
            ConsoleInput::Language(tag) => {
                println!("{}", console::render_notice(&controller.select_language(&tag)));
            }
            ConsoleInput::Voice(id) => {
                println!("{}", console::render_notice(&controller.select_voice(&id)));
            }
            ConsoleInput::Speed(speed) => {
                println!("{}", console::render_notice(&controller.set_speed(speed)));
            }
            ConsoleInput::Music(enabled) => {
                println!("{}", console::render_notice(&controller.set_music(enabled)));
            }
            ConsoleInput::Clear => {
                println!("{}", console::render_notice(&controller.clear_chat()));
            }
            ConsoleInput::History => {
                let history = controller.state().history();
                if history.is_empty() {
                    println!("No messages yet.");
                }
                for message in history {
                    println!("{}", console::render_message(message));
                }
            }
            ConsoleInput::Status => println!("{}", console::render_status(controller.state())),
            ConsoleInput::Help => println!("{}", console::HELP),
            ConsoleInput::Quit => break,
        }
    }

    controller.shutdown().await;
    println!("Bye!");
    Ok(())
}

async fn read_recording(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read recording: {}", path.display()))
}

fn print_outcome(outcome: &TurnOutcome) {
    for notice in &outcome.notices {
        println!("{}", console::render_notice(notice));
    }
    if let Some(reply) = &outcome.reply {
        println!("\n{}\n", reply);
        if outcome.spoken {
            println!("(speaking)");
        }
    }
}
