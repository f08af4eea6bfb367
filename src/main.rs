//! lmswitch CLI
//!
//! Usage:
//!   lmswitch                                 # Assistant mode with refusal fallback
//!   lmswitch --game                          # "The Jeff" Game Master
//!   lmswitch --no-fallback                   # Never switch models
//!   lmswitch --confirm-switch                # Ask before switching
//!   lmswitch --json                          # One JSON outcome per turn

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use lmswitch::config::{EndpointConfig, FallbackConfig, SwitchConfig};
use lmswitch::core::assistant::{ASSISTANT_GREETING, ASSISTANT_PROMPT};
use lmswitch::core::{
    load_players, save_transcript, AssistantTools, GameMaster, LmStudioClient, SwitchConfirm,
    Transcript, TurnController, OPENING_PROMPT,
};
use lmswitch::types::{Conversation, TurnOutcome, TurnPhase};
use lmswitch::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PLAYERS_FILE, DEFAULT_TIMEOUT_SECS,
    FALLBACK_MODEL, GAME_MODEL, MAX_SWITCHES_PER_TURN, MAX_TOOL_ROUNDS, VERSION,
};

#[derive(Parser, Debug)]
#[command(
    name = "lmswitch",
    version = VERSION,
    about = "Chat with a local LLM, switching models when a reply looks like a refusal",
    long_about = "lmswitch talks to an OpenAI-compatible endpoint (LM Studio by default).\n\n\
                  Modes:\n  \
                  (default)  Assistant with URL, clock and directory tools\n  \
                  --game     Game Master for \"The Jeff\"\n\n\
                  Turn phases:\n  \
                  SENT      - Request in flight\n  \
                  SWITCHED  - Refusal detected, moving to the fallback model\n  \
                  REVERTED  - Empty reply, moving back to the primary model\n  \
                  RESENT    - Same message sent again\n  \
                  ACCEPTED  - Reply stored\n  \
                  ABORTED   - Call failed, nothing stored"
)]
struct Args {
    /// Run the Game Master instead of the assistant
    #[arg(short, long)]
    game: bool,

    /// Primary model (default: qwen3-8b, or qwen/qwen3-8b with --game)
    #[arg(short, long, env = "LMSWITCH_MODEL")]
    model: Option<String>,

    /// Fallback model used after a refusal (game mode only switches when this is set)
    #[arg(long, env = "LMSWITCH_FALLBACK_MODEL")]
    fallback_model: Option<String>,

    /// Disable switching and empty-reply recovery
    #[arg(long)]
    no_fallback: bool,

    /// Refusal-triggered switches allowed per turn
    #[arg(long, default_value_t = MAX_SWITCHES_PER_TURN)]
    max_switches: u32,

    /// Cap on empty-reply reverts per turn (default: no cap)
    #[arg(long)]
    max_empty_retries: Option<u32>,

    /// Tool-call rounds resolved per model exchange
    #[arg(long, default_value_t = MAX_TOOL_ROUNDS)]
    max_tool_rounds: u32,

    /// Ask on stdin before switching to the fallback model
    #[arg(long)]
    confirm_switch: bool,

    /// Endpoint base URL
    #[arg(long, env = "LMSWITCH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Bearer token sent to the endpoint
    #[arg(long, env = "LMSWITCH_API_KEY", default_value = DEFAULT_API_KEY)]
    api_key: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Player roster for game mode (created from a template if missing)
    #[arg(long, default_value = DEFAULT_PLAYERS_FILE)]
    players: PathBuf,

    /// Seed for dice rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Save the conversation here as JSON on exit
    #[arg(long)]
    transcript_dir: Option<PathBuf>,

    /// Print each turn outcome as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging and per-turn phase summary
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Assistant mode falls back by default; game mode only on request
    ///
    /// Game mode also re-declares its tools on the call after tool results.
    fn switch_config(&self, default_model: &str, game: bool) -> SwitchConfig {
        let fallback_model = match &self.fallback_model {
            _ if self.no_fallback => None,
            Some(model) => Some(model.clone()),
            None if !game => Some(FALLBACK_MODEL.to_string()),
            None => None,
        };

        SwitchConfig {
            primary_model: self.model.clone().unwrap_or_else(|| default_model.to_string()),
            fallback: fallback_model.map(|model| FallbackConfig {
                model,
                max_switches_per_turn: self.max_switches,
                max_empty_retries: self.max_empty_retries,
            }),
            max_tool_rounds: self.max_tool_rounds,
            tools_on_followup: game,
        }
    }

    fn controller(&self, config: SwitchConfig) -> TurnController {
        let controller = TurnController::new(config);
        if self.confirm_switch {
            controller.with_confirmation(stdin_confirm())
        } else {
            controller
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let client = LmStudioClient::new(&args.endpoint()).context("failed to build HTTP client")?;
    tracing::info!(url = client.url(), game = args.game, "starting");

    if args.game {
        run_game(&args, &client).await
    } else {
        run_assistant(&args, &client).await
    }
}

/// `RUST_LOG` wins unless `--verbose` asks for debug
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// =============================================================================
// ASSISTANT MODE
// =============================================================================

async fn run_assistant(args: &Args, client: &LmStudioClient) -> anyhow::Result<()> {
    let mut controller = args.controller(args.switch_config(DEFAULT_MODEL, false));
    let mut tools = AssistantTools::new();
    let mut conversation = Conversation::with_system(ASSISTANT_PROMPT);
    let mut outcomes = Vec::new();

    print_header("Assistant", controller.config(), args.json);
    if !args.json {
        println!("{} {}", "Assistant:".bold().green(), ASSISTANT_GREETING);
        println!();
    }

    while let Some(line) = read_input(&format!("{} ", "You:".bold().cyan()))? {
        if is_exit(&line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let outcome = controller.run_turn(client, &mut tools, &mut conversation, &line).await;
        print_outcome(&outcome, "Assistant:", controller.config(), args)?;
        outcomes.push(outcome);
    }

    println!("\nSession ended. Turns: {}", outcomes.len());
    if let Some(dir) = &args.transcript_dir {
        let transcript = Transcript::new("assistant", controller.active_model(), &conversation, outcomes);
        write_transcript(&transcript, dir)?;
    }
    Ok(())
}

// =============================================================================
// GAME MODE
// =============================================================================

async fn run_game(args: &Args, client: &LmStudioClient) -> anyhow::Result<()> {
    let roster = load_players(&args.players)
        .with_context(|| format!("failed to load players from {}", args.players.display()))?;
    if roster.created_template {
        println!(
            "Created {} from the template. Edit it to set up your own players.",
            args.players.display()
        );
    }

    let mut gm = GameMaster::new(roster.players, args.seed);
    let rolls = gm.choose_starting_player().context("cannot start a game")?;

    let mut controller = args.controller(args.switch_config(GAME_MODEL, true));
    let mut conversation = Conversation::with_system(gm.full_prompt());
    let mut outcomes = Vec::new();

    print_header("The Jeff", controller.config(), args.json);
    if !args.json {
        println!("Rolling for the starting player...");
        for (name, roll) in &rolls {
            println!("  {} rolled {}", name, roll);
        }
        println!("{} goes first!\n", gm.current_player().unwrap_or("Nobody").bold());
    }

    // opening narration: the prompt itself is never echoed
    let opening = controller.run_turn(client, &mut gm, &mut conversation, OPENING_PROMPT).await;
    if opening.is_accepted() {
        gm.mark_opening_done();
    }
    finish_game_turn(&mut gm, &opening, controller.config(), args)?;
    outcomes.push(opening);

    loop {
        let speaker = format!("{}:", gm.current_player().unwrap_or("Player"));
        let Some(line) = read_input(&format!("{} ", speaker.bold().cyan()))? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        conversation.set_system(gm.full_prompt());
        let outcome = controller.run_turn(client, &mut gm, &mut conversation, &line).await;
        if outcome.is_accepted() && !gm.opening_done() {
            gm.mark_opening_done();
        }
        finish_game_turn(&mut gm, &outcome, controller.config(), args)?;
        outcomes.push(outcome);
    }

    println!("\nGame over. {}", gm.state_line());
    if let Some(dir) = &args.transcript_dir {
        let transcript = Transcript::new("game", controller.active_model(), &conversation, outcomes)
            .with_counters(gm.counters());
        write_transcript(&transcript, dir)?;
    }
    Ok(())
}

fn finish_game_turn(
    gm: &mut GameMaster,
    outcome: &TurnOutcome,
    config: &SwitchConfig,
    args: &Args,
) -> anyhow::Result<()> {
    print_outcome(outcome, "GM:", config, args)?;
    if let Some(reply) = &outcome.reply {
        if gm.observe_reply(reply) && !args.json {
            println!("{}", "[chaos mode ended]".yellow());
        }
    }
    if !args.json {
        let state = gm.state_line();
        if gm.counters().chaos_mode {
            println!("{} {}\n", state.bold(), "CHAOS MODE".red().bold());
        } else {
            println!("{}\n", state.bold());
        }
    }
    Ok(())
}

// =============================================================================
// CONSOLE HELPERS
// =============================================================================

fn print_header(mode: &str, config: &SwitchConfig, json: bool) {
    if json {
        return;
    }
    println!();
    println!("{}", format!("lmswitch v{} - {}", VERSION, mode).bold());
    match &config.fallback {
        Some(fallback) => println!(
            "Model: {} (fallback: {}, {} switch(es) per turn)",
            config.primary_model, fallback.model, fallback.max_switches_per_turn
        ),
        None => println!("Model: {} (no fallback)", config.primary_model),
    }
    println!("Type 'quit' or 'exit' to leave.");
    println!("{}", "─".repeat(50));
}

fn print_outcome(outcome: &TurnOutcome, speaker: &str, config: &SwitchConfig, args: &Args) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    for notice in outcome.notices() {
        let target = match notice.to {
            TurnPhase::Switched => config.fallback.as_ref().map(|f| f.model.as_str()).unwrap_or("fallback"),
            _ => config.primary_model.as_str(),
        };
        let text = format!("[{}] {}, retrying with {}", notice.to, notice.reason.description(), target);
        println!("{}", text.color(notice.to.color()));
    }

    match (&outcome.reply, &outcome.error) {
        (Some(reply), _) => println!("{} {}", speaker.bold().green(), reply),
        (None, Some(error)) => println!("{} {}", "Error:".bold().red(), error),
        (None, None) => {}
    }

    if args.verbose {
        println!("{}", outcome.to_parseable_string().dimmed());
    }
    Ok(())
}

fn write_transcript(transcript: &Transcript, dir: &Path) -> anyhow::Result<()> {
    let path = save_transcript(transcript, dir)
        .with_context(|| format!("failed to save transcript to {}", dir.display()))?;
    println!("Transcript saved: {}", path.display());
    Ok(())
}

/// Prompt and read one trimmed line; `None` on EOF
fn read_input(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit")
}

fn stdin_confirm() -> SwitchConfirm {
    Box::new(|from: &str, to: &str| {
        let question = format!("Reply from {} looks like a refusal. Switch to {}? [y/N] ", from, to);
        match read_input(&question.yellow().to_string()) {
            Ok(Some(answer)) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    })
}
