//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use primer_core::attention::{
    AttentionMap, AttentionWeightGenerator, HeadSummary, summarize_heads, validate_arguments,
};
use primer_core::config::{PrimerConfig, load_config};
use primer_core::content::{ContentStore, MemoryStore, QuizQuestion, Section};
use primer_core::gateway::{AttentionResponse, GatewayServer, run_gateway};
use std::fmt::Write as _;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => handle_serve(host, port, workspace).await,
        Commands::Attention {
            sentence,
            heads,
            temperature,
            seed,
            no_split_punctuation,
            json,
        } => {
            let config = load(workspace)?;
            let options = AttentionOptions {
                heads: heads.unwrap_or(config.playground.default_heads),
                temperature: temperature.unwrap_or(config.playground.default_temperature),
                seed: seed.or(config.playground.seed),
                split_punctuation: !no_split_punctuation && config.playground.split_punctuation,
            };
            handle_attention(&sentence, &options, &config, json)
        }
        Commands::Tokenize {
            sentence,
            no_split_punctuation,
        } => {
            let config = load(workspace)?;
            let tokens = tokenize_sentence(&sentence, no_split_punctuation, &config);
            println!("{}", format_tokens(&tokens));
            Ok(())
        }
        Commands::Sections => {
            print!("{}", format_sections(&MemoryStore::new().all_sections()));
            Ok(())
        }
        Commands::Quiz => {
            print!("{}", format_quiz(&MemoryStore::new().quiz_questions()));
            Ok(())
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load(workspace: &Path) -> anyhow::Result<PrimerConfig> {
    load_config(Some(workspace), None).map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    workspace: &Path,
) -> anyhow::Result<()> {
    let mut config = load(workspace)?;
    if !primer_core::config::config_exists(Some(workspace)) {
        tracing::info!("No configuration file found, using defaults (see `primer config init`)");
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let gateway = GatewayServer::new(config).into_shared();
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
        }
        signal.cancel();
    });

    run_gateway(gateway, shutdown).await?;
    Ok(())
}

/// Resolved parameters for one attention run.
#[derive(Debug, Clone, PartialEq)]
struct AttentionOptions {
    heads: usize,
    temperature: f64,
    seed: Option<u64>,
    split_punctuation: bool,
}

fn handle_attention(
    sentence: &str,
    options: &AttentionOptions,
    config: &PrimerConfig,
    json: bool,
) -> anyhow::Result<()> {
    validate_arguments(options.heads, options.temperature)?;
    config
        .playground
        .check_bounds(options.heads, options.temperature)?;

    let map = AttentionWeightGenerator::from_seed(options.seed)
        .split_punctuation(options.split_punctuation)
        .max_tokens(Some(config.playground.max_tokens))
        .generate(sentence, options.heads, options.temperature)?;
    let summaries = summarize_heads(&map);

    if json {
        let response = AttentionResponse {
            tokens: map.tokens,
            weights: map.weights,
            heads: summaries,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_attention(&map, &summaries)?);
    }
    Ok(())
}

/// `--no-split-punctuation` can only turn splitting off; the config decides otherwise.
fn tokenize_sentence(
    sentence: &str,
    no_split_punctuation: bool,
    config: &PrimerConfig,
) -> Vec<String> {
    let split = !no_split_punctuation && config.playground.split_punctuation;
    primer_core::tokenize(sentence, split)
}

fn format_tokens(tokens: &[String]) -> String {
    if tokens.is_empty() {
        return "(no tokens)".to_string();
    }
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}:{}", i, t))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Token list, one heatmap per head, then heads ranked by focus.
fn render_attention(map: &AttentionMap, summaries: &[HeadSummary]) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Tokens: {}", format_tokens(&map.tokens))?;
    for head in 0..map.head_count() {
        let pattern = primer_core::HeadPattern::for_head(head);
        writeln!(out)?;
        writeln!(out, "Head {} ({}): {}", head, pattern, pattern.description())?;
        out.push_str(&map.render_heatmap(head)?);
    }
    if !map.is_empty() {
        writeln!(out)?;
        writeln!(out, "Heads by focus:")?;
        for summary in summaries {
            writeln!(
                out,
                "  head {:>2}  {:<17} focus {:.3}",
                summary.head,
                summary.pattern.to_string(),
                summary.focus
            )?;
        }
    }
    Ok(out)
}

fn format_sections(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| format!("{:>2}. {:<14} {}\n", s.order, s.slug, s.title))
        .collect()
}

fn format_quiz(questions: &[QuizQuestion]) -> String {
    let mut out = String::new();
    for q in questions {
        out.push_str(&format!("Q{}. {}\n", q.id, q.question));
        for option in &q.options {
            out.push_str(&format!("   {}) {}\n", option.id, option.text));
        }
        out.push('\n');
    }
    out
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = primer_core::config::init_workspace_config(workspace, force)?;
            println!("Created default configuration at: {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace)?;
            println!("{}", toml::to_string_pretty(&config)?);
            for warning in config.validate() {
                eprintln!("warning: {}", warning);
            }
            Ok(())
        }
    }
}
