//! Command-line entrypoint.
//!
//! Loads configuration, assembles the services once, and runs one command.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use proof_of_art::core::{ContentHash, CreatorAddress};
use proof_of_art::{Config, GenerationRequest, PublishOptions, Services};
use serde_json::json;

/// Proof of Art: provenance for AI-generated artwork.
#[derive(Parser, Debug)]
#[command(name = "proof-of-art", version, about)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when missing.
    #[arg(long, global = true, default_value = "proof-of-art.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the content hash of a file.
    Hash { file: PathBuf },

    /// List generation models and whether each is configured.
    Models,

    /// List local artwork records, newest first.
    Records {
        #[arg(long)]
        creator: Option<String>,
    },

    /// Check a hash (or a file) against the registry and local records.
    Verify {
        #[arg(required_unless_present = "file")]
        hash: Option<String>,

        #[arg(long, conflicts_with = "hash")]
        file: Option<PathBuf>,
    },

    /// Generate an artwork, optionally pinning and recording it.
    Generate {
        #[arg(long)]
        prompt: String,

        #[arg(long)]
        model: String,

        /// Wallet address of the creator.
        #[arg(long)]
        creator: String,

        /// Pin the content and proof package and save the record.
        #[arg(long)]
        publish: bool,

        /// Seal the prompt in the proof package.
        #[arg(long)]
        encrypt_prompt: bool,

        /// Leave the prompt text out of the proof package.
        #[arg(long)]
        private: bool,

        /// Write the generated bytes to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(Some(&cli.config))
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::Hash { file } = &cli.command {
        let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        println!("{}", ContentHash::compute(&bytes));
        return Ok(());
    }

    let services = Services::from_config(&config)?;

    match cli.command {
        Command::Hash { .. } => {}
        Command::Models => {
            for model in services.models().await {
                let mark = if model.available { "+" } else { "-" };
                println!("{mark} {:<60} {} ({})", model.id, model.name, model.provider);
            }
        }
        Command::Records { creator } => {
            let records = services.catalog.list(creator.as_deref()).await?;
            print_json(&records)?;
        }
        Command::Verify { hash, file } => {
            let report = match (hash, file) {
                (Some(hash), _) => services.verification.verify(&hash).await?,
                (None, Some(file)) => {
                    let bytes = std::fs::read(&file)
                        .with_context(|| format!("reading {}", file.display()))?;
                    services.verification.verify_bytes(&bytes).await?
                }
                (None, None) => bail!("a hash or --file is required"),
            };
            print_json(&report)?;
        }
        Command::Generate {
            prompt,
            model,
            creator,
            publish,
            encrypt_prompt,
            private,
            output,
        } => {
            let creator = CreatorAddress::parse(&creator)?;
            let artwork = services
                .orchestrator
                .generate(GenerationRequest {
                    creator: Some(creator),
                    prompt,
                    model,
                    parameters: Default::default(),
                })
                .await?;

            if let Some(path) = &output {
                std::fs::write(path, &artwork.bytes)
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            let mut summary = json!({
                "contentHash": artwork.content_hash,
                "promptHash": artwork.prompt_hash,
                "model": &artwork.model,
                "metadata": &artwork.metadata,
                "ipfsReady": artwork.ipfs_ready,
                "timing": {
                    "total": artwork.timing.total_ms,
                    "aiGeneration": artwork.timing.generation_ms,
                },
            });

            if publish {
                let published = services
                    .orchestrator
                    .publish(artwork.publish_request(PublishOptions {
                        encrypt_prompt,
                        private_prompt: private,
                        ..PublishOptions::default()
                    }))
                    .await?;
                summary["ipfsReady"] = json!(true);
                summary["ipfsCID"] = json!(published.pin.cid);
                summary["ipfsUrl"] = json!(published.pin.url);
                summary["metadataURI"] = json!(published.metadata_uri);
                summary["proofPackage"] = published.package.to_json();
                summary["warnings"] = json!(published
                    .warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>());
            }

            print_json(&summary)?;
        }
    }

    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
