mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chantier_ai::{Enricher, MatchQuery, decode, find_best_match};
use chantier_core::{CatalogMaterial, JobParameters, Quantity};
use chantier_service::{Orchestrator, RawImage, ServiceLimits, check_images};
use chantier_store::{CatalogStore, JsonFileCatalog};
use chantier_sync::{AnthropicClient, ClientConfig, MailStatusProbe};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "chantier")]
#[command(about = "Renovation cost estimates reconciled against your material library", version)]
struct Cli {
    /// Material catalog (JSON array).
    #[arg(long, global = true, env = "CHANTIER_CATALOG", default_value = "catalog.json")]
    catalog: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = Format::Card)]
    format: Format,

    /// Repeat for more log output.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum Format {
    Card,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate a job from photos, priced against the catalog.
    Estimate {
        /// Photos of the job (JPEG, PNG or WebP).
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Surface in m².
        #[arg(long)]
        surface: f64,
        #[arg(long)]
        job_type: String,
        #[arg(long)]
        materials_description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, env = "CHANTIER_MODEL", default_value = "claude-sonnet-4-5")]
        model: String,
        #[arg(long, env = "CHANTIER_API_URL", default_value = "https://api.anthropic.com")]
        api_url: String,
    },
    /// Decode raw estimator output (file or `-` for stdin).
    Decode { input: PathBuf },
    /// Decode raw estimator output and price it against the catalog.
    Enrich {
        input: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Show the best catalog match for one material name.
    Match {
        name: String,
        #[arg(long, default_value = "1")]
        quantity: String,
        #[arg(long, default_value = "unite")]
        unit: String,
    },
    /// Manage the material catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Check photos against the upload limits without estimating.
    CheckImages {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Ask the mail service whether outbound email is configured.
    MailStatus {
        #[arg(long, env = "CHANTIER_MAIL_URL")]
        mail_url: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    List,
    /// Add a material, or replace the one with the same id.
    Add {
        id: String,
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        unit: String,
    },
    Remove { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
    tracing::info!("chantier v{}", env!("CARGO_PKG_VERSION"));

    let store = JsonFileCatalog::new(&cli.catalog);

    match cli.command {
        Command::Estimate {
            images,
            surface,
            job_type,
            materials_description,
            location,
            deadline,
            api_key,
            model,
            api_url,
        } => {
            let job = JobParameters {
                surface,
                job_type,
                materials_description,
                location,
                deadline,
            };
            let client = AnthropicClient::new(ClientConfig {
                base_url: api_url,
                api_key,
                model,
                ..ClientConfig::default()
            });
            let service = Orchestrator::new(Arc::new(store), Arc::new(client));
            let raw = read_images(&images).await?;

            match service.produce_estimation(raw, job).await {
                Ok(outcome) => match cli.format {
                    Format::Json => print_json(&outcome)?,
                    Format::Card => display::print_outcome_card(&outcome),
                },
                Err(e) => {
                    let notice = e.notice();
                    if cli.format == Format::Json {
                        print_json(&e.body())?;
                    }
                    bail!("{} ({}): {}\n{e}", notice.title, e.status_code(), notice.description);
                }
            }
        }

        Command::Decode { input } => {
            let raw = read_input(&input)?;
            let estimation = decode(&raw)?;
            print_json(&estimation)?;
        }

        Command::Enrich { input, threshold } => {
            let raw = read_input(&input)?;
            let estimation = decode(&raw)?;
            let catalog = store.list().await?;
            let enricher = threshold.map_or_else(Enricher::new, Enricher::with_threshold);
            let enriched = enricher.enrich(estimation, &catalog);
            match cli.format {
                Format::Json => print_json(&enriched)?,
                Format::Card => display::print_estimate_card(&enriched),
            }
        }

        Command::Match {
            name,
            quantity,
            unit,
        } => {
            let catalog = store.list().await?;
            let query = MatchQuery {
                name: &name,
                quantity: quantity_arg(&quantity),
                unit: &unit,
                unit_price: 0.0,
                total_price: 0.0,
            };
            match find_best_match(&query, &catalog) {
                Some(m) => {
                    if cli.format == Format::Json {
                        print_json(&serde_json::json!({
                            "material": m.material,
                            "confidence": m.confidence,
                            "computedPrice": m.computed_price,
                        }))?;
                    } else {
                        println!("{} ({})", m.material.name, m.material.id);
                        println!("  {:<26} {:.3}", "confidence", m.confidence);
                        println!("  {:<26} {:.2} €", "computed price", m.computed_price);
                    }
                }
                None => println!("No catalog match for \"{name}\"."),
            }
        }

        Command::Catalog { command } => match command {
            CatalogCommand::List => {
                let materials = store.list().await?;
                match cli.format {
                    Format::Json => print_json(&materials)?,
                    Format::Card => display::print_catalog(&materials),
                }
            }
            CatalogCommand::Add {
                id,
                name,
                price,
                unit,
            } => {
                store
                    .upsert(CatalogMaterial::new(id.as_str(), name.as_str(), price, unit.as_str()))
                    .await?;
                println!("Saved {id} to {}", store.path().display());
            }
            CatalogCommand::Remove { id } => {
                let removed = store.remove(&id).await?;
                println!("Removed {} ({})", removed.name, removed.id);
            }
        },

        Command::CheckImages { images } => {
            let raw = read_images(&images).await?;
            let check = check_images(raw, &ServiceLimits::default()).await;
            for image in &check.accepted {
                println!("  ok  {} ({})", image.name, image.media_type);
            }
            display::print_rejections(&check.rejected);
            if check.accepted.is_empty() {
                bail!("no valid image");
            }
        }

        Command::MailStatus { mail_url, force } => {
            let probe = MailStatusProbe::new(&mail_url);
            let configured = probe
                .is_configured(force)
                .await
                .with_context(|| format!("querying mail service at {mail_url}"))?;
            println!(
                "Mail service {}",
                if configured { "configured" } else { "not configured" }
            );
        }
    }

    Ok(())
}

async fn read_images(paths: &[PathBuf]) -> anyhow::Result<Vec<RawImage>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let image = RawImage::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        images.push(image);
    }
    Ok(images)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn quantity_arg(raw: &str) -> Quantity {
    raw.trim()
        .parse::<f64>()
        .map(Quantity::Number)
        .unwrap_or_else(|_| Quantity::from(raw))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn quantity_arg_keeps_text() {
        assert_eq!(quantity_arg("4"), Quantity::Number(4.0));
        assert_eq!(quantity_arg("12,5 m²"), Quantity::from("12,5 m²"));
    }

    #[test]
    fn catalog_add_parses() {
        let cli = Cli::try_parse_from([
            "chantier", "--catalog", "/tmp/c.json", "catalog", "add", "m1", "Colle flex",
            "--price", "18.5", "--unit", "sac",
        ])
        .unwrap();
        assert_eq!(cli.catalog, PathBuf::from("/tmp/c.json"));
        match cli.command {
            Command::Catalog {
                command: CatalogCommand::Add { id, price, .. },
            } => {
                assert_eq!(id, "m1");
                assert_eq!(price, 18.5);
            }
            _ => panic!("expected catalog add"),
        }
    }
}
