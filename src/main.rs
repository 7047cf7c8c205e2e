mod cli;

use closet::context::AppContext;
use closet_core::config::Config;
use closet_core::{Clothing, ClothingId, ClothingRecord, ImageData, Style, StyleId};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, StyleCommands};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "closet=trace,closet_core=debug,closet_db=debug".to_string()
        } else {
            "closet=info,closet_core=info,closet_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli.command, cli.config))
}

fn open_context(config_path: Option<&Path>) -> Result<AppContext> {
    let config = Config::load_or_default(config_path);
    AppContext::open(&config).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })
}

async fn run(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Validate { config } => validate_config(config.or(config_path).as_deref()),
        Commands::Add {
            image,
            category,
            name,
        } => {
            let ctx = open_context(config_path.as_deref())?;
            add_clothing(&ctx, &image, category, name).await
        }
        Commands::List { json } => {
            let ctx = open_context(config_path.as_deref())?;
            list_clothing(&ctx, json).await
        }
        Commands::Remove { id } => {
            let id: ClothingId = id.parse().context("Invalid clothing id")?;
            let ctx = open_context(config_path.as_deref())?;
            if !ctx.clothing.remove_by_id(id).await? {
                anyhow::bail!("No clothing with id {id}");
            }
            println!("Removed clothing {id}");
            Ok(())
        }
        Commands::Clear => {
            let ctx = open_context(config_path.as_deref())?;
            let styles = ctx.styles.remove_all().await?;
            let clothing = ctx.clothing.remove_all().await?;
            println!("Removed {clothing} clothing item(s) and {styles} style(s)");
            Ok(())
        }
        Commands::Style { command } => {
            let ctx = open_context(config_path.as_deref())?;
            match command {
                StyleCommands::Create { name, clothing } => {
                    create_style(&ctx, name, &clothing).await
                }
                StyleCommands::List { json } => list_styles(&ctx, json).await,
                StyleCommands::Remove { id } => {
                    let id: StyleId = id.parse().context("Invalid style id")?;
                    if !ctx.styles.remove_by_id(id).await? {
                        anyhow::bail!("No style with id {id}");
                    }
                    println!("Removed style {id}");
                    Ok(())
                }
            }
        }
    }
}

async fn add_clothing(
    ctx: &AppContext,
    image: &Path,
    category: closet_core::Category,
    name: String,
) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image {}", image.display()))?;
    let clothing = Clothing::new(category, name, ImageData::from(bytes));
    ctx.clothing.save(&clothing).await?;
    println!("{}", clothing.id);
    Ok(())
}

/// Listing row: the stored record plus the size of its resolved image.
#[derive(Serialize)]
struct ClothingView {
    #[serde(flatten)]
    record: ClothingRecord,
    image_bytes: Option<u64>,
}

impl From<&Clothing> for ClothingView {
    fn from(c: &Clothing) -> Self {
        Self {
            record: c.to_record(),
            image_bytes: c.image.image().map(ImageData::size_bytes),
        }
    }
}

fn image_label(bytes: Option<u64>) -> String {
    match bytes {
        Some(n) => format!("{n} bytes"),
        None => "image missing".to_string(),
    }
}

async fn list_clothing(ctx: &AppContext, json: bool) -> Result<()> {
    let items = ctx.clothing.fetch_all().await?;
    let views: Vec<ClothingView> = items.iter().map(ClothingView::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No clothing items");
    }
    for v in &views {
        println!(
            "{}  {:<9}  {}  ({})",
            v.record.id,
            v.record.category,
            v.record.name,
            image_label(v.image_bytes)
        );
    }
    Ok(())
}

async fn create_style(ctx: &AppContext, name: String, clothing_ids: &[String]) -> Result<()> {
    let mut style = Style::new(name);
    for raw in clothing_ids {
        let id: ClothingId = raw
            .parse()
            .with_context(|| format!("Invalid clothing id: {raw}"))?;
        let clothing = ctx
            .clothing
            .fetch(id)
            .await?
            .with_context(|| format!("No clothing with id {id}"))?;
        if let Some(previous) = style.put(clothing) {
            tracing::warn!(
                category = %previous.category,
                "{} replaces {} in the same slot",
                id,
                previous.id
            );
        }
    }
    ctx.styles.save(&style).await?;
    println!("{}", style.id);
    Ok(())
}

#[derive(Serialize)]
struct StyleView {
    id: StyleId,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    slots: Vec<ClothingView>,
}

async fn list_styles(ctx: &AppContext, json: bool) -> Result<()> {
    let styles = ctx.styles.fetch_all().await?;
    let views: Vec<StyleView> = styles
        .iter()
        .map(|s| StyleView {
            id: s.id,
            name: s.name.clone(),
            created_at: s.created_at,
            slots: s.slots().values().map(ClothingView::from).collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No styles");
    }
    for v in &views {
        println!("{}  {}", v.id, v.name);
        for slot in &v.slots {
            println!(
                "    {:<9}  {}  ({})",
                slot.record.category,
                slot.record.name,
                image_label(slot.image_bytes)
            );
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Database: {}", config.database.path.display());
    println!("  Image storage: {}", config.images.storage_dir.display());
    println!(
        "  Cache: {} images, {} bytes",
        config.cache.max_count, config.cache.max_total_bytes
    );
    println!("  Hydration policy: {:?}", config.hydration.policy);

    for warning in config.validate() {
        println!("  warning: {warning}");
    }
    Ok(())
}
