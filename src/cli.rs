use clap::{Parser, Subcommand};
use closet_core::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "closet")]
#[command(author, version, about = "Wardrobe catalogue with cached clothing images")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a clothing item from an image file
    Add {
        /// Image file (PNG, JPEG, ...)
        #[arg(required = true)]
        image: PathBuf,

        /// Category: top, bottom, outer, shoes, bag or accessory
        #[arg(long)]
        category: Category,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// List clothing items
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a clothing item and its image
    Remove {
        /// Clothing id
        id: String,
    },

    /// Remove every clothing item, style and stored image
    Clear,

    /// Manage styles
    Style {
        #[command(subcommand)]
        command: StyleCommands,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum StyleCommands {
    /// Create a style from existing clothing items
    Create {
        /// Style name
        #[arg(long)]
        name: String,

        /// Clothing ids, at most one per category
        #[arg(required = true)]
        clothing: Vec<String>,
    },

    /// List styles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a style (its clothing is kept)
    Remove {
        /// Style id
        id: String,
    },
}
