use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator CLI driving the plugin hooks against a local database
#[derive(Parser)]
#[command(name = "digital-object-linker")]
#[command(about = "Render and mirror digital object links from Relation metadata", long_about = None)]
pub struct Cli {
    /// SQLite database file (defaults to the user data directory)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the side table and write default options
    Install,
    /// Remove all options and drop the side table
    Uninstall,
    /// Deactivate without touching stored data
    Deactivate,
    /// Save configuration, as submitted from the admin form
    Configure {
        #[arg(long)]
        thumb_tag: Option<String>,
        #[arg(long)]
        full_image_tag: Option<String>,
        #[arg(long)]
        linkto_tag: Option<String>,
        #[arg(long)]
        embed_admin: bool,
        #[arg(long)]
        embed_public: bool,
        #[arg(long)]
        width_admin: String,
        #[arg(long)]
        width_public: String,
        #[arg(long)]
        items_width: Option<String>,
    },
    /// Print the configuration form
    ConfigForm,
    /// Print the current settings as JSON
    Settings,
    /// Store an item's Relation values and mirror them into the side table
    SaveItem {
        item_id: i64,
        /// Relation values, one argument each
        values: Vec<String>,
    },
    /// Delete an item's Relation values and side-table rows
    DeleteItem { item_id: i64 },
    /// Render an item's Relation values
    Render {
        item_id: i64,
        /// Render for the admin theme
        #[arg(long)]
        admin: bool,
    },
    /// Print the stored external images of an item
    Images {
        item_id: i64,
        /// Render for the admin theme
        #[arg(long)]
        admin: bool,
    },
    /// Probe the pixel size of an image URI or path
    Probe { uri: String },
}
