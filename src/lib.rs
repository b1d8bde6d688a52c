use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

pub mod api_types;
mod cli;
pub mod config;
pub mod database;
pub mod display_elements;
pub mod errors;
pub mod plugin;
pub mod relation_tags;
pub mod render;
pub mod repositories;
pub mod services;
pub mod settings;
pub mod tag_validator;

use crate::api_types::{ConfigForm, DisplayContext, RecordRef};
use crate::cli::{Cli, Commands};
use crate::config::app;
use crate::config::elements::{DUBLIN_CORE, RELATION};
use crate::repositories::{
    ElementTextRepository, ExternalImageRepository, SqliteElementTextRepository,
    SqliteExternalImageRepository,
};
use crate::services::image_probe::{HttpImageProbe, ImageProbe};
pub use database::Database;
pub use errors::{AppError, AppResult};
pub use plugin::DigitalObjectLinkerPlugin;

// Application state for the CLI
pub struct AppState {
    pub db: Database,
    pub probe: HttpImageProbe,
}

impl AppState {
    pub fn new(database: Option<PathBuf>) -> Result<Self> {
        let db_path = match database {
            Some(path) => path,
            None => {
                let app_data_dir = dirs::data_dir()
                    .or_else(dirs::home_dir)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(app::DATA_DIR_NAME);

                if !app_data_dir.exists() {
                    std::fs::create_dir_all(&app_data_dir)?;
                }
                app_data_dir.join(app::DATABASE_FILENAME)
            }
        };

        let db = Database::new(&db_path)
            .with_context(|| format!("failed to open database: {}", db_path.display()))?;
        let probe = HttpImageProbe::new()?;
        info!("Using database {}", db_path.display());

        Ok(AppState { db, probe })
    }

    pub fn plugin(&self) -> DigitalObjectLinkerPlugin<'_, HttpImageProbe> {
        DigitalObjectLinkerPlugin::new(&self.db, &self.probe)
    }
}

fn display_context(admin: bool) -> DisplayContext {
    if admin {
        DisplayContext::Admin
    } else {
        DisplayContext::Public
    }
}

async fn execute(state: &AppState, command: Commands) -> Result<()> {
    let plugin = state.plugin();

    match command {
        Commands::Install => plugin.install()?,
        Commands::Uninstall => plugin.uninstall()?,
        Commands::Deactivate => plugin.deactivate(),
        Commands::Configure {
            thumb_tag,
            full_image_tag,
            linkto_tag,
            embed_admin,
            embed_public,
            width_admin,
            width_public,
            items_width,
        } => {
            let form = ConfigForm {
                thumb_tag,
                full_image_tag,
                linkto_tag,
                embed_admin,
                width_admin,
                embed_public,
                width_public,
                items_width,
            };
            let settings = plugin.config(&form)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::ConfigForm => print!("{}", plugin.config_form()?),
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(&plugin.settings()?)?);
        }
        Commands::SaveItem { item_id, values } => {
            SqliteElementTextRepository::new(state.db.connection()).replace_texts(
                RecordRef::item(item_id),
                DUBLIN_CORE,
                RELATION,
                &values,
            )?;
            let stored = plugin.after_save_item(item_id, &values).await?;
            println!("Stored {stored} external image(s) for item {item_id}");
        }
        Commands::DeleteItem { item_id } => {
            let removed = plugin.before_delete_item(item_id)?;
            SqliteElementTextRepository::new(state.db.connection())
                .delete_record(RecordRef::item(item_id))?;
            println!("Removed {removed} external image(s) for item {item_id}");
        }
        Commands::Render { item_id, admin } => {
            let context = display_context(admin);
            let values = SqliteElementTextRepository::new(state.db.connection()).find_texts(
                RecordRef::item(item_id),
                DUBLIN_CORE,
                RELATION,
            )?;
            for value in &values {
                println!("{}", plugin.filter_relation_text(value, item_id, context)?);
            }
        }
        Commands::Images { item_id, admin } => {
            let entries =
                SqliteExternalImageRepository::new(state.db.connection()).find_by_item(item_id)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            if let Some(html) = plugin.item_images(item_id, display_context(admin))? {
                println!("{html}");
            }
        }
        Commands::Probe { uri } => {
            let dimensions = state.probe.probe(&uri).await.map_err(AppError::from)?;
            println!("{}", serde_json::to_string(&dimensions)?);
        }
    }

    Ok(())
}

pub fn run() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let state = AppState::new(cli.database)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(&state, cli.command)).map_err(|e| {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => error!("{}", app_error.user_message()),
            None => error!("{e:#}"),
        }
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn png_file(width: u32, height: u32) -> NamedTempFile {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes.get_ref()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_save_item_then_images_and_delete() {
        let db_file = NamedTempFile::new().unwrap();
        let state = AppState::new(Some(db_file.path().to_path_buf())).unwrap();
        let thumb = png_file(30, 20);

        execute(&state, Commands::Install).await.unwrap();
        let values = vec![
            "full:a:http://example.org/full.jpg".to_string(),
            format!("thumb:a:{}", thumb.path().display()),
            "See also the printed catalogue".to_string(),
        ];
        execute(&state, Commands::SaveItem { item_id: 5, values: values.clone() })
            .await
            .unwrap();

        let stored = SqliteElementTextRepository::new(state.db.connection())
            .find_texts(RecordRef::item(5), DUBLIN_CORE, RELATION)
            .unwrap();
        assert_eq!(stored, values);

        let entries = SqliteExternalImageRepository::new(state.db.connection())
            .find_by_item(5)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].full_uri, "http://example.org/full.jpg");
        assert_eq!(entries[0].thumbnail_uri, thumb.path().display().to_string());
        assert_eq!((entries[0].width, entries[0].height), (30, 20));

        execute(&state, Commands::Images { item_id: 5, admin: false })
            .await
            .unwrap();
        execute(&state, Commands::Render { item_id: 5, admin: true })
            .await
            .unwrap();

        execute(&state, Commands::DeleteItem { item_id: 5 }).await.unwrap();
        let remaining = SqliteExternalImageRepository::new(state.db.connection())
            .find_by_item(5)
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_configure_rejects_non_numeric_width() {
        let db_file = NamedTempFile::new().unwrap();
        let state = AppState::new(Some(db_file.path().to_path_buf())).unwrap();
        execute(&state, Commands::Install).await.unwrap();

        let result = execute(
            &state,
            Commands::Configure {
                thumb_tag: None,
                full_image_tag: None,
                linkto_tag: None,
                embed_admin: true,
                embed_public: false,
                width_admin: "wide".to_string(),
                width_public: "200".to_string(),
                items_width: None,
            },
        )
        .await;

        let err = result.unwrap_err();
        let app_error = err.downcast_ref::<AppError>().unwrap();
        assert_eq!(app_error.user_message(), "The width and height must be numeric.");
        assert!(!state.plugin().settings().unwrap().embed_admin);
    }
}
