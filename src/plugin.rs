// Host-facing entry points: lifecycle hooks, filters and item hooks

use log::{debug, info, warn};

use crate::api_types::{ConfigForm, DisplayContext, RecordRef};
use crate::config::elements::{DUBLIN_CORE, RELATION};
use crate::database::Database;
use crate::display_elements::{ElementKey, ElementsBySet};
use crate::errors::AppResult;
use crate::relation_tags::{classify, TagRole};
use crate::render::{render_display, render_item_images, should_hide_relations};
use crate::repositories::{
    ElementTextRepository, ExternalImageRepository, SqliteElementTextRepository,
    SqliteExternalImageRepository, SqliteOptionRepository,
};
use crate::services::image_consolidator::ImageConsolidator;
use crate::services::image_probe::ImageProbe;
use crate::settings::PluginSettings;

/// The Digital Object Linker plugin bound to one database and image probe.
///
/// Settings are read from the option store at the start of every call and
/// passed down explicitly.
pub struct DigitalObjectLinkerPlugin<'a, P: ImageProbe + ?Sized> {
    db: &'a Database,
    probe: &'a P,
}

impl<'a, P: ImageProbe + ?Sized> DigitalObjectLinkerPlugin<'a, P> {
    pub fn new(db: &'a Database, probe: &'a P) -> Self {
        Self { db, probe }
    }

    fn options(&self) -> SqliteOptionRepository<'a> {
        SqliteOptionRepository::new(self.db.connection())
    }

    fn element_texts(&self) -> SqliteElementTextRepository<'a> {
        SqliteElementTextRepository::new(self.db.connection())
    }

    fn external_images(&self) -> SqliteExternalImageRepository<'a> {
        SqliteExternalImageRepository::new(self.db.connection())
    }

    pub fn settings(&self) -> AppResult<PluginSettings> {
        PluginSettings::load(&self.options())
    }

    pub fn install(&self) -> AppResult<()> {
        self.db.create_plugin_schema()?;
        PluginSettings::defaults()?.save(&self.options())?;
        info!("Digital Object Linker installed");
        Ok(())
    }

    pub fn uninstall(&self) -> AppResult<()> {
        PluginSettings::remove_all(&self.options())?;
        self.db.drop_plugin_schema()?;
        info!("Digital Object Linker uninstalled");
        Ok(())
    }

    /// Stored options and side-table rows are kept for reactivation
    pub fn deactivate(&self) {
        info!("Digital Object Linker deactivated");
    }

    /// Configuration form submission
    pub fn config(&self, form: &ConfigForm) -> AppResult<PluginSettings> {
        PluginSettings::apply_form(&self.options(), form)
    }

    pub fn config_form(&self) -> AppResult<String> {
        Ok(self.settings()?.config_form_html())
    }

    /// Display filter for one Relation value of an item
    pub fn filter_relation_text(
        &self,
        text: &str,
        item_id: i64,
        context: DisplayContext,
    ) -> AppResult<String> {
        let settings = self.settings()?;

        // Siblings only matter for full image values
        let siblings = if classify(text, &settings.tags) == Some(TagRole::Full) {
            self.relation_texts(RecordRef::item(item_id))
                .unwrap_or_else(|e| {
                    warn!("Relation texts for item {item_id} unavailable: {e}");
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        let width = settings.thumbnail_width(context);
        Ok(render_display(text, &siblings, &settings.tags, width).to_html())
    }

    /// Hide the Relation element when it would show nothing but images.
    ///
    /// The item is looked up first, then the collection. When neither lookup
    /// succeeds the element stays visible.
    pub fn filter_display_elements(
        &self,
        mut elements: ElementsBySet,
        item_id: Option<i64>,
        collection_id: Option<i64>,
    ) -> ElementsBySet {
        let key = ElementKey::new(DUBLIN_CORE, RELATION);
        if !elements.contains(&key) {
            return elements;
        }

        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings unavailable, leaving Relation visible: {e}");
                return elements;
            }
        };

        let mut candidates = item_id
            .map(RecordRef::item)
            .into_iter()
            .chain(collection_id.map(RecordRef::collection));
        let texts = candidates.find_map(|record| {
            self.relation_texts(record)
                .map_err(|e| debug!("Relation lookup for {record:?} failed: {e}"))
                .ok()
        });

        match texts {
            Some(texts) if should_hide_relations(&texts, &settings.tags) => {
                elements.remove(&key);
            }
            Some(_) => {}
            None => debug!("No record found for Relation visibility, leaving it visible"),
        }
        elements
    }

    /// Item saved: mirror its relation values into the side table
    pub async fn after_save_item(&self, item_id: i64, relation_texts: &[String]) -> AppResult<usize> {
        let settings = self.settings()?;
        let entries = ImageConsolidator::new(self.probe)
            .consolidate(item_id, relation_texts, &settings.tags)
            .await;

        let inserted = self.external_images().replace_for_item(item_id, &entries)?;
        info!("Stored {inserted} external image(s) for item {item_id}");
        Ok(inserted)
    }

    /// Item about to be deleted: drop its side-table rows
    pub fn before_delete_item(&self, item_id: i64) -> AppResult<usize> {
        let deleted = self.external_images().delete_for_item(item_id)?;
        info!("Removed {deleted} external image(s) for item {item_id}");
        Ok(deleted)
    }

    /// Embedded image block for an item show page, when enabled for `context`
    pub fn item_images(&self, item_id: i64, context: DisplayContext) -> AppResult<Option<String>> {
        let settings = self.settings()?;
        if !settings.embeds(context) {
            return Ok(None);
        }

        let entries = self.external_images().find_by_item(item_id)?;
        Ok(render_item_images(&entries, settings.items_width))
    }

    fn relation_texts(&self, record: RecordRef) -> anyhow::Result<Vec<String>> {
        self.element_texts()
            .find_texts(record, DUBLIN_CORE, RELATION)
    }
}
