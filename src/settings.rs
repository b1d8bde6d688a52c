// Plugin settings: typed view over the option store

use html_escape::encode_double_quoted_attribute;
use log::{info, warn};
use serde::Serialize;

use crate::api_types::{ConfigForm, DisplayContext};
use crate::config::{defaults, messages, options};
use crate::errors::{AppError, AppResult};
use crate::relation_tags::TagConfig;
use crate::repositories::OptionRepository;
use crate::tag_validator::validate_tag;

/// Settings threaded explicitly into parsing and rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSettings {
    pub tags: TagConfig,
    pub embed_admin: bool,
    pub embed_public: bool,
    pub width_admin: u32,
    pub width_public: u32,
    pub items_width: u32,
}

impl PluginSettings {
    pub fn defaults() -> AppResult<Self> {
        Ok(Self {
            tags: TagConfig::new(
                defaults::FULL_IMAGE_TAG,
                defaults::THUMB_TAG,
                defaults::LINKTO_TAG,
            )?,
            embed_admin: false,
            embed_public: false,
            width_admin: defaults::THUMB_WIDTH,
            width_public: defaults::THUMB_WIDTH,
            items_width: defaults::ITEMS_WIDTH,
        })
    }

    /// Load settings, using defaults for anything missing or unreadable
    pub fn load(store: &dyn OptionRepository) -> AppResult<Self> {
        let full = load_text(store, options::FULL_IMAGE_TAG, defaults::FULL_IMAGE_TAG)?;
        let thumb = load_text(store, options::THUMB_TAG, defaults::THUMB_TAG)?;
        let linkto = load_text(store, options::LINKTO_TAG, defaults::LINKTO_TAG)?;

        Ok(Self {
            tags: TagConfig::new(&full, &thumb, &linkto)?,
            embed_admin: load_flag(store, options::EMBED_ADMIN)?,
            embed_public: load_flag(store, options::EMBED_PUBLIC)?,
            width_admin: load_width(store, options::WIDTH_ADMIN, defaults::THUMB_WIDTH)?,
            width_public: load_width(store, options::WIDTH_PUBLIC, defaults::THUMB_WIDTH)?,
            items_width: load_width(store, options::ITEMS_WIDTH, defaults::ITEMS_WIDTH)?,
        })
    }

    /// Write every option, overwriting what is stored
    pub fn save(&self, store: &dyn OptionRepository) -> AppResult<()> {
        store.set(options::FULL_IMAGE_TAG, self.tags.full.prefix())?;
        store.set(options::THUMB_TAG, self.tags.thumb.prefix())?;
        store.set(options::LINKTO_TAG, self.tags.linkto.prefix())?;
        store.set(options::EMBED_ADMIN, flag_value(self.embed_admin))?;
        store.set(options::EMBED_PUBLIC, flag_value(self.embed_public))?;
        store.set(options::WIDTH_ADMIN, &self.width_admin.to_string())?;
        store.set(options::WIDTH_PUBLIC, &self.width_public.to_string())?;
        store.set(options::ITEMS_WIDTH, &self.items_width.to_string())?;
        Ok(())
    }

    pub fn remove_all(store: &dyn OptionRepository) -> AppResult<()> {
        for name in options::ALL {
            store.delete(name)?;
        }
        Ok(())
    }

    /// Validate a submitted form against these settings and return the result.
    ///
    /// Nothing is changed when any field is invalid. Blank tag fields keep the
    /// current prefix.
    pub fn with_form(&self, form: &ConfigForm) -> AppResult<Self> {
        let width_admin = parse_width(options::WIDTH_ADMIN, &form.width_admin)?;
        let width_public = parse_width(options::WIDTH_PUBLIC, &form.width_public)?;
        let items_width = match form.items_width.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_width(options::ITEMS_WIDTH, raw)?,
            _ => self.items_width,
        };

        let full = submitted_tag(options::FULL_IMAGE_TAG, &form.full_image_tag)?
            .unwrap_or(self.tags.full.prefix());
        let thumb = submitted_tag(options::THUMB_TAG, &form.thumb_tag)?
            .unwrap_or(self.tags.thumb.prefix());
        let linkto = submitted_tag(options::LINKTO_TAG, &form.linkto_tag)?
            .unwrap_or(self.tags.linkto.prefix());

        Ok(Self {
            tags: TagConfig::new(full, thumb, linkto)?,
            embed_admin: form.embed_admin,
            embed_public: form.embed_public,
            width_admin,
            width_public,
            items_width,
        })
    }

    /// Validate and persist a submitted configuration form
    pub fn apply_form(store: &dyn OptionRepository, form: &ConfigForm) -> AppResult<Self> {
        let updated = Self::load(store)?.with_form(form)?;
        updated.save(store)?;
        info!(
            "Saved settings: tags {}/{}/{}, widths {}/{}/{}",
            updated.tags.full.prefix(),
            updated.tags.thumb.prefix(),
            updated.tags.linkto.prefix(),
            updated.width_admin,
            updated.width_public,
            updated.items_width
        );
        Ok(updated)
    }

    pub fn thumbnail_width(&self, context: DisplayContext) -> u32 {
        match context {
            DisplayContext::Admin => self.width_admin,
            DisplayContext::Public => self.width_public,
        }
    }

    pub fn embeds(&self, context: DisplayContext) -> bool {
        match context {
            DisplayContext::Admin => self.embed_admin,
            DisplayContext::Public => self.embed_public,
        }
    }

    /// Administrator form pre-filled with these settings
    pub fn config_form_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<h3>Relation Tags</h3>\n");
        html.push_str(&text_input(
            options::THUMB_TAG,
            "Thumbnail tag indicator (ex thumb:):",
            self.tags.thumb.prefix(),
            None,
        ));
        html.push_str(&text_input(
            options::FULL_IMAGE_TAG,
            "Full image tag indicator (ex full:):",
            self.tags.full.prefix(),
            None,
        ));
        html.push_str(&text_input(
            options::LINKTO_TAG,
            "Link-to tag indicator (ex linkto:):",
            self.tags.linkto.prefix(),
            None,
        ));
        html.push_str("<h3>Admin Interface</h3>\n");
        html.push_str(&checkbox(
            options::EMBED_ADMIN,
            "Embed thumb in admin item show pages?",
            self.embed_admin,
        ));
        html.push_str(&text_input(
            options::WIDTH_ADMIN,
            "Image width, in pixels:",
            &self.width_admin.to_string(),
            Some(5),
        ));
        html.push_str("<h3>Public Theme</h3>\n");
        html.push_str(&checkbox(
            options::EMBED_PUBLIC,
            "Embed thumb in public item show pages?",
            self.embed_public,
        ));
        html.push_str(&text_input(
            options::WIDTH_PUBLIC,
            "Image width, in pixels:",
            &self.width_public.to_string(),
            Some(5),
        ));
        html.push_str("<h3>Items Page</h3>\n");
        html.push_str(&text_input(
            options::ITEMS_WIDTH,
            "Image width, in pixels:",
            &self.items_width.to_string(),
            Some(5),
        ));
        html
    }
}

/// Parse a pixel width submitted as text
pub fn parse_width(field: &str, raw: &str) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::validation(field, messages::WIDTH_NOT_NUMERIC))
}

fn submitted_tag<'f>(field: &str, value: &'f Option<String>) -> AppResult<Option<&'f str>> {
    match value.as_deref().map(str::trim) {
        Some(tag) if !tag.is_empty() => {
            validate_tag(field, tag)?;
            Ok(Some(tag))
        }
        _ => Ok(None),
    }
}

fn load_text(store: &dyn OptionRepository, name: &str, default: &str) -> AppResult<String> {
    Ok(store
        .get(name)?
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string()))
}

fn load_flag(store: &dyn OptionRepository, name: &str) -> AppResult<bool> {
    Ok(matches!(store.get(name)?.as_deref().map(str::trim), Some("1")))
}

fn load_width(store: &dyn OptionRepository, name: &str, default: u32) -> AppResult<u32> {
    match store.get(name)? {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(width) => Ok(width),
            Err(_) => {
                warn!("Option {name} holds non-numeric width {raw:?}, using {default}");
                Ok(default)
            }
        },
    }
}

fn flag_value(flag: bool) -> &'static str {
    if flag {
        "1"
    } else {
        "0"
    }
}

fn text_input(name: &str, label: &str, value: &str, size: Option<u32>) -> String {
    let size_attr = size.map(|s| format!(" size=\"{s}\"")).unwrap_or_default();
    format!(
        "<label for=\"{name}\">{label}</label>\n<p><input type=\"text\" name=\"{name}\" id=\"{name}\" value=\"{}\"{size_attr}></p>\n",
        encode_double_quoted_attribute(value)
    )
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    let checked_attr = if checked { " checked=\"checked\"" } else { "" };
    format!(
        "<label for=\"{name}\">{label}</label>\n<p><input type=\"hidden\" name=\"{name}\" value=\"0\"><input type=\"checkbox\" name=\"{name}\" id=\"{name}\" value=\"1\"{checked_attr}></p>\n"
    )
}
