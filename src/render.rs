// Display rendering for relation values

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::api_types::ExternalImageEntry;
use crate::config::markup;
use crate::relation_tags::{classify, split_shared_id, TagConfig, TagRole};

/// What a single relation value turns into on a show page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedRelation {
    /// Not a relation tag, shown as is
    Unchanged(String),
    /// Companion value (thumb or linkto) shown through its full value
    Placeholder,
    /// Thumbnail linking out to the full image
    LinkedThumbnail {
        full: String,
        thumb: String,
        width: u32,
    },
    /// Full image without a thumbnail
    PlainLink { full: String },
}

impl RenderedRelation {
    pub fn to_html(&self) -> String {
        match self {
            RenderedRelation::Unchanged(text) => text.clone(),
            RenderedRelation::Placeholder => markup::EMPTY_PLACEHOLDER.to_string(),
            RenderedRelation::LinkedThumbnail { full, thumb, width } => format!(
                "<div class=\"{}\"><a href=\"{}\" target=\"_blank\"><img src=\"{}\" height=\"{}\"></a></div>",
                markup::ITEM_RELATION_CLASS,
                encode_double_quoted_attribute(&link_with_buttons(full)),
                encode_double_quoted_attribute(thumb),
                width
            ),
            RenderedRelation::PlainLink { full } => format!(
                "<a href=\"{}\" target=\"_blank\">{}</a>",
                encode_double_quoted_attribute(full),
                encode_text(full)
            ),
        }
    }

    /// Whether anything besides an inline image ends up on the page
    pub fn shows_text(&self) -> bool {
        match self {
            RenderedRelation::Unchanged(text) => !text.trim().is_empty() && !text.contains("<img"),
            RenderedRelation::Placeholder => false,
            RenderedRelation::LinkedThumbnail { .. } => false,
            RenderedRelation::PlainLink { .. } => true,
        }
    }
}

/// Append the viewer buttons parameter to a full image link
pub fn link_with_buttons(full: &str) -> String {
    let separator = if full.contains('?') { '&' } else { '?' };
    format!("{full}{separator}{}", markup::BUTTONS_PARAM)
}

/// Render one relation value against all relation values of its item.
///
/// `siblings` may include `value` itself; identical values are skipped when
/// looking for the thumbnail.
pub fn render_display(
    value: &str,
    siblings: &[String],
    config: &TagConfig,
    width: u32,
) -> RenderedRelation {
    match classify(value, config) {
        None => return RenderedRelation::Unchanged(value.to_string()),
        Some(TagRole::Thumb) | Some(TagRole::LinkTo) => return RenderedRelation::Placeholder,
        Some(TagRole::Full) => {}
    }

    let rest = config.full.strip(value).unwrap_or_default();
    let (full_id, full) = split_shared_id(rest);

    match find_thumbnail(value, full_id.as_deref(), siblings, config) {
        Some(thumb) => RenderedRelation::LinkedThumbnail { full, thumb, width },
        None => RenderedRelation::PlainLink { full },
    }
}

// Without an id on the full value the first thumbnail sibling wins, even when
// an item carries several untagged pairs.
fn find_thumbnail(
    value: &str,
    full_id: Option<&str>,
    siblings: &[String],
    config: &TagConfig,
) -> Option<String> {
    siblings
        .iter()
        .filter(|sibling| sibling.as_str() != value)
        .filter_map(|sibling| config.thumb.strip(sibling))
        .find_map(|rest| {
            let (thumb_id, thumb) = split_shared_id(rest);
            let id_matches = match full_id {
                Some(id) => thumb_id.as_deref() == Some(id),
                None => true,
            };
            (id_matches && !thumb.is_empty()).then_some(thumb)
        })
}

/// True when the Relation field would show nothing but images.
pub fn should_hide_relations(values: &[String], config: &TagConfig) -> bool {
    values.iter().all(|value| {
        // Width does not affect visibility
        value.trim().is_empty() || !render_display(value, values, config, 0).shows_text()
    })
}

/// Embedded image block for an item page, `None` when no entry has a thumbnail
pub fn render_item_images(entries: &[ExternalImageEntry], width: u32) -> Option<String> {
    let mut shown = entries
        .iter()
        .filter(|entry| !entry.thumbnail_uri.trim().is_empty())
        .peekable();
    shown.peek()?;

    let mut html = format!("<div class=\"{}\">", markup::EXTERNAL_IMAGES_CLASS);
    for entry in shown {
        html.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\"><img src=\"{}\" width=\"{}\"></a>",
            encode_double_quoted_attribute(&entry.linkto_uri),
            encode_double_quoted_attribute(&entry.thumbnail_uri),
            width
        ));
    }
    html.push_str("</div>");
    Some(html)
}
