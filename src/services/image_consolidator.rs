use log::debug;

use crate::api_types::ExternalImageEntry;
use crate::relation_tags::{parse_relation, TagConfig, TagRole};
use crate::services::image_probe::ImageProbe;

/// Relation payloads merged under one shared id, before probing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGroup {
    pub shared_id: Option<String>,
    pub full: Option<String>,
    pub thumb: Option<String>,
    pub linkto: Option<String>,
}

impl RelationGroup {
    fn slot(&mut self, role: TagRole) -> &mut Option<String> {
        match role {
            TagRole::Full => &mut self.full,
            TagRole::Thumb => &mut self.thumb,
            TagRole::LinkTo => &mut self.linkto,
        }
    }
}

/// Group tagged relation values by shared id.
///
/// Groups keep the order in which their id first appears. Values without an
/// id each form their own group. Within a group the first payload per role
/// wins.
pub fn group_relations(values: &[String], config: &TagConfig) -> Vec<RelationGroup> {
    let mut groups: Vec<RelationGroup> = Vec::new();

    for value in values {
        let Some(parsed) = parse_relation(value, config) else {
            continue;
        };

        let existing = parsed.shared_id.as_ref().and_then(|id| {
            groups
                .iter()
                .position(|group| group.shared_id.as_ref() == Some(id))
        });
        let index = match existing {
            Some(index) => index,
            None => {
                groups.push(RelationGroup {
                    shared_id: parsed.shared_id.clone(),
                    ..RelationGroup::default()
                });
                groups.len() - 1
            }
        };

        let slot = groups[index].slot(parsed.role);
        if slot.is_none() {
            *slot = Some(parsed.payload);
        }
    }

    groups
}

/// Turns an item's relation values into side-table rows
pub struct ImageConsolidator<'p, P: ImageProbe + ?Sized> {
    probe: &'p P,
}

impl<'p, P: ImageProbe + ?Sized> ImageConsolidator<'p, P> {
    pub fn new(probe: &'p P) -> Self {
        Self { probe }
    }

    /// Consolidate relation values into the exact rows to persist for `item_id`.
    pub async fn consolidate(
        &self,
        item_id: i64,
        values: &[String],
        config: &TagConfig,
    ) -> Vec<ExternalImageEntry> {
        let mut entries = Vec::new();
        for group in group_relations(values, config) {
            entries.push(self.resolve(item_id, group).await);
        }
        entries
    }

    async fn resolve(&self, item_id: i64, group: RelationGroup) -> ExternalImageEntry {
        let full = group.full.unwrap_or_default();
        let linkto = group.linkto.unwrap_or_else(|| full.clone());

        let probed = match group.thumb.as_deref() {
            Some(thumb) if !thumb.is_empty() => match self.probe.probe(thumb).await {
                Ok(dimensions) => Some((thumb.to_string(), dimensions)),
                Err(e) => {
                    debug!("Thumbnail {thumb} could not be probed: {e}");
                    None
                }
            },
            _ => None,
        };

        match probed {
            Some((thumb, dimensions)) => ExternalImageEntry {
                id: None,
                item_id,
                thumbnail_uri: thumb,
                full_uri: full,
                linkto_uri: linkto,
                width: dimensions.width,
                height: dimensions.height,
            },
            None => {
                // Fall back to the full image; keep a lone thumbnail rather than lose it
                let thumbnail_uri = if full.is_empty() {
                    group.thumb.unwrap_or_default()
                } else {
                    full.clone()
                };
                ExternalImageEntry {
                    id: None,
                    item_id,
                    thumbnail_uri,
                    full_uri: full,
                    linkto_uri: linkto,
                    width: 0,
                    height: 0,
                }
            }
        }
    }
}
