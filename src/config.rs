// Configuration constants for Digital Object Linker
// This module centralizes option keys, defaults and markup fragments

/// Application configuration constants
pub mod app {
    /// Name of the application data directory
    pub const DATA_DIR_NAME: &str = "DigitalObjectLinker";

    /// Database file name
    pub const DATABASE_FILENAME: &str = "digital_object_linker.db";
}

/// Option store keys owned by the plugin
pub mod options {
    pub const THUMB_TAG: &str = "digitalobjectlinkerplugin_thumb_tag";
    pub const FULL_IMAGE_TAG: &str = "digitalobjectlinkerplugin_full_image_tag";
    pub const LINKTO_TAG: &str = "digitalobjectlinkerplugin_linkto_tag";
    pub const EMBED_ADMIN: &str = "digitalobjectlinkerplugin_embed_admin";
    pub const EMBED_PUBLIC: &str = "digitalobjectlinkerplugin_embed_public";
    pub const WIDTH_ADMIN: &str = "digitalobjectlinkerplugin_width_admin";
    pub const WIDTH_PUBLIC: &str = "digitalobjectlinkerplugin_width_public";
    pub const ITEMS_WIDTH: &str = "digitalobjectlinkerplugin_items_width";

    /// Every key written by install, removed again by uninstall
    pub const ALL: &[&str] = &[
        THUMB_TAG,
        FULL_IMAGE_TAG,
        LINKTO_TAG,
        EMBED_ADMIN,
        EMBED_PUBLIC,
        WIDTH_ADMIN,
        WIDTH_PUBLIC,
        ITEMS_WIDTH,
    ];
}

/// Default values written on install
pub mod defaults {
    /// Relation prefix marking the full image
    pub const FULL_IMAGE_TAG: &str = "full:";

    /// Relation prefix marking the thumbnail
    pub const THUMB_TAG: &str = "thumb:";

    /// Relation prefix marking the link target
    pub const LINKTO_TAG: &str = "linkto:";

    /// Thumbnail size on item detail pages
    pub const THUMB_WIDTH: u32 = 200;

    /// Image size on the items page
    pub const ITEMS_WIDTH: u32 = 400;
}

/// Tag-related configuration constants
pub mod tags {
    /// Maximum allowed length for a relation prefix
    pub const MAX_TAG_LENGTH: usize = 50;
}

/// Host metadata coordinates of the Relation field
pub mod elements {
    pub const DUBLIN_CORE: &str = "Dublin Core";
    pub const RELATION: &str = "Relation";
}

/// Database schema constants
pub mod database {
    /// Side table mirroring parsed image references
    pub const EXTERNAL_IMAGES_TABLE: &str = "external_images";

    /// Host option store
    pub const OPTIONS_TABLE: &str = "options";

    /// Host element texts
    pub const ELEMENT_TEXTS_TABLE: &str = "element_texts";
}

/// Rendered markup fragments
pub mod markup {
    /// Wrapper class around a linked thumbnail
    pub const ITEM_RELATION_CLASS: &str = "item-relation";

    /// Wrapper class around embedded item images
    pub const EXTERNAL_IMAGES_CLASS: &str = "external-images";

    /// Query parameter appended to full image links
    pub const BUTTONS_PARAM: &str = "buttons=Y";

    /// Output for thumbnail values rendered on their own
    pub const EMPTY_PLACEHOLDER: &str = "<div></div>";
}

/// Image probing constants
pub mod probe {
    /// HTTP timeout in seconds
    pub const TIMEOUT_SECS: u64 = 30;

    /// Download attempts before giving up
    pub const MAX_RETRIES: u32 = 3;

    pub const USER_AGENT: &str = "DigitalObjectLinker/0.1";

    /// Bytes read from any image source, enough for the header
    pub const MAX_HEADER_BYTES: u64 = 1024 * 1024;
}

/// User-facing validation messages
pub mod messages {
    pub const WIDTH_NOT_NUMERIC: &str = "The width and height must be numeric.";
}
