/// Number of channel slots exposed by the channel-offsets job.
pub const CHANNEL_SLOTS: usize = 4;

/// Suffix appended to the source name of an image produced by channel offsets.
pub const OFFSETS_NAME_SUFFIX: &str = "_offsets";

/// Default container name for the images-from-ROIs job.
pub const DEFAULT_CONTAINER_NAME: &str = "From_ROIs";

/// Channel sampled for every tile of an ROI image stack.
/// Stacks target single-channel (electron microscopy) data.
pub const STACK_CHANNEL: usize = 0;

/// Catalog file at the root of a local store.
pub const CATALOG_FILE: &str = "catalog.toml";

/// Directory (relative to the store root) holding per-image plane files.
pub const PIXELS_DIR: &str = "pixels";
