//! Template lookup and the process-wide template asset cache.
//!
//! A template is a directory under the configured templates root:
//!
//! ```text
//! templates/<id>/
//!   template.json     required layout descriptor
//!   config.json       optional engine tuning config
//!   evaluation.json   optional default scoring config
//!   omr_marker.jpg    optional marker reference image
//! ```
//!
//! Templates are immutable for the lifetime of the process; a changed template
//! is only observed after a restart.

mod cache;
mod error;
mod store;

pub use cache::{TemplateAssetBundle, TemplateAssetCache};
pub use error::TemplateError;
pub use store::{TemplateHandle, TemplateStore};

/// Required layout descriptor.
pub const DESCRIPTOR_FILE: &str = "template.json";
/// Engine tuning config shipped with the template.
pub const TUNING_CONFIG_FILE: &str = "config.json";
/// Marker reference image used for corner detection.
pub const MARKER_IMAGE_FILE: &str = "omr_marker.jpg";
/// Scoring config, both as template default and as the workspace location.
pub const EVALUATION_FILE: &str = "evaluation.json";

/// Assets copied into every workspace that uses the template.
pub const CACHED_ASSETS: [&str; 3] = [DESCRIPTOR_FILE, TUNING_CONFIG_FILE, MARKER_IMAGE_FILE];

/// Template used when the caller does not name one.
pub const DEFAULT_TEMPLATE_ID: &str = "default";
