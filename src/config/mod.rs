//! Configuration: defaults, the XML file and where to find it.
//! CLI flags are layered on top by the binary.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{CONFIG_ENV, default_config_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path, template_xml};
