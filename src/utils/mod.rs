pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{StudioError, StudioResult, ValidationError, PathError};
pub use validation::{validate_config, validate_hex_color, validate_settings};
pub use formats::{ImageFormat, format_from_extension, mime_for_output};
pub use fs::{create_dir_all, extract_filename, extract_stem, read_upload};
