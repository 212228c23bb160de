pub mod features;
pub mod integrity;
pub mod matcher;
pub mod tampering;

pub use features::extract_features;
pub use integrity::score_integrity;
pub use matcher::match_fields;
pub use tampering::detect_tampering;
