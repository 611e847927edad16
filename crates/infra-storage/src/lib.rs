// QRMaster Infrastructure - Filesystem Adapters
// Implements: DurableStore, LegacySource

pub mod file_durable_store;
pub mod json_legacy_source;

pub use file_durable_store::FileDurableStore;
pub use json_legacy_source::JsonFileLegacySource;

/// File name for a store key; anything outside [A-Za-z0-9._-] becomes '_'
pub(crate) fn key_file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
