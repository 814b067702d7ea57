//! Random version-4 identifiers for containers.
//!
//! `uuid` draws from the operating system CSPRNG (`getrandom`), so values are
//! unpredictable. Nothing checks them against identifiers already stored.

use uuid::{Uuid, Variant};

/// New lowercase hyphenated v4 identifier, e.g. `1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b`.
pub fn new_uuid() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// True for the canonical `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx` form with `y` in `{8,9,a,b}`.
pub fn is_well_formed(s: &str) -> bool {
    if s.len() != 36 || s.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    match Uuid::parse_str(s) {
        Ok(id) => {
            id.get_version_num() == 4
                && id.get_variant() == Variant::RFC4122
                && id.hyphenated().to_string() == s
        }
        Err(_) => false,
    }
}
