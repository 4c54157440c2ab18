use super::kv::{KeyValueStore, KEY_APP_USER};
use crate::error::CoreError;
use crate::model::Identity;

/// Load the signed-in identity. An unreadable record is treated as signed out.
pub fn load_identity(store: &dyn KeyValueStore) -> Result<Option<Identity>, CoreError> {
    let Some(raw) = store.get(KEY_APP_USER)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(identity) => Ok(Some(identity)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {KEY_APP_USER} record: {e}");
            Ok(None)
        }
    }
}

pub fn save_identity(store: &dyn KeyValueStore, identity: &Identity) -> Result<(), CoreError> {
    let json = serde_json::to_string(identity)?;
    store.set(KEY_APP_USER, &json)
}

pub fn clear_identity(store: &dyn KeyValueStore) -> Result<(), CoreError> {
    store.remove(KEY_APP_USER)
}
