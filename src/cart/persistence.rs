//! Versioned cart state encoding
//!
//! Every stored value is wrapped as `{"version": 1, "data": ...}`. Values that
//! fail to parse, or carry another version, are treated as unset.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::cart::{CartItem, CartStorage, StorageError};

pub(crate) const CART_ITEMS_KEY: &str = "cart_items";
pub(crate) const SHIPPING_ADDRESS_KEY: &str = "shipping_address";
pub(crate) const PAYMENT_METHOD_KEY: &str = "payment_method";

const SCHEMA_VERSION: u32 = 1;

/// Items and the submission they belong to, stored under one key so clearing
/// the cart and rotating the submission land together.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedItems {
    pub(crate) submission: Uuid,
    pub(crate) items: Vec<CartItem>,
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u32,
    data: Value,
}

pub(crate) fn encode<T: Serialize>(key: &str, data: &T) -> Result<String, StorageError> {
    serde_json::to_string(&EnvelopeOut {
        version: SCHEMA_VERSION,
        data,
    })
    .map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    let envelope: EnvelopeIn = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(source) => {
            warn!(key, "discarding unreadable cart state: {source}");

            return None;
        }
    };

    if envelope.version != SCHEMA_VERSION {
        warn!(
            key,
            version = envelope.version,
            "discarding cart state with unsupported schema version"
        );

        return None;
    }

    match serde_json::from_value(envelope.data) {
        Ok(data) => Some(data),
        Err(source) => {
            warn!(key, "discarding malformed cart state: {source}");

            None
        }
    }
}

pub(crate) fn load<S, T>(storage: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: CartStorage,
    T: DeserializeOwned,
{
    Ok(storage
        .load(key)?
        .and_then(|raw| decode::<T>(key, &raw)))
}
