use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a 32-byte hash as a hex string
pub fn hash_as_hex<S>(hash: &[u8; 32], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&hex::encode(hash))
}

/// Deserialize a hex string into a 32-byte hash
pub fn hash_from_hex<'de, D>(d: D) -> Result<[u8; 32], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    let bytes = hex::decode(&s).map_err(D::Error::custom)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", b.len())))
}
