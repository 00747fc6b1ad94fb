pub mod costs;
pub mod document;
pub mod landing_page;
pub mod lead;
pub mod location;
pub mod maintenance;
pub mod staff;
pub mod ticket;

use serde::{Deserialize, Deserializer};

/// Decodes an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
