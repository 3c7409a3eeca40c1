use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_load_error)
}

fn into_load_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    Error::Load {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    }
}
