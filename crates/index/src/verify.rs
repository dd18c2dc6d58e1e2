//! Startup self-check for the rendered index

use crate::models::IndexFile;
use slowrepo_errors::{Error, IndexError};

/// Render `index` and prove the rendered bytes parse back to the same catalog
///
/// Every version entry of `index` must be found in the parsed copy with
/// identical fields, and the parsed copy must not contain anything extra.
///
/// # Errors
///
/// Returns `SerializationFailed` or `DeserializationFailed` if either half of
/// the round trip fails, and `RoundTripIntegrity` naming the first entry that
/// was lost, altered or invented along the way.
pub fn verify_index(index: &IndexFile) -> Result<Vec<u8>, Error> {
    let bytes = index.to_yaml()?.into_bytes();
    let parsed = IndexFile::from_yaml(&bytes)?;

    for expected in index.versions() {
        let meta = &expected.metadata;
        match parsed.get(&meta.name, &meta.version) {
            Ok(found) if found == expected => {}
            _ => {
                return Err(IndexError::RoundTripIntegrity {
                    name: meta.name.clone(),
                    version: meta.version.clone(),
                }
                .into())
            }
        }
    }

    if let Some(extra) = parsed
        .versions()
        .find(|v| !index.contains(&v.metadata.name, &v.metadata.version))
    {
        return Err(IndexError::RoundTripIntegrity {
            name: extra.metadata.name.clone(),
            version: extra.metadata.version.clone(),
        }
        .into());
    }

    Ok(bytes)
}
