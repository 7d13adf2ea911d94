// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The stored form of a tagged entry.
//!
//! An entry is written as JSON: `{"value": <value>, "tags": {"<name>": <version>}}`. The
//! decoder also accepts the positional form `[<value>, {tags}]` and an object without a
//! `tags` member, which is read as an untagged entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, TagVersion};

/// The tag versions an entry was written against, keyed by tag name.
pub type TagSnapshot = BTreeMap<String, TagVersion>;

#[derive(Serialize)]
struct EnvelopeRef<'a, V: ?Sized> {
    value: &'a V,
    tags: &'a TagSnapshot,
}

/// A decoded entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Envelope<V> {
    pub(crate) value: V,
    #[serde(default)]
    pub(crate) tags: TagSnapshot,
}

pub(crate) fn encode<V>(value: &V, tags: &TagSnapshot) -> Result<Vec<u8>, Error>
where
    V: Serialize + ?Sized,
{
    serde_json::to_vec(&EnvelopeRef { value, tags }).map_err(Error::from_message)
}

/// Decodes a raw payload. An empty payload is absent.
pub(crate) fn decode<V>(raw: &[u8]) -> Result<Option<Envelope<V>>, Error>
where
    V: DeserializeOwned,
{
    if raw.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(raw).map(Some).map_err(Error::from_message)
}
