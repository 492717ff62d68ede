//! Format selection by identifier.

use std::collections::BTreeMap;

use tracing::debug;

use crate::decode::formats::{RawFormat, SomeIpSdFormat};
use crate::decode::FormatDecoder;
use crate::error::{InspectError, Result};

/// Decoders keyed by their format id.
#[derive(Default)]
pub struct FormatRegistry {
    decoders: BTreeMap<String, Box<dyn FormatDecoder>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in format.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RawFormat));
        registry.register(Box::new(SomeIpSdFormat));
        registry
    }

    /// Add a decoder, replacing any decoder registered under the same id.
    pub fn register(&mut self, decoder: Box<dyn FormatDecoder>) {
        let id = decoder.id().to_string();
        debug!(format = %id, "Registering format decoder");
        self.decoders.insert(id, decoder);
    }

    /// Select the decoder for `id`.
    pub fn get(&self, id: &str) -> Result<&dyn FormatDecoder> {
        self.decoders
            .get(id)
            .map(|d| &**d)
            .ok_or_else(|| InspectError::UnknownFormat(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.decoders.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.decoders.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
