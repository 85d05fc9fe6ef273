// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structural fingerprinting of chunk metadata.
//!
//! Two chunks - whether in the same recording or different recordings - that
//! declare the same classes in the same shape can safely share a decoder set
//! (see [crate::dispatch::DecoderCache]). [Fingerprint] is the 256-bit digest
//! used as the cache key: a canonical encoding of every class reachable from
//! the chunk's metadata, fed through SHA-256.
//!
//! This has no direct analog in the crate this one is descended from - that
//! crate reconstructs `EventResolver::primitive_parsers` fresh for every
//! chunk, never reusing work across chunks or recordings.

use crate::metadata::Metadata;
use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit digest over a canonical encoding of a chunk's class graph.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; 32]);

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Fingerprint {
    /// Compute the fingerprint of all classes declared in `metadata`.
    ///
    /// Classes are visited in a deterministic order (sorted by name) so that
    /// two metadata events declaring the same classes in a different
    /// encounter order still hash identically. For each class we feed: its
    /// name, its super type name (if any), then each field's name, target
    /// class name, array flag, and constant-pool flag, in declaration order.
    pub fn compute(metadata: &Metadata) -> Self {
        let mut classes: Vec<_> = metadata.class_map.values().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut hasher = Sha256::new();

        for class in classes {
            hasher.update(class.name.as_bytes());
            hasher.update([0]);

            if let Some(super_type) = &class.super_type {
                hasher.update(super_type.as_bytes());
            }
            hasher.update([0]);

            for field in &class.fields {
                hasher.update(field.name.as_bytes());
                hasher.update([0]);

                let type_name = metadata
                    .class_map
                    .get(&field.type_id)
                    .map(|c| c.name.as_ref())
                    .unwrap_or("");
                hasher.update(type_name.as_bytes());
                hasher.update([0]);

                hasher.update([field.is_array_type() as u8, field.constant_pool.is_some() as u8]);
            }

            hasher.update([0xff]);
        }

        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);

        Self(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_debug_formats_as_hex() {
        // A Fingerprint is just a wrapped digest; verify the Debug impl
        // produces a fixed-width lowercase hex string regardless of content.
        let fp = Fingerprint([0u8; 32]);
        let rendered = format!("{:?}", fp);

        assert_eq!(rendered.len(), 64);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
