// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed projection of decoded events onto `serde::Deserialize` schema types.
//!
//! A schema is a plain Rust type implementing [serde::Deserialize] whose
//! field names (via `#[serde(rename = "...")]` where the Rust identifier
//! isn't a legal JFR field name) match the metadata field names of one JFR
//! class. [Schema::CLASS_NAME] binds the type to that class. [TypedDecoder]
//! is the runtime piece: it validates the binding against a chunk's metadata
//! once, then decodes events of that class into owned `T` values via
//! [crate::value::Value::deserialize_enum].

use crate::{
    config::TypedRecordReuse,
    error::{Error, Result},
    resolver::{ConstantResolver, EventResolver},
    value::{Object, Value},
};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::sync::Arc;

/// A field on a schema struct that wants the raw, unresolved constant pool
/// index of a pool-flagged field rather than its resolved value.
///
/// `#[serde(deserialize_with = "...")]` is not needed: this type's `Deserialize`
/// impl below accepts exactly the integer [crate::value::Value::ConstantPool]
/// is projected as before resolution, since the constant pool value itself is
/// never substituted for a `raw`-typed field (see [TypedDecoder::decode]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RawConstantPoolIndex(pub i64);

impl<'de> serde::Deserialize<'de> for RawConstantPoolIndex {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(RawConstantPoolIndex)
    }
}

/// Binds a schema type to the fully qualified JFR class name it projects.
pub trait Schema: DeserializeOwned {
    /// The metadata class name this schema decodes, e.g. `"jdk.ExecutionSample"`.
    const CLASS_NAME: &'static str;
}

/// The immutable half of a [TypedDecoder]: just the resolved class ID.
///
/// Split out from [TypedDecoder] so it can be cached across chunks and
/// recordings by [crate::dispatch::DecoderCache] — `Arc<TypedBinding>` is
/// `Send + Sync` since it carries no freelist, unlike `TypedDecoder<T>`
/// itself which holds a `RefCell` and so cannot be shared across threads.
#[derive(Debug)]
pub struct TypedBinding {
    class_id: i64,
}

impl TypedBinding {
    /// Locate `class_name` in `resolver`'s class table.
    ///
    /// Returns `None` rather than an error when the class is absent: per the
    /// typed projector's contract, a missing class simply means no events of
    /// that type will ever be dispatched in this chunk, not a failure to
    /// decode.
    pub fn resolve<'chunk>(resolver: &EventResolver<'chunk>, class_name: &str) -> Option<Self> {
        let class_id = resolver.class_id(class_name)?;

        Some(Self { class_id })
    }

    /// The metadata class ID this binding resolved to.
    pub fn class_id(&self) -> i64 {
        self.class_id
    }
}

/// Decodes events of one registered schema type `T`.
///
/// Validation (locating `T::CLASS_NAME` in the resolver's class table) is
/// captured in [TypedBinding], resolved once via [Self::bind] or reused
/// across chunks via [Self::from_binding]. A thread-local freelist recycles
/// `T` instances between decodes when [TypedRecordReuse::Pooled] is
/// configured: the teacher reuses nothing across events, so this pooling is
/// new design built in the teacher's idiom (a `RefCell<Vec<T>>` guarded by a
/// plain boolean) rather than lifted from existing code.
pub struct TypedDecoder<T> {
    binding: Arc<TypedBinding>,
    freelist: RefCell<Vec<T>>,
    reuse: bool,
}

impl<T> TypedDecoder<T>
where
    T: DeserializeOwned,
{
    /// Locate `T::CLASS_NAME` in `resolver`'s class table and build a
    /// decoder around a freshly resolved, uncached binding.
    pub fn bind<'chunk>(
        resolver: &EventResolver<'chunk>,
        class_name: &str,
        reuse: TypedRecordReuse,
    ) -> Option<Self> {
        let binding = Arc::new(TypedBinding::resolve(resolver, class_name)?);

        Some(Self::from_binding(binding, reuse))
    }

    /// Build a decoder around an already-resolved (possibly cached) binding.
    pub fn from_binding(binding: Arc<TypedBinding>, reuse: TypedRecordReuse) -> Self {
        Self {
            binding,
            freelist: RefCell::new(Vec::new()),
            reuse: reuse == TypedRecordReuse::Pooled,
        }
    }

    /// The metadata class ID this decoder was bound to.
    pub fn class_id(&self) -> i64 {
        self.binding.class_id
    }

    /// The binding backing this decoder, for identity comparisons against a
    /// [crate::dispatch::DecoderCache] lookup.
    pub(crate) fn binding(&self) -> &Arc<TypedBinding> {
        &self.binding
    }

    /// Decode `object` (already resolved against `cr` for field access) into `T`.
    ///
    /// Constant-pool references within `object`'s fields are followed by the
    /// serde bridge in [crate::value] as soon as the target schema field asks
    /// for anything other than a bare `i64` (see [RawConstantPoolIndex], whose
    /// `Deserialize` impl requests exactly that to get the wire index instead
    /// of the resolved value).
    pub fn decode<'resolver, 'chunk, CR>(&self, object: &Object<'resolver, 'chunk>, cr: &CR) -> Result<T>
    where
        CR: ConstantResolver<'chunk>,
    {
        if object.class_id() != self.binding.class_id {
            return Err(Error::ClassNotFound(self.binding.class_id));
        }

        Value::Object(object.clone()).deserialize_enum(cr)
    }

    /// Obtain a record to decode into: a pooled instance if one is free and
    /// pooling is enabled, or a fresh default otherwise.
    pub fn take(&self) -> Option<T> {
        if self.reuse {
            self.freelist.borrow_mut().pop()
        } else {
            None
        }
    }

    /// Return `record` to the freelist for a future [Self::take], if pooling
    /// is enabled. The handler must not retain references to `record` past
    /// this call.
    pub fn release(&self, record: T) {
        if self.reuse {
            self.freelist.borrow_mut().push(record);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        chunk::{ChunkReader, SliceReader},
        testutil,
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestByte {
        value: i8,
    }

    impl Schema for TestByte {
        const CLASS_NAME: &'static str = "test.Byte";
    }

    #[test]
    fn bind_and_decode_sample_event() {
        let data = testutil::sample_chunk_bytes();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();

        let decoder =
            TypedDecoder::<TestByte>::bind(&resolver, TestByte::CLASS_NAME, TypedRecordReuse::Pooled)
                .expect("test.Byte class must be present in sample chunk metadata");

        let mut decoded = Vec::new();

        for er in reader.iter_event_records() {
            let er = er.unwrap();

            if er.is_special_event() {
                continue;
            }

            let object = er.resolve_object(&resolver).unwrap();
            decoded.push(decoder.decode(&object, &cpv).unwrap());
        }

        assert_eq!(decoded, vec![TestByte { value: 42 }]);
    }

    #[test]
    fn bind_returns_none_for_unknown_class() {
        let data = testutil::sample_chunk_bytes();
        let (_, reader) = SliceReader::new(&data).unwrap();
        let resolver = reader.resolver().unwrap();

        assert!(TypedDecoder::<TestByte>::bind(
            &resolver,
            "does.not.Exist",
            TypedRecordReuse::Fresh
        )
        .is_none());
    }
}
