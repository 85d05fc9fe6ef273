// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decoded JFR values.
//!
//! [Value] is the dynamic, untyped representation of a decoded field or
//! event: either a [Primitive], a compound [Object], a [Vec] of further
//! values, or an unresolved reference into a constants pool. Consumers that
//! want strongly typed records call [Value::deserialize_enum] to project a
//! `Value` onto a `serde::Deserialize` target type without ever needing to
//! match on this enum themselves.

use crate::{
    error::{Error, Result},
    metadata::ClassElement,
    primitive::Primitive,
    resolver::ConstantResolver,
};
use rustc_hash::FxHashSet;
use serde::de::{DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use std::cell::RefCell;
use std::sync::Arc;

/// A fully parsed compound value: a class and the decoded values of its fields.
///
/// Field order always matches the owning [ClassElement::fields] order, so a
/// field's value can be located either by name (linear scan of the small
/// field list) or by position.
#[derive(Clone, Debug)]
pub struct Object<'resolver, 'chunk> {
    pub class: Arc<ClassElement<'chunk>>,
    pub fields: Vec<Value<'resolver, 'chunk>>,
}

impl<'resolver, 'chunk> Object<'resolver, 'chunk> {
    pub fn new(class: &Arc<ClassElement<'chunk>>, fields: Vec<Value<'resolver, 'chunk>>) -> Self {
        Self {
            class: class.clone(),
            fields,
        }
    }

    /// The class ID of this object's class.
    pub fn class_id(&self) -> i64 {
        self.class.id
    }

    /// Look up a field's decoded value by its metadata name.
    pub fn get(&self, name: &str) -> Option<&Value<'resolver, 'chunk>> {
        self.class
            .fields
            .iter()
            .position(|f| f.name == name)
            .and_then(|idx| self.fields.get(idx))
    }
}

/// A dynamically typed, decoded JFR value.
#[derive(Clone, Debug)]
pub enum Value<'resolver, 'chunk> {
    Primitive(Primitive<'chunk>),
    Object(Object<'resolver, 'chunk>),
    Array(Vec<Value<'resolver, 'chunk>>),
    /// An unresolved reference into the constants pool for `class_id`.
    ///
    /// This variant is produced whenever a field is constant-pool backed.
    /// Resolving it requires a [ConstantResolver]; see [Value::resolve_constants].
    ConstantPool { class_id: i64, constant_index: i64 },
}

impl<'resolver, 'chunk> Value<'resolver, 'chunk> {
    /// Obtain the [Primitive] stored here, if this is a primitive value.
    pub fn as_primitive(&self) -> Option<&Primitive<'chunk>> {
        if let Self::Primitive(p) = self {
            Some(p)
        } else {
            None
        }
    }

    /// Obtain the [Object] stored here, if this is a compound value.
    pub fn as_object(&self) -> Option<&Object<'resolver, 'chunk>> {
        if let Self::Object(o) = self {
            Some(o)
        } else {
            None
        }
    }

    /// Resolve any [Value::ConstantPool] references reachable from this value.
    ///
    /// Recurses into object fields and array elements. Each constant pool
    /// reference is looked up and substituted with its resolved value. Since
    /// constant pool entries may reference each other cyclically (see the
    /// module docs of [crate::constant_pool]), this walk tracks the set of
    /// `(class_id, index)` pairs already being resolved in the current chain
    /// and stops substituting once a cycle is detected, leaving the innermost
    /// repeated reference unresolved rather than recursing forever.
    pub fn resolve_constants<CR: ConstantResolver<'chunk>>(self, resolver: &CR) -> Self {
        let mut visiting = FxHashSet::default();
        self.resolve_constants_inner(resolver, &mut visiting)
    }

    fn resolve_constants_inner<CR: ConstantResolver<'chunk>>(
        self,
        resolver: &CR,
        visiting: &mut FxHashSet<(i64, i64)>,
    ) -> Self {
        match self {
            Self::Primitive(p) => Self::Primitive(p),
            Self::Array(els) => Self::Array(
                els.into_iter()
                    .map(|v| v.resolve_constants_inner(resolver, visiting))
                    .collect(),
            ),
            Self::Object(o) => Self::Object(Object {
                class: o.class,
                fields: o
                    .fields
                    .into_iter()
                    .map(|v| v.resolve_constants_inner(resolver, visiting))
                    .collect(),
            }),
            Self::ConstantPool {
                class_id,
                constant_index,
            } => {
                let key = (class_id, constant_index);

                if !visiting.insert(key) {
                    return Self::ConstantPool {
                        class_id,
                        constant_index,
                    };
                }

                let resolved = match resolver.get(class_id, constant_index) {
                    ConstantValue::Value(v) => {
                        v.clone().resolve_constants_inner(resolver, visiting)
                    }
                    ConstantValue::Null => Self::Primitive(Primitive::NullString),
                    ConstantValue::Missing => Self::ConstantPool {
                        class_id,
                        constant_index,
                    },
                };

                visiting.remove(&key);

                resolved
            }
        }
    }

    /// Project this value onto a `serde`-derived type `T`, resolving constant
    /// pool references against `resolver` as needed.
    ///
    /// This is the bridge used by the typed projector: `T` is normally a
    /// hand-written struct or enum deriving `serde::Deserialize` whose field
    /// names (via `#[serde(rename = "...")]` where needed) match the metadata
    /// field names of the class this value was decoded against.
    pub fn deserialize_enum<T, CR>(&self, resolver: &CR) -> Result<T>
    where
        T: DeserializeOwned,
        CR: ConstantResolver<'chunk>,
    {
        let visiting = RefCell::new(FxHashSet::default());

        T::deserialize(ValueDeserializer {
            value: self,
            resolver,
            visiting: &visiting,
        })
    }
}

/// The result of looking up a raw constant pool entry: present, explicitly
/// null, or missing (no checkpoint ever populated this index).
pub enum ConstantValue<'a, 'chunk> {
    Null,
    Missing,
    Value(&'a Value<'a, 'chunk>),
}

/// Like [ConstantValue] but with the value mapped through a fallible function.
pub enum ConstantValueMapped<T> {
    Null,
    Missing,
    Value(Result<T>),
}

/// Like [ConstantValue] but with constant pool references transitively resolved.
pub enum ResolvedConstantValue<'a, 'chunk> {
    Null,
    Missing,
    Value(Value<'a, 'chunk>),
}

impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        Error::Deserialize(msg.to_string())
    }
}

/// Bridges a decoded [Value] to `serde::Deserializer`.
///
/// `visiting` tracks the `(class_id, constant_index)` pairs currently being
/// followed through a chain of constant pool references, mirroring
/// [Value::resolve_constants_inner]. It is shared (via the `RefCell`) across
/// every `ValueDeserializer`/`ObjectMapAccess`/`ArraySeqAccess` spawned while
/// deserializing a single top-level value, so a cycle reached through an
/// object field or array element is detected the same as one reached by
/// immediately re-resolving the same reference.
struct ValueDeserializer<'a, 'resolver, 'chunk, CR> {
    value: &'a Value<'resolver, 'chunk>,
    resolver: &'a CR,
    visiting: &'a RefCell<FxHashSet<(i64, i64)>>,
}

struct ObjectMapAccess<'a, 'resolver, 'chunk, CR> {
    object: &'a Object<'resolver, 'chunk>,
    resolver: &'a CR,
    visiting: &'a RefCell<FxHashSet<(i64, i64)>>,
    field_idx: usize,
}

impl<'de, 'resolver, 'chunk, CR> serde::de::MapAccess<'de>
    for ObjectMapAccess<'de, 'resolver, 'chunk, CR>
where
    CR: ConstantResolver<'chunk>,
{
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.field_idx >= self.object.fields.len() {
            return Ok(None);
        }

        let name = self
            .object
            .class
            .fields
            .get(self.field_idx)
            .map(|f| f.name.as_ref())
            .ok_or_else(|| Error::ClassNotFound(self.object.class.id))?;

        seed.deserialize(name.into_deserializer()).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = &self.object.fields[self.field_idx];
        self.field_idx += 1;

        seed.deserialize(ValueDeserializer {
            value,
            resolver: self.resolver,
            visiting: self.visiting,
        })
    }
}

struct ArraySeqAccess<'a, 'resolver, 'chunk, CR> {
    elements: &'a [Value<'resolver, 'chunk>],
    resolver: &'a CR,
    visiting: &'a RefCell<FxHashSet<(i64, i64)>>,
    index: usize,
}

impl<'de, 'resolver, 'chunk, CR> serde::de::SeqAccess<'de>
    for ArraySeqAccess<'de, 'resolver, 'chunk, CR>
where
    CR: ConstantResolver<'chunk>,
{
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.index >= self.elements.len() {
            return Ok(None);
        }

        let value = &self.elements[self.index];
        self.index += 1;

        seed.deserialize(ValueDeserializer {
            value,
            resolver: self.resolver,
            visiting: self.visiting,
        })
        .map(Some)
    }
}

impl<'de, 'resolver, 'chunk, CR> serde::Deserializer<'de>
    for ValueDeserializer<'de, 'resolver, 'chunk, CR>
where
    CR: ConstantResolver<'chunk>,
{
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Primitive(Primitive::Boolean(v)) => visitor.visit_bool(*v),
            Value::Primitive(Primitive::Byte(v)) => visitor.visit_i8(*v),
            Value::Primitive(Primitive::Short(v)) => visitor.visit_i16(*v),
            Value::Primitive(Primitive::Integer(v)) => visitor.visit_i32(*v),
            Value::Primitive(Primitive::Long(v)) => visitor.visit_i64(*v),
            Value::Primitive(Primitive::Float(v)) => visitor.visit_f32(*v),
            Value::Primitive(Primitive::Double(v)) => visitor.visit_f64(*v),
            Value::Primitive(Primitive::Character(v)) => visitor.visit_char(*v),
            Value::Primitive(Primitive::NullString) => visitor.visit_none(),
            Value::Primitive(Primitive::String(v)) => visitor.visit_borrowed_str(v.as_ref()),
            Value::Primitive(Primitive::StringConstantPool(index)) => {
                match self.resolver.get_string(*index) {
                    ConstantValueMapped::Null | ConstantValueMapped::Missing => {
                        visitor.visit_none()
                    }
                    ConstantValueMapped::Value(Ok(s)) => visitor.visit_string(s),
                    ConstantValueMapped::Value(Err(e)) => Err(e),
                }
            }
            Value::Object(o) => visitor.visit_map(ObjectMapAccess {
                object: o,
                resolver: self.resolver,
                visiting: self.visiting,
                field_idx: 0,
            }),
            Value::Array(els) => visitor.visit_seq(ArraySeqAccess {
                elements: els,
                resolver: self.resolver,
                visiting: self.visiting,
                index: 0,
            }),
            Value::ConstantPool {
                class_id,
                constant_index,
            } => {
                let key = (*class_id, *constant_index);

                if !self.visiting.borrow_mut().insert(key) {
                    return Err(Error::ConstantPoolCycle(*class_id, *constant_index));
                }

                let result = match self.resolver.get(*class_id, *constant_index) {
                    ConstantValue::Value(v) => ValueDeserializer {
                        value: v,
                        resolver: self.resolver,
                        visiting: self.visiting,
                    }
                    .deserialize_any(visitor),
                    ConstantValue::Null => visitor.visit_none(),
                    ConstantValue::Missing => {
                        Err(Error::ConstantNotFound(*class_id, *constant_index))
                    }
                };

                self.visiting.borrow_mut().remove(&key);

                result
            }
        }
    }

    /// Unlike every other scalar accessor (forwarded to [Self::deserialize_any]
    /// via `forward_to_deserialize_any!` below), `i64` is special-cased: a
    /// pool-flagged field is only ever exposed as a bare `i64` by a schema
    /// when the caller wants [crate::typed::RawConstantPoolIndex], so a
    /// `Value::ConstantPool` reference here yields the wire index unresolved
    /// rather than being followed.
    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Value::ConstantPool {
            constant_index, ..
        } = self.value
        {
            return visitor.visit_i64(*constant_index);
        }

        self.deserialize_any(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Primitive(Primitive::NullString) => visitor.visit_none(),
            Value::ConstantPool {
                class_id,
                constant_index,
            } => {
                let key = (*class_id, *constant_index);

                // A repeated reference in an optional field (e.g. a
                // self-referencing parent pointer) is treated as the chain
                // terminating with `None` rather than an error, since the
                // schema already declares this reference may be absent.
                if !self.visiting.borrow_mut().insert(key) {
                    return visitor.visit_none();
                }

                let result = match self.resolver.get(*class_id, *constant_index) {
                    ConstantValue::Value(v) => visitor.visit_some(ValueDeserializer {
                        value: v,
                        resolver: self.resolver,
                        visiting: self.visiting,
                    }),
                    ConstantValue::Null | ConstantValue::Missing => visitor.visit_none(),
                };

                self.visiting.borrow_mut().remove(&key);

                result
            }
            _ => visitor.visit_some(self),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any struct
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        chunk::{ChunkReader, SliceReader},
        testutil,
    };

    #[test]
    fn resolve_constants_follows_forward_reference_and_stops_at_cycle() {
        let data = testutil::sample_chunk_with_thread_checkpoint();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();

        let thread_group_class_id = resolver.class_id("jdk.types.ThreadGroup").unwrap();

        let event = reader
            .iter_event_records()
            .find(|er| {
                er.as_ref()
                    .map(|er| !er.is_special_event())
                    .unwrap_or(false)
            })
            .unwrap()
            .unwrap();

        let value = event.resolve_value(&resolver).unwrap();
        let resolved = value.resolve_constants(&cpv);

        let thread_start = resolved.as_object().unwrap();
        let thread = thread_start.get("thread").unwrap().as_object().unwrap();
        let group = thread.get("group").unwrap().as_object().unwrap();

        assert_eq!(
            group.get("name").unwrap().as_primitive().unwrap().as_str(),
            Some("main-group")
        );

        // The self-referencing parent is left as an unresolved pool
        // reference rather than being followed forever.
        assert!(matches!(
            group.get("parent").unwrap(),
            Value::ConstantPool {
                class_id,
                constant_index: 1,
            } if *class_id == thread_group_class_id
        ));
    }

    #[test]
    fn deserialize_enum_errors_on_required_field_cycle() {
        let data = testutil::sample_chunk_with_thread_checkpoint();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();
        let thread_group_class_id = resolver.class_id("jdk.types.ThreadGroup").unwrap();

        let raw_group = match cpv.get(thread_group_class_id, 1) {
            ConstantValue::Value(v) => v.clone(),
            _ => panic!("expected a ThreadGroup pool entry"),
        };

        // Unlike the real `ThreadGroup` schema (whose `parent` is `Option`),
        // this target makes the self-referencing field required so the hard
        // error path in `deserialize_any`'s `ConstantPool` arm is exercised
        // instead of `deserialize_option`'s `visit_none` shortcut.
        #[derive(serde::Deserialize)]
        struct RequiredParent {
            parent: Box<RequiredParent>,
            #[allow(dead_code)]
            name: String,
        }

        let err = raw_group
            .deserialize_enum::<RequiredParent, _>(&cpv)
            .unwrap_err();

        assert!(matches!(err, Error::ConstantPoolCycle(class_id, 1) if class_id == thread_group_class_id));
    }

    #[cfg(feature = "openjdk21")]
    #[test]
    fn deserialize_enum_resolves_chain_and_breaks_cycle_as_none() {
        use crate::types::openjdk21::ThreadStart;

        let data = testutil::sample_chunk_with_thread_checkpoint();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();

        let event = reader
            .iter_event_records()
            .find(|er| {
                er.as_ref()
                    .map(|er| !er.is_special_event())
                    .unwrap_or(false)
            })
            .unwrap()
            .unwrap();

        let value = event.resolve_value(&resolver).unwrap();
        let decoded: ThreadStart = value.deserialize_enum(&cpv).unwrap();

        assert_eq!(decoded.thread.os_name, "main");
        assert_eq!(decoded.thread.group.name, "main-group");
        assert_eq!(decoded.thread.group.parent, None);
    }
}
