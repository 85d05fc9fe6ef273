// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Untyped projection of decoded events as ordered name/value pairs.
//!
//! Unlike [crate::typed], the untyped projector needs no schema: any event
//! can be projected into an [UntypedRecord] keyed by its metadata field
//! names. [crate::config::UntypedMode] controls how eagerly constant pool
//! references nested in the record are resolved.
//!
//! Grounded on [crate::string_table::LazyStringTable]'s first-access
//! decode-and-cache pattern, generalized here from "lazily decoded string" to
//! "lazily decoded field value": [UntypedRecord::get] resolves and caches a
//! field's constant pool references on first access rather than up front.

use crate::{
    config::UntypedMode,
    metadata::ClassElement,
    resolver::ConstantResolver,
    value::{Object, Value},
};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A flyweight table of field names shared by every [UntypedRecord] decoded
/// from the same metadata class.
///
/// Two records of the same class carry the same `Rc<[Box<str>]>` and differ
/// only in their values; field counts are small enough (a handful to a few
/// dozen) that lookup by linear scan over the shared name list is preferable
/// to the bookkeeping a sorted/binary-searched array would add.
#[derive(Default)]
pub struct NamesCache {
    by_class: RefCell<FxHashMap<i64, Rc<[Box<str>]>>>,
}

impl NamesCache {
    pub fn names_for(&self, class: &ClassElement) -> Rc<[Box<str>]> {
        if let Some(existing) = self.by_class.borrow().get(&class.id) {
            return existing.clone();
        }

        let names: Rc<[Box<str>]> = class
            .fields
            .iter()
            .map(|f| f.name.as_ref().into())
            .collect::<Vec<_>>()
            .into();

        self.by_class.borrow_mut().insert(class.id, names.clone());

        names
    }
}

/// One field's value in an [UntypedRecord]: either eagerly resolved already,
/// or a pending thunk holding the as-decoded [Value] awaiting first access.
enum Slot<'resolver, 'chunk> {
    Resolved(Value<'resolver, 'chunk>),
    Pending(RefCell<Option<Value<'resolver, 'chunk>>>),
}

/// A decoded event projected as an ordered name/value list, independent of
/// any particular schema type.
///
/// Valid only as long as the chunk it was decoded from is alive; per the
/// dispatcher's contract (see [crate::dispatch]) these are not retained past
/// the event or chunk that produced them.
pub struct UntypedRecord<'resolver, 'chunk> {
    names: Rc<[Box<str>]>,
    slots: Vec<Slot<'resolver, 'chunk>>,
    class_id: i64,
}

impl<'resolver, 'chunk> UntypedRecord<'resolver, 'chunk> {
    /// Project `object`'s fields per `mode`.
    ///
    /// `Eager` resolves every field's constant pool references immediately.
    /// `Lazy` and `Sparse` both defer resolution to first [Self::get] call;
    /// they are distinguished only at the handler level (a `Sparse` consumer
    /// is simply one that is expected to call `get` for a subset of names),
    /// since both share the same underlying thunk mechanism here.
    pub fn project<CR: ConstantResolver<'chunk>>(
        object: &Object<'resolver, 'chunk>,
        cr: &CR,
        mode: UntypedMode,
        names_cache: &NamesCache,
    ) -> Self {
        let names = names_cache.names_for(&object.class);

        let slots = object
            .fields
            .iter()
            .cloned()
            .map(|v| match mode {
                UntypedMode::Eager => Slot::Resolved(v.resolve_constants(cr)),
                UntypedMode::Lazy | UntypedMode::Sparse => Slot::Pending(RefCell::new(Some(v))),
            })
            .collect();

        Self {
            names,
            slots,
            class_id: object.class_id(),
        }
    }

    /// The metadata class ID of the event this record was projected from.
    pub fn class_id(&self) -> i64 {
        self.class_id
    }

    /// The field names of this record, in metadata declaration order.
    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    /// Look up a field's value by name, resolving its constant pool
    /// references (and caching the result) on first access.
    pub fn get<CR: ConstantResolver<'chunk>>(
        &self,
        name: &str,
        cr: &CR,
    ) -> Option<Value<'resolver, 'chunk>> {
        let idx = self.names.iter().position(|n| n.as_ref() == name)?;

        match &self.slots[idx] {
            Slot::Resolved(v) => Some(v.clone()),
            Slot::Pending(cell) => {
                if let Some(v) = cell.borrow().as_ref() {
                    // Already materialized by a prior call; but we still
                    // need to know if it was raw or resolved. We resolve
                    // unconditionally the first time below, then cache.
                    return Some(v.clone());
                }

                let raw = cell.borrow_mut().take().expect("slot populated at construction");
                let resolved = raw.resolve_constants(cr);
                *cell.borrow_mut() = Some(resolved.clone());

                Some(resolved)
            }
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

    #[test]
    fn eager_projection_exposes_named_field() {
        let data = testutil::sample_chunk_bytes();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();
        let names_cache = NamesCache::default();

        for er in reader.iter_event_records() {
            let er = er.unwrap();
            if er.is_special_event() {
                continue;
            }

            let object = er.resolve_object(&resolver).unwrap();
            let record = UntypedRecord::project(&object, &cpv, UntypedMode::Eager, &names_cache);

            assert_eq!(record.names(), &["value".to_string().into_boxed_str()]);

            let value = record.get("value", &cpv).unwrap();
            assert_eq!(value.as_primitive().unwrap().as_byte(), Some(42));
        }
    }

    #[test]
    fn lazy_projection_resolves_on_first_access() {
        let data = testutil::sample_chunk_bytes();
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();
        let names_cache = NamesCache::default();

        for er in reader.iter_event_records() {
            let er = er.unwrap();
            if er.is_special_event() {
                continue;
            }

            let object = er.resolve_object(&resolver).unwrap();
            let record = UntypedRecord::project(&object, &cpv, UntypedMode::Lazy, &names_cache);

            assert!(record.get("missing", &cpv).is_none());
            assert_eq!(
                record.get("value", &cpv).unwrap().as_primitive().unwrap().as_byte(),
                Some(42)
            );
        }
    }

    #[test]
    fn names_are_shared_across_records_of_the_same_class() {
        let data = testutil::sample_chunk_bytes_with_values(&[1, 2]);
        let (_, reader) = SliceReader::new(&data).unwrap();

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();
        let names_cache = NamesCache::default();

        let mut records = Vec::new();

        for er in reader.iter_event_records() {
            let er = er.unwrap();
            if er.is_special_event() {
                continue;
            }

            let object = er.resolve_object(&resolver).unwrap();
            records.push(UntypedRecord::project(
                &object,
                &cpv,
                UntypedMode::Eager,
                &names_cache,
            ));
        }

        assert_eq!(records.len(), 2);
        assert!(Rc::ptr_eq(&records[0].names, &records[1].names));
    }
}
