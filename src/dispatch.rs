// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Push-based event dispatch over a recording.
//!
//! The chunk/event readers in [crate::chunk] and [crate::recording] are
//! pull-based: callers drive iterators chunk by chunk, event by event. This
//! module layers a push-based [Parser] on top of that same drive loop: a
//! caller registers typed and/or untyped handlers via [Parser::register_typed]
//! / [Parser::register_untyped] once, then calls [Parser::run] and has
//! matching events delivered to them in file order.
//!
//! This is the component with the least direct precedent in the pull-based
//! reader this crate builds on; it reuses [crate::chunk::ChunkReader] and
//! [crate::event::EventRecord] as the underlying iteration and follows the
//! teacher's builder-and-trait idiom (`ChunkReader`'s default-method-heavy
//! trait, `EventResolver`'s owning-struct-with-methods style) for the new
//! `ParsingContext`/`Parser`/`Registration`/`Control` types.

use crate::{
    chunk::{ChunkReader, SliceReader},
    config::Config,
    error::{Error, Result},
    fingerprint::Fingerprint,
    recording::FileReader,
    resolver::ConstantPoolValues,
    typed::{TypedBinding, TypedDecoder},
    untyped::{NamesCache, UntypedRecord},
    value::Object,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use std::io::{Read, Seek};
use std::sync::{Arc, RwLock};

/// Per-chunk timing context and cooperative cancellation handle passed to
/// every handler invocation.
#[derive(Debug, Default)]
pub struct Control {
    aborted: bool,
    chunk_start_ticks: u64,
    chunk_duration_nanoseconds: u64,
    nanoseconds_since_epoch: u64,
    ticks_per_second: u64,
}

impl Control {
    fn for_chunk(header: &crate::chunk::ChunkHeader) -> Self {
        Self {
            aborted: false,
            chunk_start_ticks: header.start_ticks,
            chunk_duration_nanoseconds: header.duration_nanoseconds,
            nanoseconds_since_epoch: header.nanoseconds_since_epoch,
            ticks_per_second: header.ticks_per_second,
        }
    }

    /// Request that delivery stop after the handler currently running
    /// returns. Cooperative: at most one additional event already in flight
    /// may still be delivered, never events after that.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Whether [Self::abort] has been called during this run.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The tick anchor of the chunk the current event belongs to.
    pub fn chunk_start_ticks(&self) -> u64 {
        self.chunk_start_ticks
    }

    /// The declared duration of the chunk the current event belongs to, in nanoseconds.
    pub fn chunk_duration_nanoseconds(&self) -> u64 {
        self.chunk_duration_nanoseconds
    }

    /// The wall-clock start time of the chunk the current event belongs to,
    /// in nanoseconds since the UNIX epoch.
    pub fn nanoseconds_since_epoch(&self) -> u64 {
        self.nanoseconds_since_epoch
    }

    /// The tick rate of the chunk the current event belongs to, needed to
    /// convert [Self::chunk_start_ticks] deltas into wall-clock time.
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

/// A bound typed or untyped handler slot. Dispatch is done through this
/// trait so [Parser] can hold a heterogeneous set of typed registrations
/// (one per schema type `T`) without itself being generic over `T`.
///
/// Only lifetime-generic (never type-generic) methods appear here, which
/// keeps the trait object-safe: [crate::resolver::ConstantResolver] itself
/// has a type-generic method ([crate::resolver::ConstantResolver::get_mapped])
/// and so cannot be used as a trait object, but [ConstantPoolValues] is the
/// one concrete resolver type the dispatcher ever constructs, so binding
/// directly to it avoids the problem entirely.
trait Slot {
    /// The metadata class name this slot wants to receive events for.
    fn class_name(&self) -> &str;

    /// Re-resolve any class-id bindings against a new chunk's metadata,
    /// reusing a cached binding from `cache` when `fingerprint` matches one
    /// already seen. Only [TypedSlot] needs this; the untyped path has no
    /// fixed class.
    fn rebind<'chunk>(
        &mut self,
        _resolver: &crate::resolver::EventResolver<'chunk>,
        _fingerprint: Fingerprint,
        _cache: &DecoderCache,
    ) {
    }

    fn dispatch<'chunk>(
        &mut self,
        object: &Object<'_, 'chunk>,
        cpv: &ConstantPoolValues<'_, 'chunk>,
        ctl: &mut Control,
    ) -> Result<()>;
}

struct TypedSlot<T, F> {
    class_name: String,
    decoder: Option<TypedDecoder<T>>,
    reuse: crate::config::TypedRecordReuse,
    handler: F,
}

impl<T, F> Slot for TypedSlot<T, F>
where
    T: DeserializeOwned,
    F: FnMut(&T, &mut Control) -> Result<()>,
{
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn rebind<'chunk>(
        &mut self,
        resolver: &crate::resolver::EventResolver<'chunk>,
        fingerprint: Fingerprint,
        cache: &DecoderCache,
    ) {
        match cache.get_or_insert(fingerprint, &self.class_name, resolver) {
            Some(binding) => {
                // If the previous chunk's decoder is already bound to this
                // exact binding instance, keep it (and its freelist) rather
                // than rebuilding: this is what makes the decoder set
                // installed for the first chunk with a given fingerprint
                // referentially identical to the one used for every later
                // matching chunk.
                let reuse_existing = self
                    .decoder
                    .as_ref()
                    .is_some_and(|d| Arc::ptr_eq(d.binding(), &binding));

                if !reuse_existing {
                    self.decoder = Some(TypedDecoder::from_binding(binding, self.reuse));
                }
            }
            None => self.decoder = None,
        }
    }

    fn dispatch<'chunk>(
        &mut self,
        object: &Object<'_, 'chunk>,
        cpv: &ConstantPoolValues<'_, 'chunk>,
        ctl: &mut Control,
    ) -> Result<()> {
        let decoder = match &self.decoder {
            Some(d) if d.class_id() == object.class_id() => d,
            _ => return Ok(()),
        };

        let record = decoder.decode(object, cpv)?;
        let result = (self.handler)(&record, ctl);
        decoder.release(record);

        result
    }
}

struct UntypedSlot<F> {
    mode: crate::config::UntypedMode,
    names_cache: NamesCache,
    handler: F,
}

impl<F> Slot for UntypedSlot<F>
where
    F: for<'r, 'c> FnMut(&UntypedRecord<'r, 'c>, &mut Control) -> Result<()>,
{
    fn class_name(&self) -> &str {
        // The untyped handler receives every non-special event; there is no
        // single class to filter on.
        ""
    }

    fn dispatch<'chunk>(
        &mut self,
        object: &Object<'_, 'chunk>,
        cpv: &ConstantPoolValues<'_, 'chunk>,
        ctl: &mut Control,
    ) -> Result<()> {
        let record = UntypedRecord::project(object, cpv, self.mode, &self.names_cache);

        (self.handler)(&record, ctl)
    }
}

/// A handle to a registered handler. [Self::detach] removes the
/// corresponding handler from the [Parser] it was registered on.
pub struct Registration(usize);

enum SlotKind {
    Typed(Box<dyn Slot>),
    Untyped(Box<dyn Slot>),
}

/// A single run's worth of handler registrations over one recording.
///
/// Construct via [ParsingContext::open]. Register handlers, then call
/// [Self::run] once; registrations may be changed and [Self::run] called
/// again afterward, since handler state lives in the slots, not the context.
pub struct Parser<'ctx, T> {
    context: &'ctx ParsingContext,
    reader: FileReader<T>,
    slots: Vec<Option<SlotKind>>,
    closed: bool,
}

impl<'ctx, T: Read + Seek> Parser<'ctx, T> {
    fn new(context: &'ctx ParsingContext, reader: FileReader<T>) -> Self {
        Self {
            context,
            reader,
            slots: Vec::new(),
            closed: false,
        }
    }

    fn push(&mut self, slot: SlotKind) -> Registration {
        self.slots.push(Some(slot));
        Registration(self.slots.len() - 1)
    }

    /// Register a typed handler for events of metadata class `class_name`.
    ///
    /// `handler` receives an owned, decoded `T` per event plus a [Control].
    pub fn register_typed<U, F>(&mut self, class_name: impl Into<String>, handler: F) -> Registration
    where
        U: DeserializeOwned + 'static,
        F: FnMut(&U, &mut Control) -> Result<()> + 'static,
    {
        self.push(SlotKind::Typed(Box::new(TypedSlot::<U, F> {
            class_name: class_name.into(),
            decoder: None,
            reuse: self.context.config.typed_record_reuse(),
            handler,
        })))
    }

    /// Like [Self::register_typed], but takes the class name from `U`'s
    /// [crate::typed::Schema] implementation instead of a caller-supplied string.
    pub fn register_schema<U, F>(&mut self, handler: F) -> Registration
    where
        U: crate::typed::Schema + 'static,
        F: FnMut(&U, &mut Control) -> Result<()> + 'static,
    {
        self.register_typed::<U, F>(U::CLASS_NAME, handler)
    }

    /// Register the run's untyped handler.
    ///
    /// Per the dispatcher's contract there is at most one; registering a
    /// second one does not fail, but only the last registered untyped
    /// handler will receive events, since dispatch routes every non-special
    /// event to every live untyped slot.
    pub fn register_untyped<F>(&mut self, handler: F) -> Registration
    where
        F: for<'r, 'c> FnMut(&UntypedRecord<'r, 'c>, &mut Control) -> Result<()> + 'static,
    {
        self.push(SlotKind::Untyped(Box::new(UntypedSlot {
            mode: self.context.config.untyped_mode(),
            names_cache: NamesCache::default(),
            handler,
        })))
    }

    /// Remove a previously registered handler; it stops receiving events
    /// starting with the next call to [Self::run].
    pub fn detach(&mut self, registration: Registration) {
        if let Some(slot) = self.slots.get_mut(registration.0) {
            *slot = None;
        }
    }

    /// Drive the recording to completion, dispatching every decodable event
    /// to its matching registered handlers in file order.
    ///
    /// Behavior on a decode failure for a single event is governed by
    /// [crate::config::OnDecoderError]. A handler returning `Err` always
    /// aborts the run immediately, surfaced as [Error::HandlerFailed].
    pub fn run(&mut self) -> Result<()> {
        use crate::config::OnDecoderError;

        if self.closed {
            return Err(Error::ResourceClosed);
        }

        'chunks: for chunk_bytes in self.reader.all_chunks()? {
            let (_, reader) = SliceReader::new(&chunk_bytes)?;

            let metadata = reader.metadata()?;
            let fingerprint = Fingerprint::compute(&metadata);
            self.context.note_fingerprint(fingerprint);

            let resolver = match reader.resolver() {
                Ok(r) => r,
                Err(e) => match self.context.config.on_decoder_error() {
                    OnDecoderError::SkipEvent | OnDecoderError::AbortChunk => continue 'chunks,
                    OnDecoderError::AbortRun => return Err(e),
                },
            };

            let cpv = resolver.constant_pool_values()?;

            // Rebind typed decoders against this chunk's class table; a
            // class absent from this chunk's metadata simply receives no
            // events for the remainder of the chunk (§4.G contract).
            for slot in self.slots.iter_mut().flatten() {
                let slot: &mut dyn Slot = match slot {
                    SlotKind::Typed(s) => s.as_mut(),
                    SlotKind::Untyped(s) => s.as_mut(),
                };
                slot.rebind(&resolver, fingerprint, &self.context.decoder_cache);
            }

            let mut ctl = Control::for_chunk(reader.header());

            for er in reader.iter_event_records() {
                let er = er?;

                if er.is_special_event() {
                    continue;
                }

                let object = match er.resolve_object(&resolver) {
                    Ok(o) => o,
                    Err(e) => match self.context.config.on_decoder_error() {
                        OnDecoderError::SkipEvent => continue,
                        OnDecoderError::AbortChunk => continue 'chunks,
                        OnDecoderError::AbortRun => return Err(e),
                    },
                };

                for slot in self.slots.iter_mut().flatten() {
                    let slot: &mut dyn Slot = match slot {
                        SlotKind::Typed(s) => s.as_mut(),
                        SlotKind::Untyped(s) => s.as_mut(),
                    };

                    if let Err(e) = slot.dispatch(&object, &cpv, &mut ctl) {
                        return Err(Error::HandlerFailed(e.to_string()));
                    }
                }

                if ctl.is_aborted() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Release this parser's resources. Further calls to [Self::run] return
    /// [Error::ResourceClosed].
    pub fn close(&mut self) {
        self.closed = true;
    }
}

/// The fingerprint → decoder-binding cache described in SPEC_FULL.md §4.J.
///
/// Holds one `Arc<TypedBinding>` per `(fingerprint, class name)` pair ever
/// resolved through the owning [ParsingContext]. [TypedSlot::rebind] compares
/// its previous binding against the one returned here by pointer, so two
/// chunks - whether in the same recording or in different ones opened from
/// the same context - that declare a class identically share the exact same
/// `Arc<TypedBinding>` rather than merely an equal one. Per §4.J, decoder
/// sets are immutable once installed and are never evicted by the core.
pub struct DecoderCache {
    bindings: RwLock<FxHashMap<(Fingerprint, String), Arc<TypedBinding>>>,
}

impl DecoderCache {
    fn new() -> Self {
        Self {
            bindings: RwLock::new(FxHashMap::default()),
        }
    }

    /// Resolve `class_name` against `resolver`, reusing the cached binding
    /// for `fingerprint` if one was already installed. Returns `None` if
    /// `class_name` is absent from this chunk's metadata.
    fn get_or_insert<'chunk>(
        &self,
        fingerprint: Fingerprint,
        class_name: &str,
        resolver: &crate::resolver::EventResolver<'chunk>,
    ) -> Option<Arc<TypedBinding>> {
        let key = (fingerprint, class_name.to_string());

        if let Some(existing) = self.bindings.read().unwrap().get(&key) {
            return Some(existing.clone());
        }

        let binding = Arc::new(TypedBinding::resolve(resolver, class_name)?);

        // Another run on this context may have raced us between the read
        // lock above and this write lock; prefer whichever Arc landed first
        // so every slot that already observed it keeps seeing the same one.
        let mut bindings = self.bindings.write().unwrap();
        let installed = bindings.entry(key).or_insert(binding);

        Some(installed.clone())
    }
}

/// Owns the fingerprint and decoder-binding caches shared by every [Parser]
/// opened from it.
///
/// Safe to share across runs that execute serially on different threads (see
/// module docs); a single run's [Parser] itself is not `Send`/`Sync` since
/// handler closures and decoder freelists are not required to be.
pub struct ParsingContext {
    config: Config,
    seen_fingerprints: RwLock<FxHashSet<Fingerprint>>,
    decoder_cache: DecoderCache,
}

impl ParsingContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            seen_fingerprints: RwLock::new(FxHashSet::default()),
            decoder_cache: DecoderCache::new(),
        }
    }

    fn note_fingerprint(&self, fingerprint: Fingerprint) {
        if self.seen_fingerprints.read().unwrap().contains(&fingerprint) {
            log::debug!("reusing known metadata fingerprint {fingerprint:?}");
        } else {
            log::debug!("observed new metadata fingerprint {fingerprint:?}");
            self.seen_fingerprints.write().unwrap().insert(fingerprint);
        }
    }

    /// Open a parser over a readable, seekable recording stream.
    pub fn open<T: Read + Seek>(&self, stream: T) -> Result<Parser<'_, T>> {
        let reader = FileReader::from_stream(stream)?;

        Ok(Parser::new(self, reader))
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize)]
    struct TestByte {
        value: i8,
    }

    #[test]
    fn typed_handler_receives_every_event() {
        let context = ParsingContext::default();
        let input = testutil::sample_recording_bytes(3);
        let mut parser = context.open(Cursor::new(input)).unwrap();

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        parser.register_typed::<TestByte, _>("test.Byte", move |record, _ctl| {
            seen_clone.borrow_mut().push(record.value);
            Ok(())
        });

        parser.run().unwrap();

        assert_eq!(*seen.borrow(), vec![42, 42, 42]);
    }

    #[test]
    fn untyped_handler_receives_every_event() {
        let context = ParsingContext::default();
        let input = testutil::sample_recording_bytes(2);
        let mut parser = context.open(Cursor::new(input)).unwrap();

        let count = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        let count_clone = count.clone();

        parser.register_untyped(move |record, _ctl| {
            assert!(record.names().contains(&"value".to_string().into_boxed_str()));
            *count_clone.borrow_mut() += 1;
            Ok(())
        });

        parser.run().unwrap();

        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn abort_stops_further_delivery() {
        let context = ParsingContext::default();
        let input = testutil::sample_recording_bytes(3);
        let mut parser = context.open(Cursor::new(input)).unwrap();

        let count = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        let count_clone = count.clone();

        parser.register_typed::<TestByte, _>("test.Byte", move |_record, ctl| {
            *count_clone.borrow_mut() += 1;
            ctl.abort();
            Ok(())
        });

        parser.run().unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn detach_stops_a_handler_from_receiving_further_events() {
        let context = ParsingContext::default();
        let input = testutil::sample_recording_bytes(2);
        let mut parser = context.open(Cursor::new(input)).unwrap();

        let count = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        let count_clone = count.clone();

        let registration = parser.register_typed::<TestByte, _>("test.Byte", move |_record, _ctl| {
            *count_clone.borrow_mut() += 1;
            Ok(())
        });

        parser.detach(registration);
        parser.run().unwrap();

        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn decoder_cache_reuses_binding_across_matching_fingerprints() {
        use crate::chunk::{ChunkReader, SliceReader};
        use crate::fingerprint::Fingerprint;

        let data = testutil::sample_chunk_bytes();
        let (_, reader) = SliceReader::new(&data).unwrap();
        let metadata = reader.metadata().unwrap();
        let fingerprint = Fingerprint::compute(&metadata);
        let resolver = reader.resolver().unwrap();

        let cache = DecoderCache::new();

        let first = cache
            .get_or_insert(fingerprint, "test.Byte", &resolver)
            .unwrap();
        let second = cache
            .get_or_insert(fingerprint, "test.Byte", &resolver)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn typed_slot_rebind_keeps_decoder_identity_across_chunks() {
        use crate::chunk::{ChunkReader, SliceReader};
        use crate::config::TypedRecordReuse;
        use crate::fingerprint::Fingerprint;

        // Two independent chunks happen to declare identical metadata, as
        // every chunk produced by `sample_chunk_bytes` does; this mirrors
        // what `Parser::run` sees moving from one chunk to the next.
        let chunk_a = testutil::sample_chunk_bytes();
        let chunk_b = testutil::sample_chunk_bytes();

        let (_, reader_a) = SliceReader::new(&chunk_a).unwrap();
        let (_, reader_b) = SliceReader::new(&chunk_b).unwrap();

        let fingerprint_a = Fingerprint::compute(&reader_a.metadata().unwrap());
        let fingerprint_b = Fingerprint::compute(&reader_b.metadata().unwrap());
        assert_eq!(fingerprint_a, fingerprint_b);

        let resolver_a = reader_a.resolver().unwrap();
        let resolver_b = reader_b.resolver().unwrap();

        let cache = DecoderCache::new();

        let mut slot = TypedSlot::<TestByte, _> {
            class_name: "test.Byte".to_string(),
            decoder: None,
            reuse: TypedRecordReuse::Pooled,
            handler: |_record: &TestByte, _ctl: &mut Control| Ok(()),
        };

        slot.rebind(&resolver_a, fingerprint_a, &cache);
        let first_binding = slot.decoder.as_ref().unwrap().binding().clone();

        slot.rebind(&resolver_b, fingerprint_b, &cache);
        let second_binding = slot.decoder.as_ref().unwrap().binding().clone();

        assert!(Arc::ptr_eq(&first_binding, &second_binding));
    }
}
