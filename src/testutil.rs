// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hand-built recording bytes for tests and benchmarks.
//!
//! There's no bundled `.jfr` fixture in this crate, so tests and benchmarks
//! that need real chunk bytes build them here instead of parsing one. This
//! module is public (but hidden from docs) so `benches/` can reach it too.

#![doc(hidden)]

fn write_leb128(buf: &mut Vec<u8>, v: i64) {
    let mut v = v as u64;

    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;

        if v != 0 {
            buf.push(byte | 0x80);
        } else {
            buf.push(byte);
            break;
        }
    }
}

fn write_utf8_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(3); // Encoding::Utf8ByteArray
    write_leb128(buf, s.len() as i64);
    buf.extend_from_slice(s.as_bytes());
}

/// Prefix `event_type` and `body` with a self-consistent LEB-128 size field.
///
/// The size field's own encoded length depends on the total length, which
/// depends on the size field's length; this just iterates the two or three
/// times that takes to settle.
fn size_prefixed(event_type: i64, body: &[u8]) -> Vec<u8> {
    let mut type_buf = Vec::new();
    write_leb128(&mut type_buf, event_type);

    let mut size_len = 1usize;

    loop {
        let total = size_len + type_buf.len() + body.len();

        let mut size_buf = Vec::new();
        write_leb128(&mut size_buf, total as i64);

        if size_buf.len() == size_len {
            let mut out = Vec::with_capacity(total);
            out.extend_from_slice(&size_buf);
            out.extend_from_slice(&type_buf);
            out.extend_from_slice(body);
            return out;
        }

        size_len = size_buf.len();
    }
}

struct Element {
    name_index: i32,
    attributes: Vec<(i32, i32)>,
    children: Vec<Element>,
}

impl Element {
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        write_leb128(&mut buf, self.name_index as i64);
        write_leb128(&mut buf, self.attributes.len() as i64);

        for (k, v) in &self.attributes {
            write_leb128(&mut buf, *k as i64);
            write_leb128(&mut buf, *v as i64);
        }

        write_leb128(&mut buf, self.children.len() as i64);

        for child in &self.children {
            buf.extend(child.encode());
        }

        buf
    }
}

/// Build the bytes of one chunk declaring `test.Byte { value: byte }` and a
/// single instance of it with `value == 42`.
///
/// This is scenario 1 described for the typed projector: a trivial,
/// constant-pool-free event with one primitive field.
pub fn sample_chunk_bytes() -> Vec<u8> {
    sample_chunk_bytes_with_values(&[42])
}

/// Like [sample_chunk_bytes], but emits one `test.Byte` event per entry of
/// `values` instead of a single hardcoded `42`, so callers can exercise
/// behavior that only shows up across multiple records of the same class.
pub fn sample_chunk_bytes_with_values(values: &[i8]) -> Vec<u8> {
    // String table. Index 0 is conventionally the null entry; the rest are
    // inline UTF-8 strings referenced by index from the element tree below.
    let strings = [
        "class",     // 1: element name
        "field",     // 2: element name
        "metadata",  // 3: element name
        "region",    // 4: element name
        "root",      // 5: element name
        "name",      // 6: attribute key
        "id",        // 7: attribute key
        "class",     // 8: attribute key (field's type reference)
        "byte",      // 9: class name value
        "1",         // 10: class id value (also used as field's type id)
        "test.Byte", // 11: class name value
        "2",         // 12: class id value
        "value",     // 13: field name value
        "locale",    // 14: attribute key
        "gmtOffset", // 15: attribute key
        "und",       // 16: locale value
        "0",         // 17: gmtOffset value (UTC)
    ];

    let mut string_table = Vec::new();
    string_table.push(0u8); // Encoding::Null
    for s in strings {
        write_utf8_string(&mut string_table, s);
    }

    let field_value = Element {
        name_index: 2,
        attributes: vec![(6, 13), (8, 10)],
        children: vec![],
    };

    let class_byte = Element {
        name_index: 1,
        attributes: vec![(6, 9), (7, 10)],
        children: vec![],
    };

    let class_test_byte = Element {
        name_index: 1,
        attributes: vec![(6, 11), (7, 12)],
        children: vec![field_value],
    };

    let metadata = Element {
        name_index: 3,
        attributes: vec![],
        children: vec![class_byte, class_test_byte],
    };

    let region = Element {
        name_index: 4,
        attributes: vec![(14, 16), (15, 17)],
        children: vec![],
    };

    let root = Element {
        name_index: 5,
        attributes: vec![],
        children: vec![metadata, region],
    };

    let root_bytes = root.encode();

    let mut metadata_body = Vec::new();
    write_leb128(&mut metadata_body, 0); // start_time_nanoseconds
    write_leb128(&mut metadata_body, 0); // duration_nanoseconds
    write_leb128(&mut metadata_body, 0); // metadata_id
    write_leb128(&mut metadata_body, (strings.len() + 1) as i64); // string_count
    metadata_body.extend(string_table);
    metadata_body.extend(root_bytes);

    let metadata_event = size_prefixed(0, &metadata_body);

    // Each `test.Byte` (class id 2) event carries a single raw (non-LEB128)
    // byte field.
    let mut events = Vec::new();
    events.extend(metadata_event);

    for &value in values {
        events.extend(size_prefixed(2, &[value as u8]));
    }

    const HEADER_SIZE: u64 = 68;
    let chunk_size = HEADER_SIZE + events.len() as u64;

    let mut header = Vec::with_capacity(HEADER_SIZE as usize);
    header.extend_from_slice(b"FLR\0");
    header.extend_from_slice(&2u16.to_be_bytes()); // major
    header.extend_from_slice(&1u16.to_be_bytes()); // minor
    header.extend_from_slice(&chunk_size.to_be_bytes());
    header.extend_from_slice(&0u64.to_be_bytes()); // constant_pool_position (none)
    header.extend_from_slice(&HEADER_SIZE.to_be_bytes()); // metadata_position
    header.extend_from_slice(&1_700_000_000_000_000_000u64.to_be_bytes()); // nanoseconds_since_epoch
    header.extend_from_slice(&0u64.to_be_bytes()); // duration_nanoseconds
    header.extend_from_slice(&0u64.to_be_bytes()); // start_ticks
    header.extend_from_slice(&1_000_000_000u64.to_be_bytes()); // ticks_per_second
    header.extend_from_slice(&0u32.to_be_bytes()); // state_and_flags

    assert_eq!(header.len() as u64, HEADER_SIZE);

    let mut chunk = header;
    chunk.extend(events);

    chunk
}

/// Prefix a checkpoint/constant-pool body with a self-consistent header.
///
/// Mirrors [size_prefixed], but a checkpoint record's header carries more
/// fixed fields (type ID, timestamp, duration, delta, mask, pool count)
/// between the size field and the pool data than a plain event does.
fn checkpoint_event_bytes(pool_count: i32, pool_data: &[u8]) -> Vec<u8> {
    let mut fixed = Vec::new();
    write_leb128(&mut fixed, crate::event::EVENT_TYPE_CONSTANT_POOL); // type_id
    write_leb128(&mut fixed, 0); // timestamp
    write_leb128(&mut fixed, 0); // duration
    write_leb128(&mut fixed, 0); // delta: no earlier checkpoint to chain to
    fixed.push(0); // mask: CheckpointType::GENERIC
    write_leb128(&mut fixed, pool_count as i64);

    let mut size_len = 1usize;

    loop {
        let total = size_len + fixed.len() + pool_data.len();

        let mut size_buf = Vec::new();
        write_leb128(&mut size_buf, total as i64);

        if size_buf.len() == size_len {
            let mut out = Vec::with_capacity(total);
            out.extend_from_slice(&size_buf);
            out.extend_from_slice(&fixed);
            out.extend_from_slice(pool_data);
            return out;
        }

        size_len = size_buf.len();
    }
}

fn write_inline_utf8_field(buf: &mut Vec<u8>, s: &str) {
    buf.push(3); // Encoding::Utf8ByteArray
    write_leb128(buf, s.len() as i64);
    buf.extend_from_slice(s.as_bytes());
}

/// Build the bytes of one chunk declaring the constant-pool forward-reference
/// and cycle scenario covered by [crate::types::openjdk21]:
/// `jdk.ThreadStart { thread: Thread }`, `jdk.types.Thread { osName: string,
/// group: ThreadGroup }`, `jdk.types.ThreadGroup { parent: ThreadGroup, name:
/// string }`. The checkpoint declares one `Thread` pool entry (forward
/// reference: the event only carries a pool index, resolved lazily) whose
/// `group` in turn references a `ThreadGroup` pool entry that is its own
/// `parent` (a cycle).
pub fn sample_chunk_with_thread_checkpoint() -> Vec<u8> {
    let strings = [
        "class",                 // 1: element name
        "field",                 // 2: element name
        "metadata",              // 3: element name
        "region",                // 4: element name
        "root",                  // 5: element name
        "name",                  // 6: attribute key / field name value
        "id",                    // 7: attribute key
        "class",                 // 8: attribute key (field's type reference)
        "constantPool",          // 9: attribute key
        "simpleType",            // 10: attribute key
        "true",                  // 11: generic flag value
        "java.lang.String",      // 12: class name
        "1",                     // 13: class id (String)
        "jdk.types.ThreadGroup", // 14: class name
        "2",                     // 15: class id (ThreadGroup)
        "parent",                // 16: field name
        "jdk.types.Thread",      // 17: class name
        "3",                     // 18: class id (Thread)
        "osName",                // 19: field name
        "group",                 // 20: field name
        "jdk.ThreadStart",       // 21: class name
        "4",                     // 22: class id (ThreadStart)
        "thread",                // 23: field name
        "locale",                // 24: attribute key
        "gmtOffset",             // 25: attribute key
        "und",                   // 26: locale value
        "0",                     // 27: gmtOffset value (UTC)
    ];

    let mut string_table = Vec::new();
    string_table.push(0u8); // Encoding::Null
    for s in strings {
        write_utf8_string(&mut string_table, s);
    }

    let field_parent = Element {
        name_index: 2,
        attributes: vec![(6, 16), (8, 15), (9, 11)],
        children: vec![],
    };
    let field_tg_name = Element {
        name_index: 2,
        attributes: vec![(6, 6), (8, 13)],
        children: vec![],
    };
    let class_thread_group = Element {
        name_index: 1,
        attributes: vec![(6, 14), (7, 15)],
        children: vec![field_parent, field_tg_name],
    };

    let class_string = Element {
        name_index: 1,
        attributes: vec![(6, 12), (7, 13), (10, 11)],
        children: vec![],
    };

    let field_osname = Element {
        name_index: 2,
        attributes: vec![(6, 19), (8, 13)],
        children: vec![],
    };
    let field_group = Element {
        name_index: 2,
        attributes: vec![(6, 20), (8, 15), (9, 11)],
        children: vec![],
    };
    let class_thread = Element {
        name_index: 1,
        attributes: vec![(6, 17), (7, 18)],
        children: vec![field_osname, field_group],
    };

    let field_thread = Element {
        name_index: 2,
        attributes: vec![(6, 23), (8, 18), (9, 11)],
        children: vec![],
    };
    let class_thread_start = Element {
        name_index: 1,
        attributes: vec![(6, 21), (7, 22)],
        children: vec![field_thread],
    };

    let metadata = Element {
        name_index: 3,
        attributes: vec![],
        children: vec![
            class_string,
            class_thread_group,
            class_thread,
            class_thread_start,
        ],
    };

    let region = Element {
        name_index: 4,
        attributes: vec![(24, 26), (25, 27)],
        children: vec![],
    };

    let root = Element {
        name_index: 5,
        attributes: vec![],
        children: vec![metadata, region],
    };

    let root_bytes = root.encode();

    let mut metadata_body = Vec::new();
    write_leb128(&mut metadata_body, 0); // start_time_nanoseconds
    write_leb128(&mut metadata_body, 0); // duration_nanoseconds
    write_leb128(&mut metadata_body, 0); // metadata_id
    write_leb128(&mut metadata_body, (strings.len() + 1) as i64); // string_count
    metadata_body.extend(string_table);
    metadata_body.extend(root_bytes);

    let metadata_event = size_prefixed(0, &metadata_body);

    // Thread pool entry at index 1: osName (inline string), then group (a
    // constant pool reference into ThreadGroup at index 1).
    let mut thread_value = Vec::new();
    write_inline_utf8_field(&mut thread_value, "main");
    write_leb128(&mut thread_value, 1); // group -> ThreadGroup pool index 1

    let mut thread_class_data = Vec::new();
    write_leb128(&mut thread_class_data, 3); // class id
    write_leb128(&mut thread_class_data, 1); // constant_count
    write_leb128(&mut thread_class_data, 1); // pool index
    thread_class_data.extend(thread_value);

    // ThreadGroup pool entry at index 1: parent is a reference back to this
    // same entry (index 1), then an inline name.
    let mut thread_group_value = Vec::new();
    write_leb128(&mut thread_group_value, 1); // parent -> ThreadGroup pool index 1 (self)
    write_inline_utf8_field(&mut thread_group_value, "main-group");

    let mut thread_group_class_data = Vec::new();
    write_leb128(&mut thread_group_class_data, 2); // class id
    write_leb128(&mut thread_group_class_data, 1); // constant_count
    write_leb128(&mut thread_group_class_data, 1); // pool index
    thread_group_class_data.extend(thread_group_value);

    let mut pool_data = Vec::new();
    pool_data.extend(thread_class_data);
    pool_data.extend(thread_group_class_data);

    let checkpoint_event = checkpoint_event_bytes(2, &pool_data);

    // The sole event: a `jdk.ThreadStart` (class id 4) whose `thread` field
    // is a constant pool reference to the Thread entry above.
    let mut thread_start_body = Vec::new();
    write_leb128(&mut thread_start_body, 1); // thread -> Thread pool index 1
    let thread_start_event = size_prefixed(4, &thread_start_body);

    let mut events = Vec::new();
    events.extend(&metadata_event);
    events.extend(&checkpoint_event);
    events.extend(&thread_start_event);

    const HEADER_SIZE: u64 = 68;
    let chunk_size = HEADER_SIZE + events.len() as u64;
    let constant_pool_position = HEADER_SIZE + metadata_event.len() as u64;

    let mut header = Vec::with_capacity(HEADER_SIZE as usize);
    header.extend_from_slice(b"FLR\0");
    header.extend_from_slice(&2u16.to_be_bytes()); // major
    header.extend_from_slice(&1u16.to_be_bytes()); // minor
    header.extend_from_slice(&chunk_size.to_be_bytes());
    header.extend_from_slice(&constant_pool_position.to_be_bytes());
    header.extend_from_slice(&HEADER_SIZE.to_be_bytes()); // metadata_position
    header.extend_from_slice(&1_700_000_000_000_000_000u64.to_be_bytes()); // nanoseconds_since_epoch
    header.extend_from_slice(&0u64.to_be_bytes()); // duration_nanoseconds
    header.extend_from_slice(&0u64.to_be_bytes()); // start_ticks
    header.extend_from_slice(&1_000_000_000u64.to_be_bytes()); // ticks_per_second
    header.extend_from_slice(&0u32.to_be_bytes()); // state_and_flags

    assert_eq!(header.len() as u64, HEADER_SIZE);

    let mut chunk = header;
    chunk.extend(events);

    chunk
}

/// Build a tiny recording consisting of [sample_chunk_bytes] repeated `n` times.
pub fn sample_recording_bytes(n: usize) -> Vec<u8> {
    let mut out = Vec::new();

    for _ in 0..n {
        out.extend(sample_chunk_bytes());
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        chunk::{ChunkReader, SliceReader},
        event::ChunkEvent,
    };

    #[test]
    fn sample_chunk_decodes_expected_value() {
        let data = sample_chunk_bytes();
        let (remaining, reader) = SliceReader::new(&data).unwrap();

        assert!(remaining.is_empty());

        let resolver = reader.resolver().unwrap();
        let cpv = resolver.constant_pool_values().unwrap();

        let mut saw_value = false;

        for er in reader.iter_event_records() {
            let er = er.unwrap();

            if er.is_special_event() {
                continue;
            }

            let event = er.resolve_event(&resolver, &cpv).unwrap();
            let value = event.get("value").unwrap();
            let value = value.resolve_constants(&cpv);

            assert_eq!(value.as_primitive().unwrap().as_byte(), Some(42));
            saw_value = true;
        }

        assert!(saw_value);
    }
}
