// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{criterion_group, criterion_main, Criterion};
use jfr_stream::{
    chunk::{ChunkReader, SliceReader},
    error::Result,
    event::ChunkEvent,
    recording::FileReader,
    testutil,
};
use serde::Deserialize;
use std::{io::Cursor, time::Duration};

#[derive(Debug, Deserialize)]
struct TestByte {
    value: i8,
}

fn read_chunks(data: &[u8]) -> Result<()> {
    let mut fr = FileReader::from_stream(Cursor::new(data))?;

    while fr.next_chunk_data()?.is_some() {}

    Ok(())
}

fn read_resolver(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;
        let _ = reader.resolver()?;
    }

    Ok(())
}

fn read_constant_pool_values(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;
        let resolver = reader.resolver()?;
        let _ = resolver.constant_pool_values()?;
    }

    Ok(())
}

fn read_metadata(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;
        let _ = reader.metadata()?;
    }

    Ok(())
}

fn iter_event_records(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        for er in reader.iter_event_records() {
            er?;
        }
    }

    Ok(())
}

fn events_fields_data(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        for er in reader.iter_event_records() {
            let _ = er?.fields_data()?;
        }
    }

    Ok(())
}

fn events_start_duration(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        for er in reader.iter_event_records() {
            let _ = er?.start_duration()?;
        }
    }

    Ok(())
}

fn events_date_time(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        let resolver = reader.resolver()?;
        let tr = resolver.time_resolver();

        for er in reader.iter_event_records() {
            let er = er?;

            tr.date_time(er.start_ticks()?);
        }
    }

    Ok(())
}

fn events_value(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        let resolver = reader.resolver()?;

        for er in reader.iter_event_records() {
            let er = er?;

            if er.is_special_event() {
                continue;
            }

            let _ = er.resolve_value(&resolver)?;
        }
    }

    Ok(())
}

fn events_resolve_enum(chunks: &[Vec<u8>]) -> Result<()> {
    for chunk in chunks {
        let reader = SliceReader::new(chunk)?.1;

        let resolver = reader.resolver()?;
        let cpv = resolver.constant_pool_values()?;

        for er in reader.iter_event_records() {
            let er = er?;

            if er.is_special_event() {
                continue;
            }

            let v = er.resolve_value(&resolver)?;
            let _: Result<TestByte> = v.deserialize_enum(&cpv);
        }
    }

    Ok(())
}

/// There's no bundled `.jfr` fixture in this crate (see [testutil]), so this
/// benchmark runs over a synthetic recording built at bench time instead of
/// a file on disk. It still exercises the full chunk/metadata/constant-pool/
/// event decode path end to end, just over a much smaller input.
pub fn bench_sample_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample-recording");

    let input = testutil::sample_recording_bytes(256);

    let mut fr = FileReader::from_stream(Cursor::new(input.as_slice())).unwrap();
    let chunks = fr.all_chunks().unwrap();

    group.bench_function("read-chunks", |b| {
        b.iter(|| read_chunks(input.as_slice()).unwrap())
    });
    group.bench_function("read-resolver", |b| {
        b.iter(|| read_resolver(&chunks).unwrap())
    });
    group.bench_function("read-constant-pool-values", |b| {
        b.iter(|| read_constant_pool_values(&chunks).unwrap())
    });
    group.bench_function("read-metadata", |b| {
        b.iter(|| read_metadata(&chunks).unwrap())
    });
    group.bench_function("iter-event-records", |b| {
        b.iter(|| iter_event_records(&chunks).unwrap())
    });
    group.bench_function("events-fields-data", |b| {
        b.iter(|| events_fields_data(&chunks).unwrap())
    });
    group.bench_function("events-start-duration", |b| {
        b.iter(|| events_start_duration(&chunks).unwrap())
    });
    group.bench_function("events-date-time", |b| {
        b.iter(|| events_date_time(&chunks).unwrap())
    });
    group.bench_function("events-value", |b| {
        b.iter(|| events_value(&chunks).unwrap())
    });
    group.bench_function("events-resolve-enum", |b| {
        b.iter(|| events_resolve_enum(&chunks).unwrap())
    });

    group.finish();
}

criterion_group! {
    name = sample_recording;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2));
    targets = bench_sample_recording,
}
criterion_main!(sample_recording);
