// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Schema examples covering the trivial and raw-pool-index typed projector
//! scenarios: a single-field primitive event, and an event with a
//! pool-flagged field read as a [RawConstantPoolIndex] instead of being
//! resolved.

use crate::typed::{RawConstantPoolIndex, Schema};
use serde::Deserialize;

/// Mirrors the metadata class `test.Byte { value: byte }`: the simplest
/// possible event, with one primitive field and no constant pool
/// involvement at all.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TestByte {
    pub value: i8,
}

impl Schema for TestByte {
    const CLASS_NAME: &'static str = "test.Byte";
}

/// A stack sampling event. `stack_trace` is bound `raw`: the handler gets
/// the constant pool index that was on the wire for the `stackTrace` field
/// rather than the resolved `jdk.types.StackTrace` value, which is useful
/// when the caller wants to deduplicate or defer stack trace resolution.
#[derive(Clone, Debug, Deserialize)]
pub struct ExecutionSample {
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "sampledThread")]
    pub sampled_thread: RawConstantPoolIndex,
    #[serde(rename = "stackTrace")]
    pub stack_trace: RawConstantPoolIndex,
    pub state: RawConstantPoolIndex,
}

impl Schema for ExecutionSample {
    const CLASS_NAME: &'static str = "jdk.ExecutionSample";
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn class_names_match_metadata_convention() {
        assert_eq!(TestByte::CLASS_NAME, "test.Byte");
        assert_eq!(ExecutionSample::CLASS_NAME, "jdk.ExecutionSample");
    }
}
