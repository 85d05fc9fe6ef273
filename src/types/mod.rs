// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hand-authored [crate::typed::Schema] examples exercising the typed projector.
//!
//! These are not generated from a JFR metadata.xml; each schema struct here
//! is written by hand against one of the metadata shapes this crate expects
//! to see on the wire, to exercise [crate::value::Value::deserialize_enum]
//! and [crate::typed::TypedDecoder] end to end.

#[cfg(feature = "openjdk17")]
pub mod openjdk17;
#[cfg(feature = "openjdk21")]
pub mod openjdk21;
