// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Schema examples covering the constant-pool forward-reference and cycle
//! resolution scenario: a `jdk.types.ThreadGroup` that points at its own
//! parent, reached through a `jdk.types.Thread` that is itself only ever
//! seen via a constant pool reference from an event.

use crate::typed::Schema;
use serde::Deserialize;

/// Mirrors `jdk.types.ThreadGroup { parent: ThreadGroup, name: string }`.
/// A thread group's parent pointer may resolve back to the same pool entry,
/// so `parent` is boxed to give the type a finite size despite the
/// self-reference. Whether reached through [crate::value::Value::resolve_constants]
/// or decoded directly via [crate::typed::TypedDecoder], the constant pool
/// reference cycle this creates is broken by the cycle guard each resolution
/// path carries, so a self-referencing `parent` resolves to `None` rather
/// than recursing forever.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ThreadGroup {
    pub parent: Option<Box<ThreadGroup>>,
    pub name: String,
}

impl Schema for ThreadGroup {
    const CLASS_NAME: &'static str = "jdk.types.ThreadGroup";
}

/// Mirrors `jdk.types.Thread { osName: string, group: ThreadGroup }`, a
/// constant pool type that is only ever reached by reference from an event,
/// never decoded as a top-level event itself.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Thread {
    #[serde(rename = "osName")]
    pub os_name: String,
    pub group: ThreadGroup,
}

impl Schema for Thread {
    const CLASS_NAME: &'static str = "jdk.types.Thread";
}

/// An event whose only field is a pool reference into `jdk.types.Thread`,
/// exercising the full chain: event -> pool(Thread) -> pool(ThreadGroup)
/// -> pool(ThreadGroup) (parent, possibly itself).
#[derive(Clone, Debug, Deserialize)]
pub struct ThreadStart {
    pub thread: Thread,
}

impl Schema for ThreadStart {
    const CLASS_NAME: &'static str = "jdk.ThreadStart";
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn class_names_match_metadata_convention() {
        assert_eq!(ThreadGroup::CLASS_NAME, "jdk.types.ThreadGroup");
        assert_eq!(Thread::CLASS_NAME, "jdk.types.Thread");
        assert_eq!(ThreadStart::CLASS_NAME, "jdk.ThreadStart");
    }

    #[test]
    fn thread_group_can_be_its_own_parent() {
        let root = ThreadGroup {
            parent: None,
            name: "root".to_string(),
        };
        let cycled = ThreadGroup {
            parent: Some(Box::new(root.clone())),
            name: "root".to_string(),
        };
        assert_eq!(cycled.parent.as_deref(), Some(&root));
    }
}
