// Copyright 2023 Gregory Szorc.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing configuration.

/// Strategy for materializing fields in the untyped projection path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UntypedMode {
    /// Decode every field of every event immediately.
    Eager,
    /// Decode compound fields on first access; cache the result.
    Lazy,
    /// Only decode fields the handler actually asks for.
    Sparse,
}

impl Default for UntypedMode {
    fn default() -> Self {
        Self::Lazy
    }
}

/// Recovery policy when an individual event fails to decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OnDecoderError {
    /// Skip the offending event and continue with the rest of the chunk.
    SkipEvent,
    /// Abandon the remainder of the current chunk, continue with the next.
    AbortChunk,
    /// Abandon the entire run.
    AbortRun,
}

impl Default for OnDecoderError {
    fn default() -> Self {
        Self::SkipEvent
    }
}

/// Whether typed records are recycled between events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypedRecordReuse {
    /// Reuse a per-thread freelist of records across events.
    Pooled,
    /// Allocate a fresh record for every event.
    Fresh,
}

impl Default for TypedRecordReuse {
    fn default() -> Self {
        Self::Pooled
    }
}

/// Tunables that govern how a [crate::dispatch::ParsingContext] decodes a recording.
///
/// Constructed via [ConfigBuilder] and immutable for the lifetime of the
/// context it is passed to.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) untyped_mode: UntypedMode,
    pub(crate) on_decoder_error: OnDecoderError,
    pub(crate) typed_record_reuse: TypedRecordReuse,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            untyped_mode: UntypedMode::default(),
            on_decoder_error: OnDecoderError::default(),
            typed_record_reuse: TypedRecordReuse::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn untyped_mode(&self) -> UntypedMode {
        self.untyped_mode
    }

    pub fn on_decoder_error(&self) -> OnDecoderError {
        self.on_decoder_error
    }

    pub fn typed_record_reuse(&self) -> TypedRecordReuse {
        self.typed_record_reuse
    }
}

/// Fluent builder for [Config].
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn untyped_mode(mut self, v: UntypedMode) -> Self {
        self.config.untyped_mode = v;
        self
    }

    pub fn on_decoder_error(mut self, v: OnDecoderError) -> Self {
        self.config.on_decoder_error = v;
        self
    }

    pub fn typed_record_reuse(mut self, v: TypedRecordReuse) -> Self {
        self.config.typed_record_reuse = v;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_defaults_match_config_default() {
        let built = Config::builder().build();
        let default = Config::default();

        assert_eq!(built.untyped_mode(), default.untyped_mode());
        assert_eq!(built.on_decoder_error(), default.on_decoder_error());
        assert_eq!(built.typed_record_reuse(), default.typed_record_reuse());
    }

    #[test]
    fn builder_overrides_apply() {
        let config = Config::builder()
            .untyped_mode(UntypedMode::Eager)
            .on_decoder_error(OnDecoderError::AbortRun)
            .typed_record_reuse(TypedRecordReuse::Fresh)
            .build();

        assert_eq!(config.untyped_mode(), UntypedMode::Eager);
        assert_eq!(config.on_decoder_error(), OnDecoderError::AbortRun);
        assert_eq!(config.typed_record_reuse(), TypedRecordReuse::Fresh);
    }
}
