//! The per-event record threaded through the middleware chain.

use anyhow::ensure;
use chat_platform::{ChannelSettings, ChatEvent};
use usage_resolver::ResolvedArgs;

/// Accumulates state as an inbound event moves through the pipeline.
/// Created fresh per event, discarded once dispatch completes.
#[derive(Debug)]
pub struct Container {
    pub event: ChatEvent,
    /// Whether the event happened outside any guild.
    pub is_private: bool,
    /// Settings for the event's channel, populated by the settings step.
    pub settings: ChannelSettings,
    trigger: Option<String>,
    /// Tokens after the trigger, before resolution.
    pub raw_args: Vec<String>,
    /// Typed arguments, populated once resolution succeeds.
    pub args: ResolvedArgs,
}

impl Container {
    pub fn new(event: ChatEvent) -> Self {
        let is_private = event.is_private();
        Self {
            event,
            is_private,
            settings: ChannelSettings::default(),
            trigger: None,
            raw_args: Vec::new(),
            args: ResolvedArgs::new(),
        }
    }

    /// Record the parsed trigger, normalized to lowercase.
    ///
    /// Exactly one middleware step may do this; a second call is a
    /// middleware-programming fault and aborts the chain.
    pub fn set_trigger(&mut self, trigger: impl Into<String>) -> anyhow::Result<()> {
        ensure!(
            self.trigger.is_none(),
            "container trigger may only be set once"
        );
        self.trigger = Some(trigger.into().to_lowercase());
        Ok(())
    }

    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
    }
}
