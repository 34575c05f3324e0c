//! State shared by every command handler.

use morgen_core::ids::{self, CalendarKey, EventKey};
use morgen_core::{BatchExecutor, IdRegistry, MorgenClient, MorgenConfig, MorgenResult};

/// Built once at startup and passed by reference to every handler.
#[derive(Debug)]
pub struct Bridge {
    pub client: MorgenClient,
    pub registry: IdRegistry,
    pub batch: BatchExecutor,
}

/// An event addressed by a virtual ID, with its owners derived from the upstream ID.
#[derive(Debug, Clone)]
pub struct ResolvedEvent {
    pub event_id: String,
    pub calendar_id: String,
    pub account_id: String,
}

impl ResolvedEvent {
    fn from_upstream(event_id: String, key: EventKey) -> Self {
        ResolvedEvent {
            calendar_id: ids::encode_calendar_id(&key.calendar()),
            account_id: key.account_id,
            event_id,
        }
    }
}

impl Bridge {
    pub fn new(client: MorgenClient, registry: IdRegistry, batch: BatchExecutor) -> Self {
        Bridge {
            client,
            registry,
            batch,
        }
    }

    pub fn from_config(config: &MorgenConfig) -> MorgenResult<Self> {
        Ok(Bridge::new(
            MorgenClient::from_config(config)?,
            IdRegistry::new(),
            BatchExecutor::new(config.batch_concurrency),
        ))
    }

    /// Upstream calendar ID behind `virtual_id`, plus the fields it embeds.
    pub fn resolve_calendar(&self, virtual_id: &str) -> MorgenResult<(String, CalendarKey)> {
        let calendar_id = self.registry.resolve(virtual_id)?;
        let key = ids::decode_calendar_id(&calendar_id)?;
        Ok((calendar_id, key))
    }

    pub fn resolve_event(&self, virtual_id: &str) -> MorgenResult<ResolvedEvent> {
        let event_id = self.registry.resolve(virtual_id)?;
        let key = ids::decode_event_id(&event_id)?;
        tracing::trace!(virtual_id, event_id = %event_id, "resolved event");
        Ok(ResolvedEvent::from_upstream(event_id, key))
    }
}
