pub mod codec;
pub mod registry;

pub use codec::{
    CalendarKey, EventKey, UpstreamId, decode_calendar_id, decode_event_id, derive_account_id,
    derive_calendar_id, encode_calendar_id, encode_event_id, is_account_id,
};
pub use registry::{IdRegistry, RandomTokens, TokenSource, VIRTUAL_ID_LEN, VirtualId};
