//! Morgen's composite identifiers.
//!
//! Calendar and event IDs are base64-encoded JSON arrays that embed their
//! owners, so an event ID alone is enough to address its account and
//! calendar:
//!
//! - account:  24 hex characters, e.g. `507f1f77bcf86cd799439011`
//! - calendar: `base64(["<accountId>", "<calendarEmail>"])`
//! - event:    `base64(["<calendarEmail>", "<eventUid>", "<accountId>"])`
//!
//! Encoding produces the canonical form: compact JSON, standard alphabet,
//! no padding. Decoding accepts padded and unpadded input.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{MorgenError, MorgenResult};

const ACCOUNT_ID_LEN: usize = 24;

const ID_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The fields embedded in a calendar ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalendarKey {
    pub account_id: String,
    pub calendar_email: String,
}

/// The fields embedded in an event ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub calendar_email: String,
    pub event_uid: String,
    pub account_id: String,
}

impl EventKey {
    pub fn calendar(&self) -> CalendarKey {
        CalendarKey {
            account_id: self.account_id.clone(),
            calendar_email: self.calendar_email.clone(),
        }
    }
}

/// Any upstream identifier, decoded into its structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamId {
    Account(String),
    Calendar(CalendarKey),
    Event(EventKey),
}

impl UpstreamId {
    /// Classify and decode an upstream identifier.
    pub fn decode(id: &str) -> MorgenResult<Self> {
        if is_account_id(id) {
            return Ok(UpstreamId::Account(id.to_string()));
        }

        let mut parts = decode_parts(id)?;
        match parts.len() {
            2 => {
                let calendar_email = parts.pop().unwrap_or_default();
                let account_id = parts.pop().unwrap_or_default();
                Ok(UpstreamId::Calendar(CalendarKey {
                    account_id,
                    calendar_email,
                }))
            }
            3 => {
                let account_id = parts.pop().unwrap_or_default();
                let event_uid = parts.pop().unwrap_or_default();
                let calendar_email = parts.pop().unwrap_or_default();
                Ok(UpstreamId::Event(EventKey {
                    calendar_email,
                    event_uid,
                    account_id,
                }))
            }
            n => Err(MorgenError::MalformedId(format!(
                "'{}' decodes to {} elements, expected an account, calendar or event ID",
                id, n
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            UpstreamId::Account(id) => id.clone(),
            UpstreamId::Calendar(key) => encode_calendar_id(key),
            UpstreamId::Event(key) => encode_event_id(key),
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            UpstreamId::Account(id) => id,
            UpstreamId::Calendar(key) => &key.account_id,
            UpstreamId::Event(key) => &key.account_id,
        }
    }
}

/// Whether `id` has the flat account ID shape (24 hex characters).
pub fn is_account_id(id: &str) -> bool {
    id.len() == ACCOUNT_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn decode_calendar_id(id: &str) -> MorgenResult<CalendarKey> {
    let parts = decode_parts(id)?;
    match <[String; 2]>::try_from(parts) {
        Ok([account_id, calendar_email]) => Ok(CalendarKey {
            account_id,
            calendar_email,
        }),
        Err(parts) => Err(MorgenError::MalformedId(format!(
            "calendar ID '{}' decodes to {} elements, expected 2",
            id,
            parts.len()
        ))),
    }
}

pub fn encode_calendar_id(key: &CalendarKey) -> String {
    encode_parts(&[&key.account_id, &key.calendar_email])
}

pub fn decode_event_id(id: &str) -> MorgenResult<EventKey> {
    let parts = decode_parts(id)?;
    match <[String; 3]>::try_from(parts) {
        Ok([calendar_email, event_uid, account_id]) => Ok(EventKey {
            calendar_email,
            event_uid,
            account_id,
        }),
        Err(parts) => Err(MorgenError::MalformedId(format!(
            "event ID '{}' decodes to {} elements, expected 3",
            id,
            parts.len()
        ))),
    }
}

pub fn encode_event_id(key: &EventKey) -> String {
    encode_parts(&[&key.calendar_email, &key.event_uid, &key.account_id])
}

/// Account ID embedded in (or equal to) any upstream ID.
pub fn derive_account_id(id: &str) -> MorgenResult<String> {
    Ok(UpstreamId::decode(id)?.account_id().to_string())
}

/// Calendar ID of the calendar an event belongs to, rebuilt from the event ID.
pub fn derive_calendar_id(event_id: &str) -> MorgenResult<String> {
    let key = decode_event_id(event_id)?;
    Ok(encode_calendar_id(&key.calendar()))
}

fn decode_parts(id: &str) -> MorgenResult<Vec<String>> {
    let bytes = ID_ENGINE
        .decode(id.trim())
        .map_err(|e| MorgenError::MalformedId(format!("'{}' is not valid base64: {}", id, e)))?;

    serde_json::from_slice::<Vec<String>>(&bytes).map_err(|e| {
        MorgenError::MalformedId(format!("'{}' is not an encoded list of strings: {}", id, e))
    })
}

fn encode_parts(parts: &[&String]) -> String {
    // Serializing a list of strings cannot fail.
    let json = serde_json::to_vec(parts).unwrap_or_default();
    ID_ENGINE.encode(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "507f1f77bcf86cd799439011";
    const EVENT_ID: &str =
        "WyJ1c2VyQGV4YW1wbGUuY29tIiwiZXZ0XzEyMzQ1Njc4OTAiLCI1MDdmMWY3N2JjZjg2Y2Q3OTk0MzkwMTEiXQ";
    const CALENDAR_ID: &str = "WyI1MDdmMWY3N2JjZjg2Y2Q3OTk0MzkwMTEiLCJ1c2VyQGV4YW1wbGUuY29tIl0";

    #[test]
    fn test_decode_event_id_scenario() {
        let key = decode_event_id(EVENT_ID).unwrap();
        assert_eq!(key.account_id, ACCOUNT);
        assert_eq!(key.calendar_email, "user@example.com");
        assert_eq!(key.event_uid, "evt_1234567890");

        assert_eq!(derive_calendar_id(EVENT_ID).unwrap(), CALENDAR_ID);
        assert_eq!(derive_account_id(EVENT_ID).unwrap(), ACCOUNT);
    }

    #[test]
    fn test_decode_accepts_padded_tokens() {
        let padded = format!("{}=", CALENDAR_ID);
        let key = decode_calendar_id(&padded).unwrap();
        assert_eq!(key.account_id, ACCOUNT);
        assert_eq!(encode_calendar_id(&key), CALENDAR_ID);
    }

    #[test]
    fn test_roundtrip_each_shape() {
        for token in [ACCOUNT, CALENDAR_ID, EVENT_ID] {
            let decoded = UpstreamId::decode(token).unwrap();
            assert_eq!(decoded.encode(), token);
        }

        let key = EventKey {
            calendar_email: "team+ops@example.org".into(),
            event_uid: "7kukuqrfedlm2f9t0vr42q9t1c_20250320T150000Z".into(),
            account_id: "640a62c9aa5b7e06cf420000".into(),
        };
        assert_eq!(decode_event_id(&encode_event_id(&key)).unwrap(), key);
        assert_eq!(
            decode_calendar_id(&encode_calendar_id(&key.calendar())).unwrap(),
            key.calendar()
        );
    }

    #[test]
    fn test_derivation_agrees_with_full_decode() {
        let calendar = decode_calendar_id(CALENDAR_ID).unwrap();
        assert_eq!(derive_account_id(CALENDAR_ID).unwrap(), calendar.account_id);
        assert_eq!(derive_account_id(ACCOUNT).unwrap(), ACCOUNT);

        match UpstreamId::decode(EVENT_ID).unwrap() {
            UpstreamId::Event(key) => {
                assert_eq!(encode_calendar_id(&key.calendar()), derive_calendar_id(EVENT_ID).unwrap())
            }
            other => panic!("expected an event ID, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        // ["a"] and ["a","b","c","d"]
        for token in ["WyJhIl0", "WyJhIiwiYiIsImMiLCJkIl0"] {
            assert!(matches!(
                UpstreamId::decode(token),
                Err(MorgenError::MalformedId(_))
            ));
        }
        assert!(matches!(
            decode_calendar_id(EVENT_ID),
            Err(MorgenError::MalformedId(_))
        ));
        assert!(matches!(
            decode_event_id(CALENDAR_ID),
            Err(MorgenError::MalformedId(_))
        ));
    }

    #[test]
    fn test_non_list_payloads_are_malformed() {
        // {"a":1}, [1,2], and not base64 at all
        for token in ["eyJhIjoxfQ", "WzEsMl0", "not base64!"] {
            assert!(matches!(
                decode_event_id(token),
                Err(MorgenError::MalformedId(_))
            ));
        }
    }

    #[test]
    fn test_account_shape() {
        assert!(is_account_id(ACCOUNT));
        assert!(!is_account_id("507f1f77bcf86cd79943901"));
        assert!(!is_account_id("507f1f77bcf86cd79943901z"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn account_strategy() -> impl Strategy<Value = String> {
            "[0-9a-f]{24}"
        }

        /// Addresses with characters JSON has to escape and non-ASCII local parts.
        fn email_strategy() -> impl Strategy<Value = String> {
            (r#"[a-z0-9"\\+._é日本-]{1,16}"#, "[a-z]{1,10}", "[a-z]{2,4}")
                .prop_map(|(local, host, tld)| format!("{local}@{host}.{tld}"))
        }

        fn uid_strategy() -> impl Strategy<Value = String> {
            prop_oneof![r#"[A-Za-z0-9_"\\/]{1,40}"#, r"\PC{0,40}"]
        }

        fn event_key_strategy() -> impl Strategy<Value = EventKey> {
            (email_strategy(), uid_strategy(), account_strategy()).prop_map(
                |(calendar_email, event_uid, account_id)| EventKey {
                    calendar_email,
                    event_uid,
                    account_id,
                },
            )
        }

        proptest! {
            #[test]
            fn test_event_id_roundtrip(key in event_key_strategy()) {
                let token = encode_event_id(&key);
                prop_assert_eq!(decode_event_id(&token).unwrap(), key.clone());
                prop_assert_eq!(UpstreamId::decode(&token).unwrap(), UpstreamId::Event(key));
            }

            #[test]
            fn test_calendar_id_roundtrip(account_id in account_strategy(), calendar_email in email_strategy()) {
                let key = CalendarKey { account_id, calendar_email };
                let token = encode_calendar_id(&key);
                prop_assert_eq!(decode_calendar_id(&token).unwrap(), key.clone());
                prop_assert_eq!(UpstreamId::decode(&token).unwrap().encode(), token);
            }

            #[test]
            fn test_account_id_roundtrip(account_id in account_strategy()) {
                let decoded = UpstreamId::decode(&account_id).unwrap();
                prop_assert_eq!(decoded.encode(), account_id.clone());
                prop_assert_eq!(derive_account_id(&account_id).unwrap(), account_id);
            }

            #[test]
            fn test_derivation_matches_decode(key in event_key_strategy()) {
                let event_id = encode_event_id(&key);
                let calendar_id = derive_calendar_id(&event_id).unwrap();

                prop_assert_eq!(derive_account_id(&event_id).unwrap(), key.account_id.clone());
                prop_assert_eq!(decode_calendar_id(&calendar_id).unwrap(), key.calendar());
                prop_assert_eq!(derive_account_id(&calendar_id).unwrap(), key.account_id);
            }
        }
    }
}
