use serde::{Deserialize, Serialize};

/// A calendar in one of the connected accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub integration_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub my_rights: Option<CalendarRights>,
    #[serde(rename = "morgen.so:metadata", default)]
    pub metadata: Option<CalendarMetadata>,
}

/// What the authenticated user may do with a calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarRights {
    pub may_read_free_busy: bool,
    pub may_read_items: bool,
    pub may_write_all: bool,
    pub may_write_own: bool,
    pub may_update_private: bool,
    #[serde(rename = "mayRSVP")]
    pub may_rsvp: bool,
    pub may_admin: bool,
    pub may_delete: bool,
}

/// Morgen-side overrides that do not touch the provider's calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_name: Option<String>,
}

impl CalendarMetadata {
    pub fn is_empty(&self) -> bool {
        self.busy.is_none() && self.override_color.is_none() && self.override_name.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarUpdateRequest {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "morgen.so:metadata")]
    pub metadata: CalendarMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_from_api_response() {
        let json = serde_json::json!({
            "@type": "Calendar",
            "id": "cal123",
            "accountId": "acc456",
            "integrationId": "google",
            "name": "Work",
            "color": "#4285f4",
            "sortOrder": 2,
            "myRights": { "mayReadItems": true, "mayRSVP": true, "mayDelete": false },
            "morgen.so:metadata": { "busy": true, "overrideName": "My Work" }
        });

        let calendar: Calendar = serde_json::from_value(json).unwrap();
        assert_eq!(calendar.account_id, "acc456");
        assert_eq!(calendar.sort_order, 2);
        let rights = calendar.my_rights.unwrap();
        assert!(rights.may_read_items && rights.may_rsvp && !rights.may_delete);
        let metadata = calendar.metadata.unwrap();
        assert_eq!(metadata.busy, Some(true));
        assert_eq!(metadata.override_name.as_deref(), Some("My Work"));
    }

    #[test]
    fn test_update_request_omits_unset_metadata() {
        let request = CalendarUpdateRequest {
            id: "cal".into(),
            account_id: "acc".into(),
            metadata: CalendarMetadata {
                busy: Some(false),
                ..Default::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "id": "cal",
                "accountId": "acc",
                "morgen.so:metadata": { "busy": false }
            })
        );
    }
}
