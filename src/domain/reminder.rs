//! Reminder grouping and payload construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What triggered a notification. Serialized into the payload's `data.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    WateringReminder,
    DailyReminder,
    Test,
}

/// Metadata attached to a notification for the client to act upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderData {
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plant_ids: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_count: Option<usize>,
}

/// One notification for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub title: String,
    pub body: String,
    pub data: ReminderData,
}

impl ReminderPayload {
    /// Reminder for plants whose due-time has passed.
    ///
    /// Names the plant when exactly one is due, otherwise states the count.
    #[must_use]
    pub fn due(plants: &[(i32, &str)]) -> Self {
        let body = match plants {
            [(_, name)] => format!("{name} needs water"),
            _ => format!("{} plants need water", plants.len()),
        };

        Self {
            title: "🌱 Time to water!".to_string(),
            body,
            data: ReminderData {
                kind: ReminderKind::WateringReminder,
                plant_ids: plants.iter().map(|(id, _)| *id).collect(),
                plant_count: Some(plants.len()),
            },
        }
    }

    /// Daily digest of plants due now or within the next day.
    #[must_use]
    pub fn digest(plant_ids: &[i32]) -> Self {
        let count = plant_ids.len();
        let plural = if count > 1 { "s" } else { "" };

        Self {
            title: "🌿 Daily reminder".to_string(),
            body: format!("{count} plant{plural} to check today"),
            data: ReminderData {
                kind: ReminderKind::DailyReminder,
                plant_ids: plant_ids.to_vec(),
                plant_count: Some(count),
            },
        }
    }

    #[must_use]
    pub fn test() -> Self {
        Self {
            title: "🧪 Test notification".to_string(),
            body: "If you can see this, notifications are working!".to_string(),
            data: ReminderData {
                kind: ReminderKind::Test,
                plant_ids: Vec::new(),
                plant_count: None,
            },
        }
    }
}

/// Groups items by owning user, preserving input order inside each group.
pub fn group_by_owner<T>(
    items: impl IntoIterator<Item = T>,
    owner: impl Fn(&T) -> i32,
) -> BTreeMap<i32, Vec<T>> {
    let mut groups: BTreeMap<i32, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(owner(&item)).or_default().push(item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_due_plant_is_named() {
        let payload = ReminderPayload::due(&[(4, "Monstera")]);
        assert_eq!(payload.body, "Monstera needs water");
        assert_eq!(payload.data.plant_ids, vec![4]);
        assert_eq!(payload.data.plant_count, Some(1));
    }

    #[test]
    fn test_multiple_due_plants_are_counted() {
        let payload = ReminderPayload::due(&[(1, "Fern"), (2, "Cactus"), (3, "Pothos")]);
        assert_eq!(payload.body, "3 plants need water");
        assert_eq!(payload.data.kind, ReminderKind::WateringReminder);
    }

    #[test]
    fn test_digest_pluralization() {
        assert_eq!(ReminderPayload::digest(&[1]).body, "1 plant to check today");
        assert_eq!(ReminderPayload::digest(&[1, 2]).body, "2 plants to check today");
    }

    #[test]
    fn test_payload_data_serialization() {
        let payload = ReminderPayload::due(&[(7, "Ficus")]);
        let json = serde_json::to_value(&payload.data).unwrap();
        assert_eq!(json["type"], "watering_reminder");
        assert_eq!(json["plantIds"], serde_json::json!([7]));
        assert_eq!(json["plantCount"], 1);

        let json = serde_json::to_value(&ReminderPayload::test().data).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "test" }));
    }

    #[test]
    fn test_group_by_owner() {
        let items = vec![(1, "a"), (2, "b"), (1, "c")];
        let groups = group_by_owner(items, |(owner, _)| *owner);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&1], vec![(1, "a"), (1, "c")]);
        assert_eq!(groups[&2], vec![(2, "b")]);
    }

    #[test]
    fn test_group_by_owner_empty() {
        let groups = group_by_owner(Vec::<(i32, &str)>::new(), |(owner, _)| *owner);
        assert!(groups.is_empty());
    }
}
