// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the relay pipelines and adapter traits.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A message captured at the device, bound for the backend's inbound endpoint.
///
/// Transient: lives for the duration of one relay attempt. Durability is
/// delegated to the job scheduler's at-least-once redelivery of the
/// triggering event, so this type is never persisted by the relay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSms {
    /// Originating address of the captured message.
    pub from: String,
    /// Message text. May be empty -- an empty body is a valid message.
    #[serde(rename = "message")]
    pub body: String,
}

/// A backend-queued message to be delivered via the device transport.
///
/// Owned by the backend; the device holds a read-only copy for the duration
/// of one dispatch cycle. The id is backend-assigned, globally unique, and
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundSms {
    pub id: i64,
    pub phone: String,
    pub body: String,
}

/// The device transport's accept-for-sending signal.
///
/// This is fire-and-forget acceptance, not delivery confirmation; the relay
/// must not gate backend retirement on information the device cannot provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SendAcceptance {
    Accepted,
    Rejected,
}

/// Which of the two unidirectional pipelines an attempt belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SyncDirection {
    Inbound,
    Outbound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn inbound_sms_serializes_with_wire_field_names() {
        let sms = InboundSms {
            from: "+15550001111".into(),
            body: "hello".into(),
        };
        let json = serde_json::to_value(&sms).unwrap();
        assert_eq!(json["from"], "+15550001111");
        assert_eq!(json["message"], "hello");
        assert!(json.get("body").is_none(), "wire name is `message`, not `body`");
    }

    #[test]
    fn outbound_sms_deserializes_from_backend_shape() {
        let json = r#"{"id": 7, "phone": "+15550002222", "body": "pending"}"#;
        let sms: OutboundSms = serde_json::from_str(json).unwrap();
        assert_eq!(sms.id, 7);
        assert_eq!(sms.phone, "+15550002222");
        assert_eq!(sms.body, "pending");
    }

    #[test]
    fn sync_direction_round_trips_through_display() {
        for dir in [SyncDirection::Inbound, SyncDirection::Outbound] {
            let parsed = SyncDirection::from_str(&dir.to_string()).unwrap();
            assert_eq!(dir, parsed);
        }
    }
}
