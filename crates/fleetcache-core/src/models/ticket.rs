use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
}

impl TicketStatus {
    /// Open and Pending tickets both count as awaiting resolution.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::Pending)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "Open"),
            TicketStatus::Pending => write!(f, "Pending"),
            TicketStatus::Closed => write!(f, "Closed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ticketId")]
    pub ticket_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TicketStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Payload for opening a support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub subject: String,
    pub description: String,
}

/// Payload for updating a ticket. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_deserializes() {
        let json = r#"{"ticketId":2,"userId":4,"subject":"Late return fee","status":"Open"}"#;
        let t: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(t.ticket_id, 2);
        assert!(t.status.is_unresolved());
    }

    #[test]
    fn test_pending_counts_as_unresolved() {
        assert!(TicketStatus::Pending.is_unresolved());
        assert!(!TicketStatus::Closed.is_unresolved());
    }
}
