//! Support tickets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTicket {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub staff: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus { #[default] Open, Pending, Resolved, Closed }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority { Low, #[default] Normal, High, Urgent }

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct TicketInput {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub priority: TicketPriority,
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct TicketReply {
    #[validate(length(min = 1, max = 120))]
    pub author: String,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
    #[serde(default)]
    pub staff: bool,
}

impl SupportTicket {
    pub fn is_open(&self) -> bool { matches!(self.status, TicketStatus::Open | TicketStatus::Pending) }

    /// Appends a reply and moves the ticket along: staff replies wait on the
    /// customer, customer replies reopen.
    pub fn add_reply(&mut self, reply: &TicketReply) {
        self.messages.push(TicketMessage {
            author: reply.author.trim().to_string(),
            body: reply.body.trim().to_string(),
            staff: reply.staff,
            created_at: Utc::now(),
        });
        self.status = match (self.status, reply.staff) {
            (TicketStatus::Open, true) => TicketStatus::Pending,
            (TicketStatus::Pending | TicketStatus::Resolved, false) => TicketStatus::Open,
            (status, _) => status,
        };
        self.updated_at = Utc::now();
    }
}
