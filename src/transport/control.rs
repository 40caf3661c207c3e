//! Client-to-server control events

use serde_json::{json, Value};

/// Events the client emits to the socket server
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Join the tenant broadcast room
    JoinRoom { company_id: String },
    /// Leave the tenant broadcast room
    LeaveRoom { company_id: String },
    /// Send a message to every session of a tenant
    SendToCompany { company_id: String, message: Value },
    /// Send a message to every connected session
    SendToAll { message: Value },
    /// Put a customer conversation in agent-private mode
    IsPrivateOn { company_id: String, customer_id: String },
    /// Take a customer conversation out of agent-private mode
    IsPrivateOff { company_id: String, customer_id: String },
}

impl ControlEvent {
    /// Socket.IO event name
    pub fn name(&self) -> &'static str {
        match self {
            ControlEvent::JoinRoom { .. } => "joinRoom",
            ControlEvent::LeaveRoom { .. } => "leaveRoom",
            ControlEvent::SendToCompany { .. } => "sendToCompany",
            ControlEvent::SendToAll { .. } => "sendToAll",
            ControlEvent::IsPrivateOn { .. } => "isPrivateOn",
            ControlEvent::IsPrivateOff { .. } => "isPrivateOff",
        }
    }

    /// Event argument as sent on the wire
    pub fn payload(&self) -> Value {
        match self {
            ControlEvent::JoinRoom { company_id } | ControlEvent::LeaveRoom { company_id } => {
                json!({ "companyId": company_id })
            }
            ControlEvent::SendToCompany { company_id, message } => {
                json!({ "companyId": company_id, "message": message })
            }
            ControlEvent::SendToAll { message } => json!({ "message": message }),
            ControlEvent::IsPrivateOn {
                company_id,
                customer_id,
            }
            | ControlEvent::IsPrivateOff {
                company_id,
                customer_id,
            } => json!({ "companyId": company_id, "customerId": customer_id }),
        }
    }
}
