//! Application services module

pub mod session_service;
pub mod webhook_service;

pub use session_service::{
    CreateSessionRequest, CreateSessionResponse, PaymentSessionService, SessionStatusView,
};
pub use webhook_service::{WebhookAck, WebhookDispatcher};
