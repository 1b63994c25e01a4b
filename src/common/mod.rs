pub mod envelope;
pub mod error;
pub mod events;
pub mod format;
pub mod types;

pub use envelope::ApiEnvelope;
pub use error::{ApiError, Result};
pub use events::CacheEvent;
pub use types::{
    Channel, Installment, InstallmentInput, Message, MessageInput, NotificationRequest, Page,
    PageRequest, Person, PersonInput, PersonPatch, PersonRole,
};
