//! One transport-only service per backend resource. No validation and no
//! caching happens here; errors from [`ApiClient`](crate::network::ApiClient)
//! pass through unchanged.

pub mod installment;
pub mod message;
pub mod notification;
pub mod person;

pub use installment::InstallmentService;
pub use message::MessageService;
pub use notification::NotificationService;
pub use person::PersonService;
