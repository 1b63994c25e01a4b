//! Resource hook sets: parameter-bound queries and mutations whose cache
//! effects run only after the backend confirms the write.

pub mod installments;
pub mod messages;
pub mod notifications;
pub mod people;

pub use installments::InstallmentHooks;
pub use messages::MessageHooks;
pub use notifications::NotificationHooks;
pub use people::PeopleHooks;
