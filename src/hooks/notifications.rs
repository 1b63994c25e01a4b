use futures::FutureExt;

use crate::cache::Mutation;
use crate::common::NotificationRequest;
use crate::services::NotificationService;

/// Dispatch and preview are commands: nothing is cached and nothing is
/// invalidated.
#[derive(Clone)]
pub struct NotificationHooks {
    service: NotificationService,
}

impl NotificationHooks {
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }

    pub fn dispatch(&self) -> Mutation<NotificationRequest, ()> {
        let service = self.service.clone();
        Mutation::new("send notifications", move |request: NotificationRequest| {
            let service = service.clone();
            async move { service.dispatch(&request).await }.boxed()
        })
    }

    pub fn preview(&self) -> Mutation<NotificationRequest, String> {
        let service = self.service.clone();
        Mutation::new("preview notification", move |request: NotificationRequest| {
            let service = service.clone();
            async move { service.preview(&request).await }.boxed()
        })
    }
}
