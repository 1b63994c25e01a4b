use futures::FutureExt;

use crate::cache::{KeyFamily, Mutation, Query, QueryClient, QueryKey, QueryOptions};
use crate::common::{Message, MessageInput, Page, PageRequest};
use crate::services::MessageService;

#[derive(Clone)]
pub struct MessageHooks {
    client: QueryClient,
    service: MessageService,
}

impl MessageHooks {
    pub fn new(client: QueryClient, service: MessageService) -> Self {
        Self { client, service }
    }

    /// One page of templates. Switching pages keeps the previous page on
    /// screen until the new one arrives.
    pub fn page(&self, request: PageRequest) -> Query<PageRequest, Page<Message>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new().keep_previous_data(),
            request,
            |request| Some(QueryKey::Messages(*request)),
            move |request| {
                let service = service.clone();
                async move { service.get_page(request).await }.boxed()
            },
        )
    }

    pub fn by_id(&self, id: i64) -> Query<i64, Message> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            id,
            |id| (*id != 0).then_some(QueryKey::Message(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_by_id(id).await }.boxed()
            },
        )
    }

    pub fn create(&self) -> Mutation<MessageInput, Message> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("create message", move |input: MessageInput| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let created = service.create(&input).await?;
                client.invalidate(KeyFamily::Messages);
                Ok(created)
            }
            .boxed()
        })
    }

    pub fn update(&self) -> Mutation<(i64, MessageInput), Message> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("update message", move |(id, input): (i64, MessageInput)| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let updated = service.update(id, &input).await?;
                client.invalidate(KeyFamily::Messages);
                client.invalidate(QueryKey::Message(id));
                Ok(updated)
            }
            .boxed()
        })
    }

    pub fn delete(&self) -> Mutation<i64, ()> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("delete message", move |id: i64| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                service.delete(id).await?;
                client.remove(QueryKey::Message(id));
                client.invalidate(KeyFamily::Messages);
                Ok(())
            }
            .boxed()
        })
    }
}
