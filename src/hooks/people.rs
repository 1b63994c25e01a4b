use futures::FutureExt;

use crate::cache::{KeyFamily, Mutation, Query, QueryClient, QueryKey, QueryOptions};
use crate::common::{Person, PersonInput, PersonPatch};
use crate::services::PersonService;

/// Reads and writes for people. The list has no fresh window, so every
/// fetch goes to the backend.
#[derive(Clone)]
pub struct PeopleHooks {
    client: QueryClient,
    service: PersonService,
}

impl PeopleHooks {
    pub fn new(client: QueryClient, service: PersonService) -> Self {
        Self { client, service }
    }

    pub fn all(&self) -> Query<(), Vec<Person>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            (),
            |_| Some(QueryKey::People),
            move |_| {
                let service = service.clone();
                async move { service.get_all().await }.boxed()
            },
        )
    }

    pub fn by_id(&self, id: i64) -> Query<i64, Person> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            id,
            |id| (*id != 0).then_some(QueryKey::Person(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_by_id(id).await }.boxed()
            },
        )
    }

    pub fn create(&self) -> Mutation<PersonInput, Person> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("create person", move |input: PersonInput| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let created = service.create(&input).await?;
                client.invalidate(KeyFamily::People);
                Ok(created)
            }
            .boxed()
        })
    }

    pub fn update(&self) -> Mutation<(i64, PersonPatch), Person> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("update person", move |(id, patch): (i64, PersonPatch)| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let updated = service.update(id, &patch).await?;
                client.invalidate(KeyFamily::People);
                client.invalidate(QueryKey::Person(updated.id));
                Ok(updated)
            }
            .boxed()
        })
    }

    pub fn delete(&self) -> Mutation<i64, ()> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("delete person", move |id: i64| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                service.delete(id).await?;
                client.remove(QueryKey::Person(id));
                client.invalidate(KeyFamily::People);
                Ok(())
            }
            .boxed()
        })
    }
}
