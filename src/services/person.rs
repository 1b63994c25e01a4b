use crate::common::{Person, PersonInput, PersonPatch, Result};
use crate::network::ApiClient;

const BASE: &str = "/pessoas";

#[derive(Clone)]
pub struct PersonService {
    api: ApiClient,
}

impl PersonService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_all(&self) -> Result<Vec<Person>> {
        self.api.get(BASE).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Person> {
        self.api.get(&format!("{BASE}/{id}")).await
    }

    pub async fn create(&self, input: &PersonInput) -> Result<Person> {
        self.api.post(BASE, input).await
    }

    pub async fn update(&self, id: i64, patch: &PersonPatch) -> Result<Person> {
        self.api.put(&format!("{BASE}/{id}"), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("{BASE}/{id}")).await
    }
}
