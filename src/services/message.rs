use crate::common::{Message, MessageInput, Page, PageRequest, Result};
use crate::network::ApiClient;

const BASE: &str = "/mensagens";

#[derive(Clone)]
pub struct MessageService {
    api: ApiClient,
}

impl MessageService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_page(&self, request: PageRequest) -> Result<Page<Message>> {
        self.api
            .get(&format!(
                "{BASE}?page={}&size={}",
                request.page, request.size
            ))
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Message> {
        self.api.get(&format!("{BASE}/{id}")).await
    }

    pub async fn create(&self, input: &MessageInput) -> Result<Message> {
        self.api.post(BASE, input).await
    }

    pub async fn update(&self, id: i64, input: &MessageInput) -> Result<Message> {
        self.api.put(&format!("{BASE}/{id}"), input).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("{BASE}/{id}")).await
    }
}
