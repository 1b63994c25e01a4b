use std::sync::Arc;

use crate::cache::{PolicyTable, QueryClient};
use crate::common::Result;
use crate::config::AppConfig;
use crate::hooks::{InstallmentHooks, MessageHooks, NotificationHooks, PeopleHooks};
use crate::network::{ApiClient, ReqwestTransport, Transport};
use crate::services::{InstallmentService, MessageService, NotificationService, PersonService};

/// Everything a view needs: one shared cache and the hook set of every
/// resource, all wired to the same transport.
#[derive(Clone)]
pub struct AppContext {
    pub client: QueryClient,
    pub people: PeopleHooks,
    pub installments: InstallmentHooks,
    pub messages: MessageHooks,
    pub notifications: NotificationHooks,
}

impl AppContext {
    pub fn new(transport: Arc<dyn Transport>, policies: PolicyTable) -> Self {
        let api = ApiClient::new(transport);
        let client = QueryClient::new(policies);
        Self {
            people: PeopleHooks::new(client.clone(), PersonService::new(api.clone())),
            installments: InstallmentHooks::new(
                client.clone(),
                InstallmentService::new(api.clone()),
            ),
            messages: MessageHooks::new(client.clone(), MessageService::new(api.clone())),
            notifications: NotificationHooks::new(NotificationService::new(api)),
            client,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout())?;
        log::info!(
            "Using API at {} (timeout {}s)",
            config.api_base_url,
            config.request_timeout_secs
        );
        Ok(Self::new(Arc::new(transport), config.policy_table()))
    }
}
