use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role tag of a person. Fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonRole {
    #[serde(rename = "DEVEDOR")]
    Debtor,
    #[serde(rename = "COBRADOR")]
    Collector,
}

impl PersonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Debtor => "DEVEDOR",
            PersonRole::Collector => "COBRADOR",
        }
    }
}

impl std::str::FromStr for PersonRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEVEDOR" | "DEBTOR" => Ok(PersonRole::Debtor),
            "COBRADOR" | "COLLECTOR" => Ok(PersonRole::Collector),
            other => Err(format!("unknown person role `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "tipoPessoa")]
    pub role: PersonRole,
    /// Assigned by the backend, never sent on creation.
    #[serde(rename = "chavePix", default)]
    pub pix_key: Option<String>,
    #[serde(rename = "codigoPixCopyPaste", default)]
    pub pix_payload: Option<String>,
}

/// Body of `POST /pessoas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInput {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "tipoPessoa")]
    pub role: PersonRole,
}

/// Partial body of `PUT /pessoas/{id}`. There is no role field: a person keeps
/// the role it was created with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: i64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "valorTotal")]
    pub total_amount: f64,
    /// Computed by the backend from the total and the number of debtors.
    #[serde(rename = "valorParcelaCada", default)]
    pub per_debtor_amount: f64,
    #[serde(rename = "quitada")]
    pub settled: bool,
    #[serde(rename = "chavePix", default)]
    pub pix_key: Option<String>,
    #[serde(rename = "codigoPixCopyPaste", default)]
    pub pix_payload: Option<String>,
    #[serde(rename = "cobrador")]
    pub collector: Person,
    #[serde(rename = "devedores")]
    pub debtors: Vec<Person>,
}

/// Body of `POST /parcelas` and `PUT /parcelas/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentInput {
    #[serde(rename = "idCobrador")]
    pub collector_id: i64,
    #[serde(rename = "valorTotal")]
    pub total_amount: f64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "quitada")]
    pub settled: bool,
    #[serde(rename = "chavePix")]
    pub pix_key: Option<String>,
    #[serde(rename = "idsDevedores")]
    pub debtor_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Whatsapp,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Whatsapp => "WHATSAPP",
            Channel::Email => "EMAIL",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WHATSAPP" => Ok(Channel::Whatsapp),
            "EMAIL" => Ok(Channel::Email),
            other => Err(format!("unknown channel `{other}`")),
        }
    }
}

/// Message template. Placeholder tokens in `body` are resolved by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "conteudo")]
    pub body: String,
    #[serde(rename = "canal")]
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "conteudo")]
    pub body: String,
    #[serde(rename = "canal")]
    pub channel: Channel,
}

/// Dispatch or preview command for one installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(rename = "idParcela")]
    pub installment_id: i64,
    #[serde(rename = "canais")]
    pub channels: Vec<Channel>,
}

impl NotificationRequest {
    pub fn new(installment_id: i64, channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            installment_id,
            channels: channels.into_iter().collect(),
        }
    }
}

/// Page wrapper returned inside the envelope of paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(rename = "number")]
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub first: bool,
    pub last: bool,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}
