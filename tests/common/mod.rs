#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use h2notifier::AppContext;
use h2notifier::cache::PolicyTable;
use h2notifier::common::{
    Channel, Installment, InstallmentInput, Message, MessageInput, NotificationRequest, Person,
    PersonInput, PersonPatch, PersonRole, Result,
};
use h2notifier::network::{HttpRequest, HttpResponse, Method, Transport};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn person(id: i64, name: &str, role: PersonRole) -> Person {
    Person {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: format!("1199999{id:04}"),
        role,
        pix_key: None,
        pix_payload: None,
    }
}

pub fn message(id: i64, title: &str, channel: Channel) -> Message {
    Message {
        id,
        title: title.to_string(),
        body: format!("Olá {{nome}}, {title}"),
        channel,
    }
}

/// Builds an app wired to `backend` with the default policies.
pub fn app(backend: &Arc<FakeBackend>) -> AppContext {
    AppContext::new(backend.clone(), PolicyTable::new())
}

#[derive(Default)]
struct Store {
    people: BTreeMap<i64, Person>,
    installments: BTreeMap<i64, Installment>,
    messages: BTreeMap<i64, Message>,
    next_id: i64,
    today: Option<NaiveDate>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id + 1000
    }
}

/// In-memory backend speaking the envelope protocol. Records every request,
/// can fail the next call to a path, and can hold responses until released.
#[derive(Default)]
pub struct FakeBackend {
    store: Mutex<Store>,
    requests: Mutex<Vec<HttpRequest>>,
    failures: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        backend.store.lock().today = Some(date(2025, 6, 15));
        Arc::new(backend)
    }

    pub fn add_person(&self, person: Person) {
        self.store.lock().people.insert(person.id, person);
    }

    pub fn add_message(&self, message: Message) {
        self.store.lock().messages.insert(message.id, message);
    }

    /// Adds an installment owned by an existing collector and debtors.
    pub fn add_installment(
        &self,
        id: i64,
        description: &str,
        due_date: NaiveDate,
        total: f64,
        collector_id: i64,
        debtor_ids: &[i64],
    ) {
        let mut store = self.store.lock();
        let collector = store.people[&collector_id].clone();
        let debtors: Vec<Person> = debtor_ids
            .iter()
            .map(|id| store.people[id].clone())
            .collect();
        let installment = Installment {
            id,
            description: description.to_string(),
            due_date,
            total_amount: total,
            per_debtor_amount: total / debtors.len().max(1) as f64,
            settled: false,
            pix_key: None,
            pix_payload: None,
            collector,
            debtors,
        };
        store.installments.insert(id, installment);
    }

    /// Removes a record behind the cache's back, as another client would.
    pub fn forget_installment(&self, id: i64) {
        self.store.lock().installments.remove(&id);
    }

    /// Fails the next request to `path` with `status` and `message`.
    pub fn fail_next(&self, path: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back((status, message.to_string()));
    }

    /// Requests to `path` wait until [`FakeBackend::release`] is called.
    pub fn hold(&self, path: &str) {
        self.gates
            .lock()
            .insert(path.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Lets one held request to `path` through.
    pub fn release(&self, path: &str) {
        if let Some(gate) = self.gates.lock().get(path) {
            gate.add_permits(1);
        }
    }

    pub fn unhold(&self, path: &str) {
        if let Some(gate) = self.gates.lock().remove(path) {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        if let Some((status, message)) = self
            .failures
            .lock()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
        {
            return failure(status, &message);
        }

        let path = request.path.trim_start_matches('/');
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.split('/').collect();
        let mut store = self.store.lock();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["pessoas"]) => ok(list(store.people.values())),
            (Method::Get, ["pessoas", id]) => found(store.people.get(&parse_id(id)), "Pessoa"),
            (Method::Post, ["pessoas"]) => {
                let input: PersonInput = body(request);
                let id = store.next_id();
                let created = Person {
                    id,
                    name: input.name,
                    email: input.email,
                    phone: input.phone,
                    role: input.role,
                    pix_key: None,
                    pix_payload: None,
                };
                store.people.insert(id, created.clone());
                ok(to_value(&created))
            }
            (Method::Put, ["pessoas", id]) => {
                let patch: PersonPatch = body(request);
                match store.people.get_mut(&parse_id(id)) {
                    Some(person) => {
                        if let Some(name) = patch.name {
                            person.name = name;
                        }
                        if let Some(email) = patch.email {
                            person.email = email;
                        }
                        if let Some(phone) = patch.phone {
                            person.phone = phone;
                        }
                        ok(to_value(&*person))
                    }
                    None => not_found("Pessoa"),
                }
            }
            (Method::Delete, ["pessoas", id]) => match store.people.remove(&parse_id(id)) {
                Some(_) => empty(),
                None => not_found("Pessoa"),
            },

            (Method::Get, ["parcelas"]) => ok(list(store.installments.values())),
            (Method::Get, ["parcelas", "vencidas"]) => {
                let today = store.today.unwrap_or(NaiveDate::MIN);
                ok(list(
                    store
                        .installments
                        .values()
                        .filter(|item| !item.settled && item.due_date < today),
                ))
            }
            (Method::Get, ["parcelas", "vencimento", day]) => {
                let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok();
                ok(list(
                    store
                        .installments
                        .values()
                        .filter(|item| Some(item.due_date) == day),
                ))
            }
            (Method::Get, ["parcelas", "cobrador", id]) => {
                let id = parse_id(id);
                ok(list(
                    store
                        .installments
                        .values()
                        .filter(|item| item.collector.id == id),
                ))
            }
            (Method::Get, ["parcelas", "devedor", id]) => {
                let id = parse_id(id);
                ok(list(
                    store
                        .installments
                        .values()
                        .filter(|item| item.debtors.iter().any(|debtor| debtor.id == id)),
                ))
            }
            (Method::Get, ["parcelas", "total-a-receber", id]) => {
                let id = parse_id(id);
                let total: f64 = store
                    .installments
                    .values()
                    .filter(|item| item.collector.id == id && !item.settled)
                    .map(|item| item.total_amount)
                    .sum();
                ok(json!(total))
            }
            (Method::Get, ["parcelas", id]) => {
                found(store.installments.get(&parse_id(id)), "Parcela")
            }
            (Method::Post, ["parcelas"]) => {
                let input: InstallmentInput = body(request);
                let id = store.next_id();
                match build_installment(&store, id, input) {
                    Some(created) => {
                        store.installments.insert(id, created.clone());
                        ok(to_value(&created))
                    }
                    None => failure(400, "Cobrador ou devedor inexistente"),
                }
            }
            (Method::Put, ["parcelas", id, "quitar"]) => {
                match store.installments.get_mut(&parse_id(id)) {
                    Some(item) => {
                        item.settled = true;
                        ok(to_value(&*item))
                    }
                    None => not_found("Parcela"),
                }
            }
            (Method::Put, ["parcelas", id]) => {
                let id = parse_id(id);
                if !store.installments.contains_key(&id) {
                    return not_found("Parcela");
                }
                let input: InstallmentInput = body(request);
                match build_installment(&store, id, input) {
                    Some(updated) => {
                        store.installments.insert(id, updated.clone());
                        ok(to_value(&updated))
                    }
                    None => failure(400, "Cobrador ou devedor inexistente"),
                }
            }
            (Method::Delete, ["parcelas", id]) => {
                match store.installments.remove(&parse_id(id)) {
                    Some(_) => empty(),
                    None => not_found("Parcela"),
                }
            }

            (Method::Get, ["mensagens"]) => {
                let (page, size) = parse_page(query);
                let all: Vec<&Message> = store.messages.values().collect();
                let total = all.len();
                let total_pages = total.div_ceil(size.max(1));
                let content: Vec<&Message> =
                    all.into_iter().skip(page * size).take(size).collect();
                ok(json!({
                    "content": content,
                    "number": page,
                    "size": size,
                    "totalPages": total_pages,
                    "totalElements": total,
                    "first": page == 0,
                    "last": page + 1 >= total_pages,
                    "numberOfElements": content.len(),
                    "empty": content.is_empty(),
                }))
            }
            (Method::Get, ["mensagens", id]) => {
                found(store.messages.get(&parse_id(id)), "Mensagem")
            }
            (Method::Post, ["mensagens"]) => {
                let input: MessageInput = body(request);
                let id = store.next_id();
                let created = Message {
                    id,
                    title: input.title,
                    body: input.body,
                    channel: input.channel,
                };
                store.messages.insert(id, created.clone());
                ok(to_value(&created))
            }
            (Method::Put, ["mensagens", id]) => {
                let id = parse_id(id);
                if !store.messages.contains_key(&id) {
                    return not_found("Mensagem");
                }
                let input: MessageInput = body(request);
                let updated = Message {
                    id,
                    title: input.title,
                    body: input.body,
                    channel: input.channel,
                };
                store.messages.insert(id, updated.clone());
                ok(to_value(&updated))
            }
            (Method::Delete, ["mensagens", id]) => match store.messages.remove(&parse_id(id)) {
                Some(_) => empty(),
                None => not_found("Mensagem"),
            },

            (Method::Post, ["notificacoes", "enviar"]) => {
                let request: NotificationRequest = body(request);
                if store.installments.contains_key(&request.installment_id) {
                    ok(Value::Null)
                } else {
                    not_found("Parcela")
                }
            }
            (Method::Post, ["notificacoes", "preview"]) => {
                let request: NotificationRequest = body(request);
                match store.installments.get(&request.installment_id) {
                    Some(item) => ok(json!(format!(
                        "<p>[{}] Lembrete: {}</p>",
                        request.channels[0].as_str(),
                        item.description
                    ))),
                    None => not_found("Parcela"),
                }
            }

            _ => failure(404, "Rota desconhecida"),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());

        let gate = self.gates.lock().get(&request.path).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        Ok(self.respond(&request))
    }
}

fn build_installment(store: &Store, id: i64, input: InstallmentInput) -> Option<Installment> {
    let collector = store.people.get(&input.collector_id)?.clone();
    let debtors = input
        .debtor_ids
        .iter()
        .map(|id| store.people.get(id).cloned())
        .collect::<Option<Vec<_>>>()?;
    Some(Installment {
        id,
        description: input.description,
        due_date: input.due_date,
        total_amount: input.total_amount,
        per_debtor_amount: input.total_amount / debtors.len().max(1) as f64,
        settled: input.settled,
        pix_key: input.pix_key,
        pix_payload: None,
        collector,
        debtors,
    })
}

fn parse_id(raw: &str) -> i64 {
    raw.parse().unwrap_or(-1)
}

fn parse_page(query: &str) -> (usize, usize) {
    let mut page = 0;
    let mut size = 10;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("page", value)) => page = value.parse().unwrap_or(0),
            Some(("size", value)) => size = value.parse().unwrap_or(10),
            _ => {}
        }
    }
    (page, size)
}

fn body<T: DeserializeOwned>(request: &HttpRequest) -> T {
    serde_json::from_value(request.body.clone().unwrap_or(Value::Null)).unwrap()
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

fn list<'a, T: Serialize + 'a>(items: impl Iterator<Item = &'a T>) -> Value {
    Value::Array(items.map(to_value).collect())
}

fn ok(data: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: json!({ "success": true, "message": "OK", "data": data }).to_string(),
    }
}

fn empty() -> HttpResponse {
    HttpResponse {
        status: 204,
        body: String::new(),
    }
}

fn found<T: Serialize>(item: Option<&T>, what: &str) -> HttpResponse {
    match item {
        Some(item) => ok(to_value(item)),
        None => not_found(what),
    }
}

fn not_found(what: &str) -> HttpResponse {
    failure(404, &format!("{what} não encontrada"))
}

fn failure(status: u16, message: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: json!({ "success": false, "message": message, "data": null }).to_string(),
    }
}
