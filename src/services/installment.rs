use chrono::NaiveDate;

use crate::common::{Installment, InstallmentInput, Result};
use crate::network::ApiClient;

const BASE: &str = "/parcelas";

#[derive(Clone)]
pub struct InstallmentService {
    api: ApiClient,
}

impl InstallmentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_all(&self) -> Result<Vec<Installment>> {
        self.api.get(BASE).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Installment> {
        self.api.get(&format!("{BASE}/{id}")).await
    }

    pub async fn get_by_due_date(&self, due_date: NaiveDate) -> Result<Vec<Installment>> {
        self.api
            .get(&format!("{BASE}/vencimento/{}", due_date.format("%Y-%m-%d")))
            .await
    }

    pub async fn get_overdue(&self) -> Result<Vec<Installment>> {
        self.api.get(&format!("{BASE}/vencidas")).await
    }

    pub async fn get_by_collector(&self, collector_id: i64) -> Result<Vec<Installment>> {
        self.api
            .get(&format!("{BASE}/cobrador/{collector_id}"))
            .await
    }

    pub async fn get_by_debtor(&self, debtor_id: i64) -> Result<Vec<Installment>> {
        self.api.get(&format!("{BASE}/devedor/{debtor_id}")).await
    }

    /// Sum still owed to a collector across unsettled installments.
    pub async fn get_total_receivable(&self, collector_id: i64) -> Result<f64> {
        self.api
            .get(&format!("{BASE}/total-a-receber/{collector_id}"))
            .await
    }

    pub async fn create(&self, input: &InstallmentInput) -> Result<Installment> {
        self.api.post(BASE, input).await
    }

    pub async fn update(&self, id: i64, input: &InstallmentInput) -> Result<Installment> {
        self.api.put(&format!("{BASE}/{id}"), input).await
    }

    /// Marks the installment as paid.
    pub async fn settle(&self, id: i64) -> Result<Installment> {
        self.api.put_empty(&format!("{BASE}/{id}/quitar")).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("{BASE}/{id}")).await
    }
}
