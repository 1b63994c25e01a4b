use chrono::NaiveDate;
use futures::FutureExt;

use crate::cache::{KeyFamily, Mutation, Query, QueryClient, QueryKey, QueryOptions};
use crate::common::{Installment, InstallmentInput, Result};
use crate::services::InstallmentService;
use crate::ui::InstallmentFilter;

/// Families that may contain any given installment.
const LIST_FAMILIES: [KeyFamily; 5] = [
    KeyFamily::Installments,
    KeyFamily::InstallmentsByDueDate,
    KeyFamily::OverdueInstallments,
    KeyFamily::InstallmentsByCollector,
    KeyFamily::InstallmentsByDebtor,
];

/// Invalidates every view a created, updated, settled or deleted
/// installment could show up in, totals included.
fn invalidate_views(client: &QueryClient) {
    for family in LIST_FAMILIES {
        client.invalidate(family);
    }
    client.invalidate(KeyFamily::TotalReceivable);
}

/// Drops a deleted installment from every cached list right away.
fn prune_from_lists(client: &QueryClient, id: i64) {
    let pruned: usize = LIST_FAMILIES
        .into_iter()
        .map(|family| {
            client.update_query_data::<Vec<Installment>, _>(family, |list| {
                list.iter().filter(|item| item.id != id).cloned().collect()
            })
        })
        .sum();
    log::debug!("pruned installment {id} from {pruned} cached lists");
}

#[derive(Clone)]
pub struct InstallmentHooks {
    client: QueryClient,
    service: InstallmentService,
}

impl InstallmentHooks {
    pub fn new(client: QueryClient, service: InstallmentService) -> Self {
        Self { client, service }
    }

    pub fn all(&self) -> Query<(), Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            (),
            |_| Some(QueryKey::Installments),
            move |_| {
                let service = service.clone();
                async move { service.get_all().await }.boxed()
            },
        )
    }

    pub fn by_id(&self, id: i64) -> Query<i64, Installment> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            id,
            |id| (*id != 0).then_some(QueryKey::Installment(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_by_id(id).await }.boxed()
            },
        )
    }

    pub fn by_due_date(
        &self,
        due_date: Option<NaiveDate>,
    ) -> Query<Option<NaiveDate>, Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            due_date,
            |date| date.map(QueryKey::InstallmentsByDueDate),
            move |date| {
                let service = service.clone();
                async move {
                    match date {
                        Some(date) => service.get_by_due_date(date).await,
                        None => Ok(Vec::new()),
                    }
                }
                .boxed()
            },
        )
    }

    pub fn overdue(&self) -> Query<(), Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            (),
            |_| Some(QueryKey::OverdueInstallments),
            move |_| {
                let service = service.clone();
                async move { service.get_overdue().await }.boxed()
            },
        )
    }

    pub fn by_collector(&self, collector_id: i64) -> Query<i64, Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            collector_id,
            |id| (*id != 0).then_some(QueryKey::InstallmentsByCollector(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_by_collector(id).await }.boxed()
            },
        )
    }

    pub fn by_debtor(&self, debtor_id: i64) -> Query<i64, Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            debtor_id,
            |id| (*id != 0).then_some(QueryKey::InstallmentsByDebtor(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_by_debtor(id).await }.boxed()
            },
        )
    }

    pub fn total_receivable(&self, collector_id: i64) -> Query<i64, f64> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            collector_id,
            |id| (*id != 0).then_some(QueryKey::TotalReceivable(*id)),
            move |id| {
                let service = service.clone();
                async move { service.get_total_receivable(id).await }.boxed()
            },
        )
    }

    /// The one list matching the active filter. [`Query::set_params`]
    /// switches lists and loads the new one; entries never mix.
    pub fn filtered(
        &self,
        filter: InstallmentFilter,
    ) -> Query<InstallmentFilter, Vec<Installment>> {
        let service = self.service.clone();
        Query::new(
            self.client.clone(),
            QueryOptions::new(),
            filter,
            |filter| Some(filter.key()),
            move |filter| {
                let service = service.clone();
                async move { fetch_filtered(&service, filter).await }.boxed()
            },
        )
    }

    pub fn create(&self) -> Mutation<InstallmentInput, Installment> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("create installment", move |input: InstallmentInput| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let created = service.create(&input).await?;
                invalidate_views(&client);
                Ok(created)
            }
            .boxed()
        })
    }

    pub fn update(&self) -> Mutation<(i64, InstallmentInput), Installment> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new(
            "update installment",
            move |(id, input): (i64, InstallmentInput)| {
                let (client, service) = (client.clone(), service.clone());
                async move {
                    let updated = service.update(id, &input).await?;
                    client.invalidate(QueryKey::Installment(id));
                    invalidate_views(&client);
                    Ok(updated)
                }
                .boxed()
            },
        )
    }

    pub fn settle(&self) -> Mutation<i64, Installment> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("settle installment", move |id: i64| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                let settled = service.settle(id).await?;
                client.invalidate(QueryKey::Installment(id));
                invalidate_views(&client);
                Ok(settled)
            }
            .boxed()
        })
    }

    /// On success the record disappears from cached lists immediately; the
    /// lists are then refetched to reconcile with the backend.
    pub fn delete(&self) -> Mutation<i64, ()> {
        let (client, service) = (self.client.clone(), self.service.clone());
        Mutation::new("delete installment", move |id: i64| {
            let (client, service) = (client.clone(), service.clone());
            async move {
                service.delete(id).await?;
                prune_from_lists(&client, id);
                client.remove(QueryKey::Installment(id));
                invalidate_views(&client);
                Ok(())
            }
            .boxed()
        })
    }
}

async fn fetch_filtered(
    service: &InstallmentService,
    filter: InstallmentFilter,
) -> Result<Vec<Installment>> {
    match filter {
        InstallmentFilter::Unfiltered => service.get_all().await,
        InstallmentFilter::ByDueDate(date) => service.get_by_due_date(date).await,
        InstallmentFilter::ByCollector(id) => service.get_by_collector(id).await,
        InstallmentFilter::ByDebtor(id) => service.get_by_debtor(id).await,
        InstallmentFilter::Overdue => service.get_overdue().await,
    }
}
