use chrono::NaiveDate;

use crate::cache::QueryKey;

/// Which installment list is on screen. Exactly one variant is active; see
/// [`InstallmentFilter::resolve`] for precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstallmentFilter {
    #[default]
    Unfiltered,
    ByDueDate(NaiveDate),
    ByCollector(i64),
    ByDebtor(i64),
    Overdue,
}

impl InstallmentFilter {
    /// First set filter wins: due date, then collector, then debtor, then
    /// the overdue toggle. Ids of `0` count as unset.
    pub fn resolve(
        due_date: Option<NaiveDate>,
        collector_id: Option<i64>,
        debtor_id: Option<i64>,
        overdue_only: bool,
    ) -> Self {
        if let Some(date) = due_date {
            return InstallmentFilter::ByDueDate(date);
        }
        if let Some(id) = collector_id.filter(|id| *id != 0) {
            return InstallmentFilter::ByCollector(id);
        }
        if let Some(id) = debtor_id.filter(|id| *id != 0) {
            return InstallmentFilter::ByDebtor(id);
        }
        if overdue_only {
            return InstallmentFilter::Overdue;
        }
        InstallmentFilter::Unfiltered
    }

    pub fn key(&self) -> QueryKey {
        match *self {
            InstallmentFilter::Unfiltered => QueryKey::Installments,
            InstallmentFilter::ByDueDate(date) => QueryKey::InstallmentsByDueDate(date),
            InstallmentFilter::ByCollector(id) => QueryKey::InstallmentsByCollector(id),
            InstallmentFilter::ByDebtor(id) => QueryKey::InstallmentsByDebtor(id),
            InstallmentFilter::Overdue => QueryKey::OverdueInstallments,
        }
    }

    pub fn label(&self) -> String {
        match self {
            InstallmentFilter::Unfiltered => "all installments".to_string(),
            InstallmentFilter::ByDueDate(date) => format!("due on {}", date.format("%d/%m/%Y")),
            InstallmentFilter::ByCollector(id) => format!("collector #{id}"),
            InstallmentFilter::ByDebtor(id) => format!("debtor #{id}"),
            InstallmentFilter::Overdue => "overdue installments".to_string(),
        }
    }
}
