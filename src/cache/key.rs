use std::fmt;

use chrono::NaiveDate;

use crate::common::PageRequest;

/// Group of keys that hold the same kind of data. Invalidation usually
/// targets a whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyFamily {
    People,
    Person,
    Installments,
    Installment,
    InstallmentsByDueDate,
    OverdueInstallments,
    InstallmentsByCollector,
    InstallmentsByDebtor,
    TotalReceivable,
    Messages,
    Message,
}

impl KeyFamily {
    pub const ALL: [KeyFamily; 11] = [
        KeyFamily::People,
        KeyFamily::Person,
        KeyFamily::Installments,
        KeyFamily::Installment,
        KeyFamily::InstallmentsByDueDate,
        KeyFamily::OverdueInstallments,
        KeyFamily::InstallmentsByCollector,
        KeyFamily::InstallmentsByDebtor,
        KeyFamily::TotalReceivable,
        KeyFamily::Messages,
        KeyFamily::Message,
    ];

    /// Name used in the config file.
    pub fn name(&self) -> &'static str {
        match self {
            KeyFamily::People => "people",
            KeyFamily::Person => "person",
            KeyFamily::Installments => "installments",
            KeyFamily::Installment => "installment",
            KeyFamily::InstallmentsByDueDate => "installments_by_due_date",
            KeyFamily::OverdueInstallments => "overdue_installments",
            KeyFamily::InstallmentsByCollector => "installments_by_collector",
            KeyFamily::InstallmentsByDebtor => "installments_by_debtor",
            KeyFamily::TotalReceivable => "total_receivable",
            KeyFamily::Messages => "messages",
            KeyFamily::Message => "message",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.name() == name)
    }
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of one cache entry. Every distinct parameter value is a distinct
/// key; the parameterless variants are the unfiltered reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    People,
    Person(i64),
    Installments,
    Installment(i64),
    InstallmentsByDueDate(NaiveDate),
    OverdueInstallments,
    InstallmentsByCollector(i64),
    InstallmentsByDebtor(i64),
    TotalReceivable(i64),
    Messages(PageRequest),
    Message(i64),
}

impl QueryKey {
    pub fn family(&self) -> KeyFamily {
        match self {
            QueryKey::People => KeyFamily::People,
            QueryKey::Person(_) => KeyFamily::Person,
            QueryKey::Installments => KeyFamily::Installments,
            QueryKey::Installment(_) => KeyFamily::Installment,
            QueryKey::InstallmentsByDueDate(_) => KeyFamily::InstallmentsByDueDate,
            QueryKey::OverdueInstallments => KeyFamily::OverdueInstallments,
            QueryKey::InstallmentsByCollector(_) => KeyFamily::InstallmentsByCollector,
            QueryKey::InstallmentsByDebtor(_) => KeyFamily::InstallmentsByDebtor,
            QueryKey::TotalReceivable(_) => KeyFamily::TotalReceivable,
            QueryKey::Messages(_) => KeyFamily::Messages,
            QueryKey::Message(_) => KeyFamily::Message,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::People
            | QueryKey::Installments
            | QueryKey::OverdueInstallments => write!(f, "{}", self.family()),
            QueryKey::Person(id)
            | QueryKey::Installment(id)
            | QueryKey::InstallmentsByCollector(id)
            | QueryKey::InstallmentsByDebtor(id)
            | QueryKey::TotalReceivable(id)
            | QueryKey::Message(id) => write!(f, "{}[{id}]", self.family()),
            QueryKey::InstallmentsByDueDate(date) => {
                write!(f, "{}[{}]", self.family(), date.format("%Y-%m-%d"))
            }
            QueryKey::Messages(request) => {
                write!(f, "{}[page={},size={}]", self.family(), request.page, request.size)
            }
        }
    }
}

/// Selects the entries an invalidation, removal or bulk update applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    Exact(QueryKey),
    Family(KeyFamily),
}

impl KeyFilter {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::Exact(exact) => exact == key,
            KeyFilter::Family(family) => key.family() == *family,
        }
    }
}

impl From<QueryKey> for KeyFilter {
    fn from(key: QueryKey) -> Self {
        KeyFilter::Exact(key)
    }
}

impl From<KeyFamily> for KeyFilter {
    fn from(family: KeyFamily) -> Self {
        KeyFilter::Family(family)
    }
}
