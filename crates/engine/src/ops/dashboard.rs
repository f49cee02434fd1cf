use std::collections::BTreeMap;

use sea_orm::{QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{ExpenseRequest, ExpenseStatus, ResultEngine, expenses};

use super::Engine;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStats {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: u64,
    pub amount_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthStats {
    /// `YYYY-MM`
    pub month: String,
    pub amount_minor: i64,
}

/// Read-side summary of a user's own requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_expenses: u64,
    pub total_amount_minor: i64,
    pub by_status: StatusStats,
    /// Sorted by category name.
    pub categories: Vec<CategoryStats>,
    /// Sorted by month, oldest first.
    pub monthly: Vec<MonthStats>,
}

impl DashboardStats {
    pub fn from_expenses(expenses: &[ExpenseRequest]) -> Self {
        let mut stats = Self::default();
        let mut categories: BTreeMap<&str, (u64, i64)> = BTreeMap::new();
        let mut monthly: BTreeMap<String, i64> = BTreeMap::new();

        for expense in expenses {
            stats.total_expenses += 1;
            stats.total_amount_minor += expense.amount_minor;
            match expense.status {
                ExpenseStatus::Pending => stats.by_status.pending += 1,
                ExpenseStatus::Approved => stats.by_status.approved += 1,
                ExpenseStatus::Rejected => stats.by_status.rejected += 1,
            }

            let entry = categories.entry(expense.category.as_str()).or_default();
            entry.0 += 1;
            entry.1 += expense.amount_minor;

            *monthly
                .entry(expense.created_at.format("%Y-%m").to_string())
                .or_default() += expense.amount_minor;
        }

        stats.categories = categories
            .into_iter()
            .map(|(category, (count, amount_minor))| CategoryStats {
                category: category.to_string(),
                count,
                amount_minor,
            })
            .collect();
        stats.monthly = monthly
            .into_iter()
            .map(|(month, amount_minor)| MonthStats {
                month,
                amount_minor,
            })
            .collect();
        stats
    }
}

impl Engine {
    pub async fn dashboard_stats(&self, user_id: &str) -> ResultEngine<DashboardStats> {
        let expenses = expenses::Entity::find()
            .filter(expenses::Column::RequesterId.eq(user_id.to_string()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(ExpenseRequest::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(DashboardStats::from_expenses(&expenses))
    }
}
