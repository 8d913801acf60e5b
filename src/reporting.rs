use crate::errors::{AppError, AppResult};
use crate::models::report::{ExpenseTypeTotal, MonthlySummaryQuery};
use crate::store::Store;
use crate::utils::non_blank;

/// Parses `month`/`year` query values into a calendar month.
pub fn parse_period(query: &MonthlySummaryQuery) -> AppResult<(u32, i32)> {
    let (Some(month), Some(year)) = (non_blank(query.month.as_deref()), non_blank(query.year.as_deref())) else {
        return Err(AppError::validation("Month and year are required!"));
    };

    let month = month
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| AppError::validation("Month must be between 1 and 12!"))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| AppError::validation("Year must be a valid number!"))?;

    Ok((month, year))
}

/// Per-type totals for one month, ordered by expense type.
pub async fn monthly_summary(store: &dyn Store, query: &MonthlySummaryQuery) -> AppResult<Vec<ExpenseTypeTotal>> {
    let (month, year) = parse_period(query)?;
    let totals = store.monthly_totals(month, year).await?;
    tracing::debug!(month, year, groups = totals.len(), "monthly summary computed");
    Ok(totals)
}
