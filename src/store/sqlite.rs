use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{EmployeeStore, ExpenseStore, ResourceStore, Store};
use crate::authz::Scope;
use crate::errors::{AppError, AppResult};
use crate::models::employee::{DbEmployee, NewEmployee, ProfileChanges};
use crate::models::expense::{DbExpense, Expense, ExpenseChanges, ExpenseFilter, NewExpense, FIELD_WORK_CATEGORY};
use crate::models::report::ExpenseTypeTotal;
use crate::models::resource::{DbResource, NewResource, Resource, ResourceChanges, ResourceFilter};
use crate::utils::receipt_file_name;
use crate::workflow::states::{ApprovalStatus, ExpenseTransition, ReimbursementStatus, ResourceStatus, ResourceTransition};

const EMPLOYEE_COLUMNS: &str = "id, name, department, email, password_hash, role, created_at";

const EXPENSE_SELECT: &str = "SELECT e.id, e.employee_id, emp.name AS employee_name, e.expense_type, e.amount, \
     e.description, e.receipt, e.category, e.field_work_details, e.submitted_at, e.approval_status, \
     e.reimbursement_status, e.reimbursed_at \
     FROM expenses e LEFT JOIN employees emp ON emp.id = e.employee_id";

const RESOURCE_SELECT: &str = "SELECT r.id, r.employee_id, emp.name AS employee_name, r.resource_name, r.quantity, \
     r.reason, r.requested_at, r.status \
     FROM resources r LEFT JOIN employees emp ON emp.id = r.employee_id";

/// sqlx-backed store. All state lives in the database, so clones share it.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Appends the ownership predicate so it lands in the same statement as the
/// mutation it guards.
fn scoped(sql: &str, scope: Scope) -> String {
    match scope {
        Scope::Any => sql.to_string(),
        Scope::Owner(_) => format!("{sql} AND employee_id = ?"),
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_owner(query: SqliteQuery<'_>, scope: Scope) -> SqliteQuery<'_> {
    match scope.owner() {
        Some(owner) => query.bind(owner),
        None => query,
    }
}

#[async_trait]
impl EmployeeStore for SqliteStore {
    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<i64> {
        let result = sqlx::query(
            "INSERT INTO employees (name, department, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&employee.name)
        .bind(&employee.department)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(employee.role.as_str())
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::conflict("User already exists!"),
            other => AppError::Database(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn find_employee(&self, id: i64) -> AppResult<Option<DbEmployee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, DbEmployee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<DbEmployee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
        let employee = sqlx::query_as::<_, DbEmployee>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    async fn list_employees(&self) -> AppResult<Vec<DbEmployee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name, id");
        let employees = sqlx::query_as::<_, DbEmployee>(&sql).fetch_all(&self.pool).await?;
        Ok(employees)
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE employees SET name = COALESCE(?, name), department = COALESCE(?, department) WHERE id = ?",
        )
        .bind(&changes.name)
        .bind(&changes.department)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ExpenseStore for SqliteStore {
    async fn insert_expense(&self, expense: NewExpense) -> AppResult<i64> {
        let result = sqlx::query(
            "INSERT INTO expenses (employee_id, expense_type, amount, description, receipt, category, field_work_details, submitted_at, approval_status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(expense.employee_id)
        .bind(&expense.expense_type)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(&expense.receipt)
        .bind(&expense.category)
        .bind(&expense.field_work_details)
        .bind(expense.submitted_at)
        .bind(ApprovalStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_expense(&self, id: i64, scope: Scope) -> AppResult<Option<Expense>> {
        let mut qb = QueryBuilder::<Sqlite>::new(EXPENSE_SELECT);
        qb.push(" WHERE e.id = ").push_bind(id);
        if let Some(owner) = scope.owner() {
            qb.push(" AND e.employee_id = ").push_bind(owner);
        }

        qb.build_query_as::<DbExpense>()
            .fetch_optional(&self.pool)
            .await?
            .map(Expense::try_from)
            .transpose()
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> AppResult<Vec<Expense>> {
        let mut qb = QueryBuilder::<Sqlite>::new(EXPENSE_SELECT);
        qb.push(" WHERE 1 = 1");
        if let Some(owner) = filter.owner {
            qb.push(" AND e.employee_id = ").push_bind(owner);
        }
        if let Some(status) = filter.approval_status {
            qb.push(" AND e.approval_status = ").push_bind(status.as_str());
        }
        if let Some(category) = filter.category.as_deref() {
            qb.push(" AND e.category = ").push_bind(category);
        }
        qb.push(" ORDER BY e.submitted_at DESC, e.id DESC");

        qb.build_query_as::<DbExpense>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    async fn transition_expense(&self, id: i64, transition: ExpenseTransition, at: DateTime<Utc>) -> AppResult<bool> {
        let query = match transition {
            ExpenseTransition::Approve | ExpenseTransition::Reject => {
                let target = match transition {
                    ExpenseTransition::Approve => ApprovalStatus::Approved,
                    _ => ApprovalStatus::Rejected,
                };
                sqlx::query("UPDATE expenses SET approval_status = ? WHERE id = ? AND approval_status = ?")
                    .bind(target.as_str())
                    .bind(id)
                    .bind(ApprovalStatus::Pending.as_str())
            }
            ExpenseTransition::Reimburse => sqlx::query(
                "UPDATE expenses SET reimbursement_status = ?, reimbursed_at = ? \
                 WHERE id = ? AND approval_status = ? \
                 AND (reimbursement_status IS NULL OR reimbursement_status <> ?)",
            )
            .bind(ReimbursementStatus::Reimbursed.as_str())
            .bind(at)
            .bind(id)
            .bind(ApprovalStatus::Approved.as_str())
            .bind(ReimbursementStatus::Reimbursed.as_str()),
        };

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_expense(&self, id: i64, scope: Scope, changes: &ExpenseChanges) -> AppResult<bool> {
        let sql = scoped(
            "UPDATE expenses SET expense_type = COALESCE(?, expense_type), amount = COALESCE(?, amount), \
             description = COALESCE(?, description), \
             field_work_details = CASE WHEN COALESCE(?, category) = ? \
             THEN COALESCE(?, field_work_details) ELSE NULL END, \
             category = COALESCE(?, category) WHERE id = ?",
            scope,
        );

        // details survive only while the resulting category is field work
        let query = sqlx::query(&sql)
            .bind(&changes.expense_type)
            .bind(changes.amount)
            .bind(&changes.description)
            .bind(&changes.category)
            .bind(FIELD_WORK_CATEGORY)
            .bind(&changes.field_work_details)
            .bind(&changes.category)
            .bind(id);
        let result = bind_owner(query, scope).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attach_receipt(&self, id: i64, scope: Scope, receipt: &str) -> AppResult<bool> {
        let sql = scoped("UPDATE expenses SET receipt = ? WHERE id = ?", scope);
        let query = sqlx::query(&sql)
            .bind(receipt)
            .bind(id);
        let result = bind_owner(query, scope).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expense(&self, id: i64, scope: Scope) -> AppResult<bool> {
        let sql = scoped("DELETE FROM expenses WHERE id = ?", scope);
        let query = sqlx::query(&sql)
            .bind(id);
        let result = bind_owner(query, scope).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn receipt_in_use(&self, file_name: &str) -> AppResult<bool> {
        let pattern = format!("%{}", escape_like(file_name));
        let receipts = sqlx::query_scalar::<_, String>("SELECT receipt FROM expenses WHERE receipt LIKE ? ESCAPE '\\'")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(receipts
            .iter()
            .any(|stored| receipt_file_name(stored) == Some(file_name)))
    }

    async fn monthly_totals(&self, month: u32, year: i32) -> AppResult<Vec<ExpenseTypeTotal>> {
        let totals = sqlx::query_as::<_, ExpenseTypeTotal>(
            "SELECT expense_type, SUM(amount) AS total_amount FROM expenses \
             WHERE CAST(strftime('%m', submitted_at) AS INTEGER) = ? \
             AND CAST(strftime('%Y', submitted_at) AS INTEGER) = ? \
             GROUP BY expense_type ORDER BY expense_type",
        )
        .bind(i64::from(month))
        .bind(i64::from(year))
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    async fn insert_resource(&self, resource: NewResource) -> AppResult<i64> {
        let result = sqlx::query(
            "INSERT INTO resources (employee_id, resource_name, quantity, reason, requested_at, status) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(resource.employee_id)
        .bind(&resource.resource_name)
        .bind(resource.quantity)
        .bind(&resource.reason)
        .bind(resource.requested_at)
        .bind(ResourceStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_resource(&self, id: i64, scope: Scope) -> AppResult<Option<Resource>> {
        let mut qb = QueryBuilder::<Sqlite>::new(RESOURCE_SELECT);
        qb.push(" WHERE r.id = ").push_bind(id);
        if let Some(owner) = scope.owner() {
            qb.push(" AND r.employee_id = ").push_bind(owner);
        }

        qb.build_query_as::<DbResource>()
            .fetch_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>> {
        let mut qb = QueryBuilder::<Sqlite>::new(RESOURCE_SELECT);
        qb.push(" WHERE 1 = 1");
        if let Some(owner) = filter.owner {
            qb.push(" AND r.employee_id = ").push_bind(owner);
        }
        if let Some(status) = filter.status {
            qb.push(" AND r.status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY r.requested_at DESC, r.id DESC");

        qb.build_query_as::<DbResource>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Resource::try_from)
            .collect()
    }

    async fn transition_resource(&self, id: i64, transition: ResourceTransition) -> AppResult<bool> {
        let result = sqlx::query("UPDATE resources SET status = ? WHERE id = ? AND status = ?")
            .bind(transition.target().as_str())
            .bind(id)
            .bind(ResourceStatus::Pending.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_resource(&self, id: i64, scope: Scope, changes: &ResourceChanges) -> AppResult<bool> {
        let sql = scoped(
            "UPDATE resources SET resource_name = COALESCE(?, resource_name), quantity = COALESCE(?, quantity), \
             reason = COALESCE(?, reason) WHERE id = ?",
            scope,
        );

        let query = sqlx::query(&sql)
            .bind(&changes.resource_name)
            .bind(changes.quantity)
            .bind(&changes.reason)
            .bind(id);
        let result = bind_owner(query, scope).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_resource(&self, id: i64, scope: Scope) -> AppResult<bool> {
        let sql = scoped("DELETE FROM resources WHERE id = ?", scope);
        let query = sqlx::query(&sql)
            .bind(id);
        let result = bind_owner(query, scope).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
