//! Storage seam for the workflow engine.
//!
//! Handlers never talk to the database directly; they go through a
//! `dyn Store` held in `AppState`. Every mutating method is a single
//! conditional statement that carries id, ownership scope and required prior
//! state together, and reports whether a row was touched. `false` covers both
//! "no such record" and "record not in the required state".

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::authz::Scope;
use crate::errors::AppResult;
use crate::models::employee::{DbEmployee, NewEmployee, ProfileChanges};
use crate::models::expense::{Expense, ExpenseChanges, ExpenseFilter, NewExpense};
use crate::models::report::ExpenseTypeTotal;
use crate::models::resource::{NewResource, Resource, ResourceChanges, ResourceFilter};
use crate::workflow::states::{ExpenseTransition, ResourceTransition};

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<i64>;

    async fn find_employee(&self, id: i64) -> AppResult<Option<DbEmployee>>;

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<DbEmployee>>;

    async fn list_employees(&self) -> AppResult<Vec<DbEmployee>>;

    /// Never touches the stored role.
    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> AppResult<bool>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert_expense(&self, expense: NewExpense) -> AppResult<i64>;

    async fn find_expense(&self, id: i64, scope: Scope) -> AppResult<Option<Expense>>;

    async fn list_expenses(&self, filter: &ExpenseFilter) -> AppResult<Vec<Expense>>;

    async fn transition_expense(&self, id: i64, transition: ExpenseTransition, at: DateTime<Utc>) -> AppResult<bool>;

    async fn update_expense(&self, id: i64, scope: Scope, changes: &ExpenseChanges) -> AppResult<bool>;

    async fn attach_receipt(&self, id: i64, scope: Scope, receipt: &str) -> AppResult<bool>;

    async fn delete_expense(&self, id: i64, scope: Scope) -> AppResult<bool>;

    /// Whether any expense still points at a receipt file with this name.
    async fn receipt_in_use(&self, file_name: &str) -> AppResult<bool>;

    /// Sum of amounts per expense type for one calendar month (UTC).
    async fn monthly_totals(&self, month: u32, year: i32) -> AppResult<Vec<ExpenseTypeTotal>>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn insert_resource(&self, resource: NewResource) -> AppResult<i64>;

    async fn find_resource(&self, id: i64, scope: Scope) -> AppResult<Option<Resource>>;

    async fn list_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>>;

    async fn transition_resource(&self, id: i64, transition: ResourceTransition) -> AppResult<bool>;

    async fn update_resource(&self, id: i64, scope: Scope, changes: &ResourceChanges) -> AppResult<bool>;

    async fn delete_resource(&self, id: i64, scope: Scope) -> AppResult<bool>;
}

#[async_trait]
pub trait Store: EmployeeStore + ExpenseStore + ResourceStore {
    /// Lightweight liveness check for the health endpoint.
    async fn ping(&self) -> AppResult<()>;
}
