use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use super::{EmployeeStore, ExpenseStore, ResourceStore, Store};
use crate::authz::Scope;
use crate::errors::{AppError, AppResult};
use crate::models::employee::{DbEmployee, NewEmployee, ProfileChanges};
use crate::models::expense::{Expense, ExpenseChanges, ExpenseFilter, NewExpense, FIELD_WORK_CATEGORY};
use crate::models::report::ExpenseTypeTotal;
use crate::models::resource::{NewResource, Resource, ResourceChanges, ResourceFilter};
use crate::utils::receipt_file_name;
use crate::workflow::states::{ApprovalStatus, ExpenseTransition, ResourceStatus, ResourceTransition};

#[derive(Debug, Default)]
struct State {
    employees: BTreeMap<i64, DbEmployee>,
    expenses: BTreeMap<i64, Expense>,
    resources: BTreeMap<i64, Resource>,
    next_employee: i64,
    next_expense: i64,
    next_resource: i64,
}

impl State {
    fn employee_name(&self, id: i64) -> Option<String> {
        self.employees.get(&id).map(|e| e.name.clone())
    }

    fn with_name_expense(&self, expense: &Expense) -> Expense {
        Expense {
            employee_name: self.employee_name(expense.employee_id),
            ..expense.clone()
        }
    }

    fn with_name_resource(&self, resource: &Resource) -> Resource {
        Resource {
            employee_name: self.employee_name(resource.employee_id),
            ..resource.clone()
        }
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn parse_details(raw: Option<&str>) -> Option<serde_json::Value> {
    raw.and_then(|raw| serde_json::from_str(raw).ok())
}

/// Process-local store used by unit tests. The mutex makes every method
/// atomic, which is the same guarantee the conditional SQL statements give.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<i64> {
        let mut state = self.lock()?;
        if state.employees.values().any(|e| e.email.eq_ignore_ascii_case(&employee.email)) {
            return Err(AppError::conflict("User already exists!"));
        }

        let id = next_id(&mut state.next_employee);
        state.employees.insert(
            id,
            DbEmployee {
                id,
                name: employee.name,
                department: employee.department,
                email: employee.email,
                password_hash: employee.password_hash,
                role: employee.role.as_str().to_string(),
                created_at: employee.created_at,
            },
        );
        Ok(id)
    }

    async fn find_employee(&self, id: i64) -> AppResult<Option<DbEmployee>> {
        Ok(self.lock()?.employees.get(&id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<DbEmployee>> {
        Ok(self.lock()?.employees.values().find(|e| e.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list_employees(&self) -> AppResult<Vec<DbEmployee>> {
        let mut employees: Vec<DbEmployee> = self.lock()?.employees.values().cloned().collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }

    async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> AppResult<bool> {
        let mut state = self.lock()?;
        let Some(employee) = state.employees.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(name) = &changes.name {
            employee.name = name.clone();
        }
        if let Some(department) = &changes.department {
            employee.department = department.clone();
        }
        Ok(true)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert_expense(&self, expense: NewExpense) -> AppResult<i64> {
        let mut state = self.lock()?;
        let id = next_id(&mut state.next_expense);
        state.expenses.insert(
            id,
            Expense {
                id,
                employee_id: expense.employee_id,
                employee_name: None,
                expense_type: expense.expense_type,
                amount: expense.amount,
                description: expense.description,
                receipt: expense.receipt,
                category: expense.category,
                field_work_details: parse_details(expense.field_work_details.as_deref()),
                submitted_at: expense.submitted_at,
                approval_status: ApprovalStatus::Pending,
                reimbursement_status: None,
                reimbursed_at: None,
            },
        );
        Ok(id)
    }

    async fn find_expense(&self, id: i64, scope: Scope) -> AppResult<Option<Expense>> {
        let state = self.lock()?;
        Ok(state
            .expenses
            .get(&id)
            .filter(|e| scope.allows(e.employee_id))
            .map(|e| state.with_name_expense(e)))
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> AppResult<Vec<Expense>> {
        let state = self.lock()?;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| filter.owner.map_or(true, |owner| e.employee_id == owner))
            .filter(|e| filter.approval_status.map_or(true, |s| e.approval_status == s))
            .filter(|e| filter.category.as_deref().map_or(true, |c| e.category == c))
            .map(|e| state.with_name_expense(e))
            .collect();
        expenses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(expenses)
    }

    async fn transition_expense(&self, id: i64, transition: ExpenseTransition, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.lock()?;
        let Some(expense) = state.expenses.get_mut(&id) else {
            return Ok(false);
        };
        let Some(next) = transition.apply(expense.state()) else {
            return Ok(false);
        };

        expense.approval_status = next.approval;
        if next.reimbursement != expense.reimbursement_status {
            expense.reimbursement_status = next.reimbursement;
            expense.reimbursed_at = Some(at);
        }
        Ok(true)
    }

    async fn update_expense(&self, id: i64, scope: Scope, changes: &ExpenseChanges) -> AppResult<bool> {
        let mut state = self.lock()?;
        let Some(expense) = state.expenses.get_mut(&id).filter(|e| scope.allows(e.employee_id)) else {
            return Ok(false);
        };
        if let Some(expense_type) = &changes.expense_type {
            expense.expense_type = expense_type.clone();
        }
        if let Some(amount) = changes.amount {
            expense.amount = amount;
        }
        if let Some(description) = &changes.description {
            expense.description = description.clone();
        }
        if let Some(category) = &changes.category {
            expense.category = category.clone();
        }
        if expense.category != FIELD_WORK_CATEGORY {
            expense.field_work_details = None;
        } else if let Some(details) = parse_details(changes.field_work_details.as_deref()) {
            expense.field_work_details = Some(details);
        }
        Ok(true)
    }

    async fn attach_receipt(&self, id: i64, scope: Scope, receipt: &str) -> AppResult<bool> {
        let mut state = self.lock()?;
        match state.expenses.get_mut(&id).filter(|e| scope.allows(e.employee_id)) {
            Some(expense) => {
                expense.receipt = Some(receipt.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_expense(&self, id: i64, scope: Scope) -> AppResult<bool> {
        let mut state = self.lock()?;
        let owned = state.expenses.get(&id).is_some_and(|e| scope.allows(e.employee_id));
        Ok(owned && state.expenses.remove(&id).is_some())
    }

    async fn receipt_in_use(&self, file_name: &str) -> AppResult<bool> {
        Ok(self
            .lock()?
            .expenses
            .values()
            .any(|e| e.receipt.as_deref().and_then(receipt_file_name) == Some(file_name)))
    }

    async fn monthly_totals(&self, month: u32, year: i32) -> AppResult<Vec<ExpenseTypeTotal>> {
        let state = self.lock()?;
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for expense in state.expenses.values() {
            if expense.submitted_at.month() == month && expense.submitted_at.year() == year {
                *totals.entry(expense.expense_type.clone()).or_default() += expense.amount;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(expense_type, total_amount)| ExpenseTypeTotal {
                expense_type,
                total_amount,
            })
            .collect())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn insert_resource(&self, resource: NewResource) -> AppResult<i64> {
        let mut state = self.lock()?;
        let id = next_id(&mut state.next_resource);
        state.resources.insert(
            id,
            Resource {
                id,
                employee_id: resource.employee_id,
                employee_name: None,
                resource_name: resource.resource_name,
                quantity: resource.quantity,
                reason: resource.reason,
                requested_at: resource.requested_at,
                status: ResourceStatus::Pending,
            },
        );
        Ok(id)
    }

    async fn find_resource(&self, id: i64, scope: Scope) -> AppResult<Option<Resource>> {
        let state = self.lock()?;
        Ok(state
            .resources
            .get(&id)
            .filter(|r| scope.allows(r.employee_id))
            .map(|r| state.with_name_resource(r)))
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> AppResult<Vec<Resource>> {
        let state = self.lock()?;
        let mut resources: Vec<Resource> = state
            .resources
            .values()
            .filter(|r| filter.owner.map_or(true, |owner| r.employee_id == owner))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .map(|r| state.with_name_resource(r))
            .collect();
        resources.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(resources)
    }

    async fn transition_resource(&self, id: i64, transition: ResourceTransition) -> AppResult<bool> {
        let mut state = self.lock()?;
        match state.resources.get_mut(&id) {
            Some(resource) => match transition.apply(resource.status) {
                Some(next) => {
                    resource.status = next;
                    Ok(true)
                }
                None => Ok(false),
            },
            None => Ok(false),
        }
    }

    async fn update_resource(&self, id: i64, scope: Scope, changes: &ResourceChanges) -> AppResult<bool> {
        let mut state = self.lock()?;
        let Some(resource) = state.resources.get_mut(&id).filter(|r| scope.allows(r.employee_id)) else {
            return Ok(false);
        };
        if let Some(name) = &changes.resource_name {
            resource.resource_name = name.clone();
        }
        if let Some(quantity) = changes.quantity {
            resource.quantity = quantity;
        }
        if let Some(reason) = &changes.reason {
            resource.reason = reason.clone();
        }
        Ok(true)
    }

    async fn delete_resource(&self, id: i64, scope: Scope) -> AppResult<bool> {
        let mut state = self.lock()?;
        let owned = state.resources.get(&id).is_some_and(|r| scope.allows(r.employee_id));
        Ok(owned && state.resources.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }
}
