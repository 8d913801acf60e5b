//! Registration, login and the caller's own profile.

use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::jwt::{AuthUser, JwtConfig};
use crate::models::employee::{
    Employee, LoginRequest, LoginResponse, NewEmployee, ProfileChanges, ProfileUpdateRequest, RegisterRequest,
};
use crate::store::Store;
use crate::utils::{hash_password, non_blank, utc_now, verify_password};
use crate::workflow::optional_text;

const BAD_LOGIN: &str = "Invalid email or password!";

/// Creates the account and returns the role derived from its department.
pub async fn register(store: &dyn Store, request: RegisterRequest) -> AppResult<Role> {
    let (Some(name), Some(department), Some(email), Some(password)) = (
        non_blank(request.name.as_deref()),
        non_blank(request.department.as_deref()),
        non_blank(request.email.as_deref()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("All fields are required!"));
    };
    let email = email.to_lowercase();

    if store.find_employee_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("User already exists!"));
    }

    let role = Role::from_department(&department);
    let id = store
        .insert_employee(NewEmployee {
            name,
            department,
            email,
            password_hash: hash_password(&password)?,
            role,
            created_at: utc_now(),
        })
        .await?;

    tracing::info!(employee_id = id, role = %role, "employee registered");
    Ok(role)
}

pub async fn login(store: &dyn Store, jwt: &JwtConfig, request: LoginRequest) -> AppResult<LoginResponse> {
    let (Some(email), Some(password)) = (
        non_blank(request.email.as_deref()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Email and password are required!"));
    };
    let email = email.to_lowercase();

    let Some(record) = store.find_employee_by_email(&email).await? else {
        tracing::debug!("login for unknown email");
        return Err(AppError::invalid_credentials(BAD_LOGIN));
    };
    if !verify_password(&password, &record.password_hash)? {
        tracing::debug!(employee_id = record.id, "login with wrong password");
        return Err(AppError::invalid_credentials(BAD_LOGIN));
    }

    let employee = Employee::try_from(record)?;
    let token = jwt.encode(employee.id, employee.role, &employee.department)?;

    tracing::info!(employee_id = employee.id, role = %employee.role, "login succeeded");
    Ok(LoginResponse {
        success: true,
        message: "Login successful!".to_string(),
        token,
        role: employee.role,
        department: employee.department.to_lowercase(),
    })
}

pub async fn profile(store: &dyn Store, user: &AuthUser) -> AppResult<Employee> {
    let record = store
        .find_employee(user.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let employee = Employee::try_from(record)?;

    if employee.role != user.role {
        tracing::warn!(
            employee_id = employee.id,
            stored_role = %employee.role,
            token_role = %user.role,
            "stored role differs from token role"
        );
    }

    Ok(employee)
}

/// Name and department only; the role stays what registration derived.
pub async fn update_profile(store: &dyn Store, user: &AuthUser, request: ProfileUpdateRequest) -> AppResult<Employee> {
    let changes = ProfileChanges {
        name: optional_text(request.name.as_deref(), "Name")?,
        department: optional_text(request.department.as_deref(), "Department")?,
    };
    if changes.is_empty() {
        return Err(AppError::validation("No fields to update!"));
    }

    if !store.update_profile(user.employee_id, &changes).await? {
        return Err(AppError::not_found("User not found"));
    }

    tracing::info!(employee_id = user.employee_id, "profile updated");
    profile(store, user).await
}

pub async fn list_employees(store: &dyn Store) -> AppResult<Vec<Employee>> {
    store
        .list_employees()
        .await?
        .into_iter()
        .map(Employee::try_from)
        .collect()
}
