pub mod approvals;
pub mod auth;
pub mod employees;
pub mod expenses;
pub mod health;
pub mod profile;
pub mod reports;
pub mod resources;
