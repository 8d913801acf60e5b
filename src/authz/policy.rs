use super::Role;
use crate::errors::{AppError, AppResult};

/// Which rows a caller may touch. `Owner` ends up in the WHERE clause of the
/// same statement that reads or mutates the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    Owner(i64),
}

impl Scope {
    pub fn owner(&self) -> Option<i64> {
        match self {
            Scope::Any => None,
            Scope::Owner(id) => Some(*id),
        }
    }

    pub fn allows(&self, owner_id: i64) -> bool {
        match self {
            Scope::Any => true,
            Scope::Owner(id) => *id == owner_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitExpense,
    ApproveExpense,
    RejectExpense,
    ReimburseExpense,
    EditExpense,
    DeleteExpense,
    ViewExpense,
    ReviewFieldWork,
    SubmitResource,
    ApproveResource,
    RejectResource,
    EditResource,
    DeleteResource,
    ViewResource,
}

impl Action {
    /// The single role allowed to perform a role-gated action, or `None` when
    /// every authenticated role may attempt it (subject to its scope).
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Action::SubmitExpense | Action::SubmitResource => Some(Role::Employee),
            Action::ApproveExpense
            | Action::RejectExpense
            | Action::ReimburseExpense
            | Action::ReviewFieldWork => Some(Role::Finance),
            Action::ApproveResource | Action::RejectResource => Some(Role::Manager),
            Action::EditExpense
            | Action::DeleteExpense
            | Action::ViewExpense
            | Action::EditResource
            | Action::DeleteResource
            | Action::ViewResource => None,
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.required_role().map_or(true, |required| required == role)
    }

    /// Rows the role may reach through this action.
    pub fn scope(&self, role: Role, employee_id: i64) -> Scope {
        let unrestricted = match self {
            Action::EditExpense | Action::DeleteExpense => role == Role::Finance,
            Action::ViewExpense => matches!(role, Role::Finance | Role::Manager),
            Action::ViewResource => role == Role::Manager,
            Action::EditResource | Action::DeleteResource => false,
            // role-gated transitions are already restricted to their approver
            _ => true,
        };

        if unrestricted {
            Scope::Any
        } else {
            Scope::Owner(employee_id)
        }
    }

    fn denial(&self) -> &'static str {
        match self {
            Action::SubmitExpense => "Only employees can submit expenses!",
            Action::ApproveExpense => "Only Finance can approve expenses!",
            Action::RejectExpense => "Only Finance can reject expenses!",
            Action::ReimburseExpense => "Only Finance can mark expenses as reimbursed!",
            Action::ReviewFieldWork => "Only Finance can view pending field work reimbursements!",
            Action::SubmitResource => "Only employees can request resources!",
            Action::ApproveResource => "Only Managers can approve resource requests!",
            Action::RejectResource => "Only Managers can reject resource requests!",
            _ => "Access denied.",
        }
    }
}

/// Role check performed before any store access, so a wrong-role caller is
/// rejected no matter what state the record is in.
pub fn authorize(role: Role, action: Action) -> AppResult<()> {
    if action.permits(role) {
        return Ok(());
    }

    tracing::debug!(role = %role, action = ?action, "permission denied");
    Err(AppError::forbidden(action.denial()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Employee, Role::Finance, Role::Manager, Role::Admin];

    #[test]
    fn only_finance_moves_expenses() {
        for action in [Action::ApproveExpense, Action::RejectExpense, Action::ReimburseExpense] {
            for role in ALL_ROLES {
                assert_eq!(action.permits(role), role == Role::Finance, "{action:?} for {role}");
            }
        }
    }

    #[test]
    fn only_managers_move_resources() {
        for action in [Action::ApproveResource, Action::RejectResource] {
            for role in ALL_ROLES {
                assert_eq!(action.permits(role), role == Role::Manager, "{action:?} for {role}");
            }
        }
    }

    #[test]
    fn only_employees_submit() {
        assert!(Action::SubmitExpense.permits(Role::Employee));
        assert!(!Action::SubmitExpense.permits(Role::Finance));
        assert!(!Action::SubmitResource.permits(Role::Manager));
    }

    #[test]
    fn finance_edits_any_expense_others_only_their_own() {
        assert_eq!(Action::EditExpense.scope(Role::Finance, 7), Scope::Any);
        assert_eq!(Action::EditExpense.scope(Role::Employee, 7), Scope::Owner(7));
        assert_eq!(Action::DeleteExpense.scope(Role::Manager, 7), Scope::Owner(7));
    }

    #[test]
    fn resource_edits_are_owner_only_for_every_role() {
        for role in ALL_ROLES {
            assert_eq!(Action::EditResource.scope(role, 3), Scope::Owner(3));
            assert_eq!(Action::DeleteResource.scope(role, 3), Scope::Owner(3));
        }
    }

    #[test]
    fn authorize_reports_forbidden() {
        let err = authorize(Role::Employee, Action::ApproveExpense).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(authorize(Role::Finance, Action::ApproveExpense).is_ok());
    }

    #[test]
    fn scope_allows_only_matching_owner() {
        assert!(Scope::Any.allows(1));
        assert!(Scope::Owner(1).allows(1));
        assert!(!Scope::Owner(1).allows(2));
    }
}
