//! Status values and the pure transition tables for both workflows.
//!
//! The store executes each transition as one conditional statement; these
//! tables are the same rules expressed in Rust, used by the in-memory store
//! and by tests that check the invariants.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::Action;

/// Expense approval status.
///
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Case-insensitive, so query strings like `?approval_status=pending` work.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReimbursementStatus {
    Reimbursed,
}

impl ReimbursementStatus {
    pub fn as_str(&self) -> &'static str {
        "Reimbursed"
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.eq_ignore_ascii_case("reimbursed").then_some(Self::Reimbursed)
    }
}

/// Resource request status: Pending → Approved | Rejected, both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ResourceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two independent status axes of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseState {
    pub approval: ApprovalStatus,
    pub reimbursement: Option<ReimbursementStatus>,
}

impl ExpenseState {
    pub const SUBMITTED: ExpenseState = ExpenseState {
        approval: ApprovalStatus::Pending,
        reimbursement: None,
    };

    /// Reimbursed implies Approved.
    pub fn is_consistent(&self) -> bool {
        self.reimbursement.is_none() || self.approval == ApprovalStatus::Approved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseTransition {
    Approve,
    Reject,
    Reimburse,
}

impl ExpenseTransition {
    pub fn action(&self) -> Action {
        match self {
            Self::Approve => Action::ApproveExpense,
            Self::Reject => Action::RejectExpense,
            Self::Reimburse => Action::ReimburseExpense,
        }
    }

    /// Next state, or `None` when the precondition does not hold.
    pub fn apply(&self, state: ExpenseState) -> Option<ExpenseState> {
        match self {
            Self::Approve if state.approval == ApprovalStatus::Pending => Some(ExpenseState {
                approval: ApprovalStatus::Approved,
                ..state
            }),
            Self::Reject if state.approval == ApprovalStatus::Pending => Some(ExpenseState {
                approval: ApprovalStatus::Rejected,
                ..state
            }),
            Self::Reimburse
                if state.approval == ApprovalStatus::Approved
                    && state.reimbursement != Some(ReimbursementStatus::Reimbursed) =>
            {
                Some(ExpenseState {
                    reimbursement: Some(ReimbursementStatus::Reimbursed),
                    ..state
                })
            }
            _ => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
            Self::Reimburse => "marked as reimbursed",
        }
    }

    pub fn unavailable_message(&self) -> &'static str {
        match self {
            Self::Approve | Self::Reject => "Expense not found or already processed!",
            Self::Reimburse => "Expense not found, not approved, or already reimbursed!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTransition {
    Approve,
    Reject,
}

impl ResourceTransition {
    pub fn action(&self) -> Action {
        match self {
            Self::Approve => Action::ApproveResource,
            Self::Reject => Action::RejectResource,
        }
    }

    pub fn target(&self) -> ResourceStatus {
        match self {
            Self::Approve => ResourceStatus::Approved,
            Self::Reject => ResourceStatus::Rejected,
        }
    }

    pub fn apply(&self, status: ResourceStatus) -> Option<ResourceStatus> {
        (status == ResourceStatus::Pending).then(|| self.target())
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}
