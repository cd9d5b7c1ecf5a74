//! Pure allocation planning for confirmed payments.
//!
//! Given the locked ledger rows for a student fee, [`plan`] decides how a
//! confirmed amount spreads across installment remainders (earliest due
//! first, the caller provides them in that order) and then across unpaid
//! fines (oldest first). The planner never touches the database; the ledger
//! updater executes the plan inside the reconciliation transaction.

use sqlx::FromRow;

use bursar_models::fees::{FineStatus, InstallmentStatus};
use bursar_models::ids::{FineId, InstallmentId};

/// Snapshot of an installment row, locked `FOR UPDATE`.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct InstallmentSlice {
    pub id: InstallmentId,
    pub amount_minor: i64,
    pub paid_minor: i64,
}

/// Snapshot of an unpaid fine row, locked `FOR UPDATE`.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct FineSlice {
    pub id: FineId,
    pub amount_minor: i64,
    pub paid_minor: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct InstallmentAllocation {
    pub id: InstallmentId,
    pub applied_minor: i64,
    pub new_paid_minor: i64,
    pub new_status: InstallmentStatus,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FineAllocation {
    pub id: FineId,
    pub applied_minor: i64,
    pub new_paid_minor: i64,
    pub new_status: FineStatus,
}

#[derive(Debug)]
pub(crate) struct AllocationPlan {
    pub installments: Vec<InstallmentAllocation>,
    pub fines: Vec<FineAllocation>,
    /// Amount that found nowhere to go. Intent validation caps requests at
    /// the outstanding balance, so anything nonzero here is a ledger
    /// inconsistency.
    pub leftover_minor: i64,
}

pub(crate) fn plan(
    installments: &[InstallmentSlice],
    fines: &[FineSlice],
    amount_minor: i64,
) -> AllocationPlan {
    let mut remaining = amount_minor;
    let mut installment_allocations = Vec::new();

    for installment in installments {
        if remaining == 0 {
            break;
        }
        let due = installment.amount_minor - installment.paid_minor;
        if due <= 0 {
            continue;
        }
        let applied = remaining.min(due);
        let new_paid = installment.paid_minor + applied;
        installment_allocations.push(InstallmentAllocation {
            id: installment.id,
            applied_minor: applied,
            new_paid_minor: new_paid,
            new_status: if new_paid == installment.amount_minor {
                InstallmentStatus::Paid
            } else {
                InstallmentStatus::PartiallyPaid
            },
        });
        remaining -= applied;
    }

    let mut fine_allocations = Vec::new();
    for fine in fines {
        if remaining == 0 {
            break;
        }
        let due = fine.amount_minor - fine.paid_minor;
        if due <= 0 {
            continue;
        }
        let applied = remaining.min(due);
        let new_paid = fine.paid_minor + applied;
        fine_allocations.push(FineAllocation {
            id: fine.id,
            applied_minor: applied,
            new_paid_minor: new_paid,
            new_status: if new_paid == fine.amount_minor {
                FineStatus::Paid
            } else {
                FineStatus::Pending
            },
        });
        remaining -= applied;
    }

    AllocationPlan {
        installments: installment_allocations,
        fines: fine_allocations,
        leftover_minor: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installment(amount_minor: i64, paid_minor: i64) -> InstallmentSlice {
        InstallmentSlice {
            id: InstallmentId::new(),
            amount_minor,
            paid_minor,
        }
    }

    fn fine(amount_minor: i64, paid_minor: i64) -> FineSlice {
        FineSlice {
            id: FineId::new(),
            amount_minor,
            paid_minor,
        }
    }

    #[test]
    fn seven_hundred_over_two_five_hundreds() {
        // Installments due 2025-01-01 and 2025-02-01, $500 each; paying $700
        // settles the first and leaves $300 open on the second.
        let installments = [installment(50_000, 0), installment(50_000, 0)];
        let plan = plan(&installments, &[], 70_000);

        assert_eq!(plan.leftover_minor, 0);
        assert_eq!(plan.fines.len(), 0);
        assert_eq!(plan.installments.len(), 2);

        assert_eq!(plan.installments[0].applied_minor, 50_000);
        assert_eq!(plan.installments[0].new_status, InstallmentStatus::Paid);

        assert_eq!(plan.installments[1].applied_minor, 20_000);
        assert_eq!(plan.installments[1].new_paid_minor, 20_000);
        assert_eq!(
            plan.installments[1].new_status,
            InstallmentStatus::PartiallyPaid
        );
    }

    #[test]
    fn exact_amount_settles_everything() {
        let installments = [installment(30_000, 0), installment(20_000, 0)];
        let plan = plan(&installments, &[], 50_000);

        assert_eq!(plan.leftover_minor, 0);
        assert!(plan
            .installments
            .iter()
            .all(|a| a.new_status == InstallmentStatus::Paid));
    }

    #[test]
    fn tops_up_partially_paid_installment_first() {
        let installments = [installment(50_000, 30_000), installment(50_000, 0)];
        let plan = plan(&installments, &[], 25_000);

        assert_eq!(plan.installments[0].applied_minor, 20_000);
        assert_eq!(plan.installments[0].new_status, InstallmentStatus::Paid);
        assert_eq!(plan.installments[1].applied_minor, 5_000);
        assert_eq!(
            plan.installments[1].new_status,
            InstallmentStatus::PartiallyPaid
        );
        assert_eq!(plan.leftover_minor, 0);
    }

    #[test]
    fn skips_settled_installments() {
        let installments = [installment(50_000, 50_000), installment(50_000, 0)];
        let plan = plan(&installments, &[], 10_000);

        assert_eq!(plan.installments.len(), 1);
        assert_eq!(plan.installments[0].id, installments[1].id);
    }

    #[test]
    fn spills_over_into_fines() {
        let installments = [installment(50_000, 40_000)];
        let fines = [fine(5_000, 0), fine(2_000, 0)];
        let plan = plan(&installments, &fines, 16_000);

        assert_eq!(plan.installments[0].applied_minor, 10_000);
        assert_eq!(plan.fines.len(), 2);
        assert_eq!(plan.fines[0].applied_minor, 5_000);
        assert_eq!(plan.fines[0].new_status, FineStatus::Paid);
        assert_eq!(plan.fines[1].applied_minor, 1_000);
        assert_eq!(plan.fines[1].new_status, FineStatus::Pending);
        assert_eq!(plan.leftover_minor, 0);
    }

    #[test]
    fn reports_leftover_when_nothing_is_due() {
        let installments = [installment(50_000, 50_000)];
        let plan = plan(&installments, &[], 1_000);

        assert!(plan.installments.is_empty());
        assert_eq!(plan.leftover_minor, 1_000);
    }

    #[test]
    fn zero_amount_plans_nothing() {
        let installments = [installment(50_000, 0)];
        let plan = plan(&installments, &[], 0);

        assert!(plan.installments.is_empty());
        assert_eq!(plan.leftover_minor, 0);
    }
}
