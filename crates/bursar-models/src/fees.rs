//! Fee ledger entities and DTOs.
//!
//! A [`FeeStructure`] is the template of components (tuition, lab, hostel…)
//! for a program and academic year. Assigning it to a student creates a
//! [`StudentFee`] with an explicit [`StudentFeeInstallment`] schedule whose
//! amounts must sum to the structure total. Concessions and fines adjust the
//! outstanding balance afterwards; they never rewrite the schedule.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::ids::{
    ConcessionId, FeeComponentId, FeeStructureId, FineId, InstallmentId, StudentFeeId, StudentId,
};

/// Lifecycle of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Overdue,
}

/// Lifecycle of a fine. Waived fines drop out of the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fine_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FineStatus {
    Pending,
    Paid,
    Waived,
}

/// Fee structure template for a program/year. Immutable once assigned.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub name: String,
    pub program: String,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line item of a fee structure.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct FeeComponent {
    pub id: FeeComponentId,
    pub fee_structure_id: FeeStructureId,
    pub label: String,
    pub amount_minor: i64,
}

/// Fee structure with its components and derived total.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeeStructureResponse {
    #[serde(flatten)]
    pub structure: FeeStructure,
    pub components: Vec<FeeComponent>,
    pub total_minor: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateFeeComponentDto {
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    #[validate(range(min = 1))]
    pub amount_minor: i64,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFeeStructureDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub program: String,
    #[validate(length(min = 4, max = 20))]
    pub academic_year: String,
    #[validate(length(min = 1), nested)]
    pub components: Vec<CreateFeeComponentDto>,
}

impl CreateFeeStructureDto {
    /// Sum of the component amounts, the structure total.
    pub fn total_minor(&self) -> i64 {
        self.components.iter().map(|c| c.amount_minor).sum()
    }
}

/// Query parameters for listing fee structures.
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeeStructureFilter {
    pub program: Option<String>,
    pub academic_year: Option<String>,
}

/// Rename a fee structure. Component edits are not supported; structures
/// are immutable once assigned and replaced wholesale otherwise.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateFeeStructureDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// A student's instantiation of a fee structure.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StudentFee {
    pub id: StudentFeeId,
    pub student_id: StudentId,
    pub fee_structure_id: FeeStructureId,
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scheduled partial amount of a student fee, ordered by due date.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StudentFeeInstallment {
    pub id: InstallmentId,
    pub student_fee_id: StudentFeeId,
    pub due_date: NaiveDate,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub status: InstallmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Approved reduction of a student fee. Additive; never overwritten.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct FeeConcession {
    pub id: ConcessionId,
    pub student_fee_id: StudentFeeId,
    pub amount_minor: i64,
    pub reason: String,
    /// Staff user in the identity service who approved the concession.
    pub approved_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Penalty added to a student fee.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct FeeFine {
    pub id: FineId,
    pub student_fee_id: StudentFeeId,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub reason: String,
    pub status: FineStatus,
    /// Staff user in the identity service who imposed the fine.
    pub imposed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct InstallmentScheduleDto {
    pub due_date: NaiveDate,
    #[validate(range(min = 1))]
    pub amount_minor: i64,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AssignStudentFeeDto {
    pub student_id: StudentId,
    pub fee_structure_id: FeeStructureId,
    #[validate(length(min = 1), nested)]
    pub installments: Vec<InstallmentScheduleDto>,
}

impl AssignStudentFeeDto {
    /// Sum of the proposed schedule; must equal the structure total.
    pub fn schedule_total_minor(&self) -> i64 {
        self.installments.iter().map(|i| i.amount_minor).sum()
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateConcessionDto {
    #[validate(range(min = 1))]
    pub amount_minor: i64,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFineDto {
    #[validate(range(min = 1))]
    pub amount_minor: i64,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Student fee with its full ledger detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentFeeResponse {
    #[serde(flatten)]
    pub fee: StudentFee,
    pub installments: Vec<StudentFeeInstallment>,
    pub concessions: Vec<FeeConcession>,
    pub fines: Vec<FeeFine>,
}

/// Committed-state balance breakdown for a student fee.
///
/// `outstanding_minor` is installment remainders minus concessions plus
/// unpaid fine remainders, floored at zero.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub student_fee_id: StudentFeeId,
    pub installments_due_minor: i64,
    pub concession_minor: i64,
    pub fines_due_minor: i64,
    pub outstanding_minor: i64,
}
