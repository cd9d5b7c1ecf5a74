//! Student fee ledger models and DTOs, re-exported from the shared crate.

pub use bursar_models::fees::{
    AssignStudentFeeDto, BalanceResponse, CreateConcessionDto, CreateFineDto, FeeConcession,
    FeeFine, FineStatus, InstallmentScheduleDto, InstallmentStatus, StudentFee,
    StudentFeeInstallment, StudentFeeResponse,
};
