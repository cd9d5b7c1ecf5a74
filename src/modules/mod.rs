pub mod fee_structures;
pub mod payments;
pub mod student_fees;
