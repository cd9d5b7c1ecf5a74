//! Fee structure models and DTOs, re-exported from the shared crate.

pub use bursar_models::fees::{
    CreateFeeComponentDto, CreateFeeStructureDto, FeeComponent, FeeStructure, FeeStructureFilter,
    FeeStructureResponse, UpdateFeeStructureDto,
};

use serde::Serialize;
use utoipa::ToSchema;

use crate::utils::pagination::PaginationMeta;

/// Paginated fee structure listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedFeeStructuresResponse {
    pub data: Vec<FeeStructureResponse>,
    pub meta: PaginationMeta,
}
