use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use bursar_gateway::{CallbackPayload, GatewayStatus, RedirectParams};
use bursar_models::fees::{
    AssignStudentFeeDto, BalanceResponse, CreateConcessionDto, CreateFeeComponentDto,
    CreateFeeStructureDto, CreateFineDto, FeeComponent, FeeConcession, FeeFine, FeeStructure,
    FeeStructureResponse, FineStatus, InstallmentScheduleDto, InstallmentStatus, StudentFee,
    StudentFeeInstallment, StudentFeeResponse, UpdateFeeStructureDto,
};
use bursar_models::payments::{CallbackAck, CreateIntentDto, FeePayment, IntentState, PaymentIntent};

use crate::modules::fee_structures::model::PaginatedFeeStructuresResponse;
use crate::modules::payments::model::IntentCreatedResponse;
use crate::utils::errors::ErrorResponse;
use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::fee_structures::controller::create_fee_structure,
        crate::modules::fee_structures::controller::get_fee_structures,
        crate::modules::fee_structures::controller::get_fee_structure,
        crate::modules::fee_structures::controller::update_fee_structure,
        crate::modules::fee_structures::controller::delete_fee_structure,
        crate::modules::student_fees::controller::assign_student_fee,
        crate::modules::student_fees::controller::get_student_fee,
        crate::modules::student_fees::controller::get_balance,
        crate::modules::student_fees::controller::add_concession,
        crate::modules::student_fees::controller::add_fine,
        crate::modules::student_fees::controller::get_fee_payments,
        crate::modules::payments::controller::create_intent,
        crate::modules::payments::controller::get_intent,
        crate::modules::payments::controller::gateway_callback,
    ),
    components(
        schemas(
            FeeStructure,
            FeeComponent,
            FeeStructureResponse,
            CreateFeeStructureDto,
            CreateFeeComponentDto,
            UpdateFeeStructureDto,
            PaginatedFeeStructuresResponse,
            StudentFee,
            StudentFeeInstallment,
            InstallmentStatus,
            InstallmentScheduleDto,
            AssignStudentFeeDto,
            StudentFeeResponse,
            BalanceResponse,
            FeeConcession,
            CreateConcessionDto,
            FeeFine,
            FineStatus,
            CreateFineDto,
            PaymentIntent,
            IntentState,
            CreateIntentDto,
            IntentCreatedResponse,
            RedirectParams,
            CallbackPayload,
            GatewayStatus,
            CallbackAck,
            FeePayment,
            PaginationMeta,
            PaginationParams,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Fee Structures", description = "Fee structure templates per program and year"),
        (name = "Student Fees", description = "Per-student fee ledger: installments, concessions, fines"),
        (name = "Payments", description = "Payment intents and gateway reconciliation")
    ),
    info(
        title = "Bursar API",
        version = "0.1.0",
        description = "Fee ledger and payment reconciliation service for a college ERP.",
        contact(
            name = "API Support",
            email = "support@example.edu"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
