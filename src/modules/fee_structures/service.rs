use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;

use bursar_models::ids::FeeStructureId;

use crate::modules::fee_structures::model::{
    CreateFeeStructureDto, FeeComponent, FeeStructure, FeeStructureFilter, FeeStructureResponse,
    UpdateFeeStructureDto,
};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationParams;

const STRUCTURE_COLS: &str = "id, name, program, academic_year, created_at, updated_at";

pub struct FeeStructureService;

impl FeeStructureService {
    #[instrument(skip(db, dto))]
    pub async fn create_structure(
        db: &PgPool,
        dto: CreateFeeStructureDto,
    ) -> Result<FeeStructureResponse, AppError> {
        let mut tx = db.begin().await?;

        let structure = sqlx::query_as::<_, FeeStructure>(&format!(
            "INSERT INTO fee_structures (name, program, academic_year)
             VALUES ($1, $2, $3)
             RETURNING {STRUCTURE_COLS}"
        ))
        .bind(&dto.name)
        .bind(&dto.program)
        .bind(&dto.academic_year)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Fee structure {} already exists for {} {}",
                        dto.name,
                        dto.program,
                        dto.academic_year
                    ));
                }
            }
            AppError::database(e)
        })?;

        let mut components = Vec::with_capacity(dto.components.len());
        for component in &dto.components {
            let row = sqlx::query_as::<_, FeeComponent>(
                "INSERT INTO fee_components (fee_structure_id, label, amount_minor)
                 VALUES ($1, $2, $3)
                 RETURNING id, fee_structure_id, label, amount_minor",
            )
            .bind(structure.id)
            .bind(&component.label)
            .bind(component.amount_minor)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert fee component")
            .map_err(AppError::database)?;
            components.push(row);
        }

        tx.commit().await?;

        let total_minor = components.iter().map(|c| c.amount_minor).sum();
        Ok(FeeStructureResponse {
            structure,
            components,
            total_minor,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_structure(
        db: &PgPool,
        id: FeeStructureId,
    ) -> Result<FeeStructureResponse, AppError> {
        let structure = sqlx::query_as::<_, FeeStructure>(&format!(
            "SELECT {STRUCTURE_COLS} FROM fee_structures WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch fee structure")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee structure not found")))?;

        let components = Self::components_of(db, id).await?;
        let total_minor = components.iter().map(|c| c.amount_minor).sum();

        Ok(FeeStructureResponse {
            structure,
            components,
            total_minor,
        })
    }

    #[instrument(skip(db))]
    pub async fn list_structures(
        db: &PgPool,
        filter: &FeeStructureFilter,
        pagination: &PaginationParams,
    ) -> Result<(Vec<FeeStructureResponse>, i64), AppError> {
        let structures = sqlx::query_as::<_, FeeStructure>(&format!(
            "SELECT {STRUCTURE_COLS} FROM fee_structures
             WHERE ($1::TEXT IS NULL OR program = $1)
               AND ($2::TEXT IS NULL OR academic_year = $2)
             ORDER BY program, academic_year, name
             LIMIT $3 OFFSET $4"
        ))
        .bind(&filter.program)
        .bind(&filter.academic_year)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to list fee structures")
        .map_err(AppError::database)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM fee_structures
             WHERE ($1::TEXT IS NULL OR program = $1)
               AND ($2::TEXT IS NULL OR academic_year = $2)",
        )
        .bind(&filter.program)
        .bind(&filter.academic_year)
        .fetch_one(db)
        .await
        .context("Failed to count fee structures")
        .map_err(AppError::database)?;

        let mut responses = Vec::with_capacity(structures.len());
        for structure in structures {
            let components = Self::components_of(db, structure.id).await?;
            let total_minor = components.iter().map(|c| c.amount_minor).sum();
            responses.push(FeeStructureResponse {
                structure,
                components,
                total_minor,
            });
        }

        Ok((responses, total))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_structure(
        db: &PgPool,
        id: FeeStructureId,
        dto: UpdateFeeStructureDto,
    ) -> Result<FeeStructureResponse, AppError> {
        Self::assert_unassigned(db, id).await?;

        let updated = sqlx::query_as::<_, FeeStructure>(&format!(
            "UPDATE fee_structures SET name = $1, updated_at = now()
             WHERE id = $2
             RETURNING {STRUCTURE_COLS}"
        ))
        .bind(&dto.name)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update fee structure")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee structure not found")))?;

        let components = Self::components_of(db, id).await?;
        let total_minor = components.iter().map(|c| c.amount_minor).sum();
        Ok(FeeStructureResponse {
            structure: updated,
            components,
            total_minor,
        })
    }

    #[instrument(skip(db))]
    pub async fn delete_structure(db: &PgPool, id: FeeStructureId) -> Result<(), AppError> {
        Self::assert_unassigned(db, id).await?;

        let result = sqlx::query("DELETE FROM fee_structures WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete fee structure")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Fee structure not found"
            )));
        }

        Ok(())
    }

    async fn components_of(
        db: &PgPool,
        id: FeeStructureId,
    ) -> Result<Vec<FeeComponent>, AppError> {
        sqlx::query_as::<_, FeeComponent>(
            "SELECT id, fee_structure_id, label, amount_minor
             FROM fee_components WHERE fee_structure_id = $1
             ORDER BY label",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch fee components")
        .map_err(AppError::database)
    }

    /// Structures are frozen once any student fee references them.
    async fn assert_unassigned(db: &PgPool, id: FeeStructureId) -> Result<(), AppError> {
        let assigned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM student_fees WHERE fee_structure_id = $1")
                .bind(id)
                .fetch_one(db)
                .await
                .context("Failed to check fee structure assignments")
                .map_err(AppError::database)?;

        if assigned > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Fee structure is assigned to {} student(s) and is immutable",
                assigned
            )));
        }

        Ok(())
    }
}
