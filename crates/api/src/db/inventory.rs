//! Inventory repository: product catalog and stock counters.
//!
//! Increments are evaluated server-side inside a single upsert, and
//! decrements take a row lock before checking sufficiency, so concurrent
//! adjustments of the same product neither lose updates nor overdraw.
//! The `ck_stock_non_negative` constraint backs the decrement path.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use laundry_core::{ProductTypeId, StockId};

use super::{RepositoryError, is_check_violation, is_numeric_overflow};
use crate::models::{ProductType, ProductTypeWithStock, Stock, StockEntry};

const NON_NEGATIVE_CONSTRAINT: &str = "ck_stock_non_negative";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductTypeRow {
    id: i32,
    description: String,
    unit_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<ProductTypeRow> for ProductType {
    fn from(row: ProductTypeRow) -> Self {
        Self {
            id: ProductTypeId::new(row.id),
            description: row.description,
            unit_price_cents: row.unit_price_cents,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductTypeWithStockRow {
    #[sqlx(flatten)]
    product: ProductTypeRow,
    available_quantity: i32,
    stock_updated_at: DateTime<Utc>,
}

impl From<ProductTypeWithStockRow> for ProductTypeWithStock {
    fn from(row: ProductTypeWithStockRow) -> Self {
        Self {
            product: row.product.into(),
            available_quantity: row.available_quantity,
            stock_updated_at: row.stock_updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i32,
    product_type_id: i32,
    available_quantity: i32,
    updated_at: Option<DateTime<Utc>>,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Self {
            id: StockId::new(row.id),
            product_type_id: ProductTypeId::new(row.product_type_id),
            available_quantity: row.available_quantity,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockEntryRow {
    #[sqlx(flatten)]
    stock: StockRow,
    description: String,
}

impl From<StockEntryRow> for StockEntry {
    fn from(row: StockEntryRow) -> Self {
        Self {
            stock: row.stock.into(),
            description: row.description,
        }
    }
}

/// Outcome of a stock decrement.
#[derive(Debug, Clone)]
pub enum SubtractOutcome {
    /// The decrement was committed.
    Applied(Stock),
    /// The product has no stock row.
    Missing,
    /// Not enough stock; nothing was changed.
    Insufficient { available: i32 },
}

/// Outcome of a stock increment.
#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// The increment was committed.
    Applied(Stock),
    /// The new total would not fit the quantity column; nothing was changed.
    OutOfRange,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product type and stock operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product type together with its zero-quantity stock row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either insert fails.
    pub async fn create_product_type(
        &self,
        description: &str,
        unit_price_cents: i64,
    ) -> Result<ProductType, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductTypeRow>(
            r"
            INSERT INTO product_types (description, unit_price_cents)
            VALUES ($1, $2)
            RETURNING id, description, unit_price_cents, created_at
            ",
        )
        .bind(description)
        .bind(unit_price_cents)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO stock (product_type_id, available_quantity)
            VALUES ($1, 0)
            ON CONFLICT (product_type_id) DO NOTHING
            ",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// List product types with their stock, newest product first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_product_types(&self) -> Result<Vec<ProductTypeWithStock>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductTypeWithStockRow>(
            r"
            SELECT p.id, p.description, p.unit_price_cents, p.created_at,
                   COALESCE(s.available_quantity, 0) AS available_quantity,
                   COALESCE(s.updated_at, p.created_at) AS stock_updated_at
            FROM product_types p
            LEFT JOIN stock s ON s.product_type_id = p.id
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add to a product's stock, creating the row if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product type doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_stock(
        &self,
        product_type_id: ProductTypeId,
        quantity: i32,
    ) -> Result<AddOutcome, RepositoryError> {
        let result = sqlx::query_as::<_, StockRow>(
            r"
            INSERT INTO stock (product_type_id, available_quantity, updated_at)
            SELECT id, $2, NOW()
            FROM product_types
            WHERE id = $1
            ON CONFLICT (product_type_id) DO UPDATE
            SET available_quantity = stock.available_quantity + EXCLUDED.available_quantity,
                updated_at = NOW()
            RETURNING id, product_type_id, available_quantity, updated_at
            ",
        )
        .bind(product_type_id.as_i32())
        .bind(quantity)
        .fetch_optional(self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(AddOutcome::Applied(row.into())),
            Ok(None) => Err(RepositoryError::NotFound),
            Err(e) if is_numeric_overflow(&e) => Ok(AddOutcome::OutOfRange),
            Err(e) => Err(e.into()),
        }
    }

    /// Subtract from a product's stock if enough is available.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn subtract_stock(
        &self,
        product_type_id: ProductTypeId,
        quantity: i32,
    ) -> Result<SubtractOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, StockRow>(
            r"
            SELECT id, product_type_id, available_quantity, updated_at
            FROM stock
            WHERE product_type_id = $1
            FOR UPDATE
            ",
        )
        .bind(product_type_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(SubtractOutcome::Missing);
        };

        if current.available_quantity < quantity {
            return Ok(SubtractOutcome::Insufficient {
                available: current.available_quantity,
            });
        }

        let updated = sqlx::query_as::<_, StockRow>(
            r"
            UPDATE stock
            SET available_quantity = available_quantity - $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, product_type_id, available_quantity, updated_at
            ",
        )
        .bind(current.id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await;

        let updated = match updated {
            Ok(row) => row,
            Err(e) if is_check_violation(&e, NON_NEGATIVE_CONSTRAINT) => {
                return Ok(SubtractOutcome::Insufficient {
                    available: current.available_quantity,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Ok(SubtractOutcome::Applied(updated.into()))
    }

    /// List stock rows with product descriptions, most recently updated first.
    ///
    /// Rows never updated sort last; ties break on ID descending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_stock(&self) -> Result<Vec<StockEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockEntryRow>(
            r"
            SELECT s.id, s.product_type_id, s.available_quantity, s.updated_at,
                   p.description
            FROM stock s
            JOIN product_types p ON p.id = s.product_type_id
            ORDER BY s.updated_at DESC NULLS LAST, s.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
