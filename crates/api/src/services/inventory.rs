//! Inventory ledger: product catalog and stock adjustments.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use laundry_core::{ErrorKind, ProductTypeId};

use crate::db::inventory::{AddOutcome, SubtractOutcome};
use crate::db::{InventoryRepository, RepositoryError};
use crate::models::{ProductType, ProductTypeWithStock, Stock, StockEntry};

/// Errors from inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("product type not found")]
    ProductTypeNotFound,

    #[error("no stock recorded for this product type")]
    StockNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl InventoryError {
    /// Classify this error for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InsufficientStock { .. } => ErrorKind::InvalidInput,
            Self::ProductTypeNotFound | Self::StockNotFound => ErrorKind::NotFound,
            Self::Repository(e) => e.kind(),
        }
    }
}

/// Inventory service.
pub struct InventoryService<'a> {
    inventory: InventoryRepository<'a>,
}

impl<'a> InventoryService<'a> {
    /// Create a new inventory service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            inventory: InventoryRepository::new(pool),
        }
    }

    /// Create a product type with a zero stock row.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidInput` for a blank description or a
    /// negative price.
    #[instrument(skip(self))]
    pub async fn create_product_type(
        &self,
        description: &str,
        unit_price_cents: i64,
    ) -> Result<ProductType, InventoryError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(InventoryError::InvalidInput("description must not be empty"));
        }
        if unit_price_cents < 0 {
            return Err(InventoryError::InvalidInput(
                "unit_price_cents must be non-negative",
            ));
        }

        let product = self
            .inventory
            .create_product_type(description, unit_price_cents)
            .await?;
        tracing::info!(product_type_id = %product.id, "Product type created");

        Ok(product)
    }

    /// List product types with stock, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list_product_types(&self) -> Result<Vec<ProductTypeWithStock>, InventoryError> {
        Ok(self.inventory.list_product_types().await?)
    }

    /// Add `quantity` units to a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidInput` if `quantity <= 0`.
    /// Returns `InventoryError::InvalidInput` if the new total would overflow.
    /// Returns `InventoryError::ProductTypeNotFound` for an unknown product.
    #[instrument(skip(self))]
    pub async fn add_stock(
        &self,
        product_type_id: ProductTypeId,
        quantity: i32,
    ) -> Result<Stock, InventoryError> {
        validate_quantity(quantity)?;

        let outcome = self
            .inventory
            .add_stock(product_type_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => InventoryError::ProductTypeNotFound,
                other => InventoryError::Repository(other),
            })?;

        match outcome {
            AddOutcome::Applied(stock) => Ok(stock),
            AddOutcome::OutOfRange => Err(InventoryError::InvalidInput(
                "stock quantity out of range",
            )),
        }
    }

    /// Remove `quantity` units from a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidInput` if `quantity <= 0`.
    /// Returns `InventoryError::StockNotFound` if the product has no stock row.
    /// Returns `InventoryError::InsufficientStock` if fewer units are available.
    #[instrument(skip(self))]
    pub async fn subtract_stock(
        &self,
        product_type_id: ProductTypeId,
        quantity: i32,
    ) -> Result<Stock, InventoryError> {
        validate_quantity(quantity)?;

        match self
            .inventory
            .subtract_stock(product_type_id, quantity)
            .await?
        {
            SubtractOutcome::Applied(stock) => Ok(stock),
            SubtractOutcome::Missing => Err(InventoryError::StockNotFound),
            SubtractOutcome::Insufficient { available } => {
                Err(InventoryError::InsufficientStock {
                    available,
                    requested: quantity,
                })
            }
        }
    }

    /// List stock rows, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list_stock(&self) -> Result<Vec<StockEntry>, InventoryError> {
        Ok(self.inventory.list_stock().await?)
    }
}

fn validate_quantity(quantity: i32) -> Result<(), InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidInput("quantity must be positive"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            InventoryError::InsufficientStock {
                available: 4,
                requested: 6
            }
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            InventoryError::ProductTypeNotFound.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(InventoryError::StockNotFound.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_insufficient_message() {
        let err = InventoryError::InsufficientStock {
            available: 15,
            requested: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock: 15 available, 100 requested"
        );
    }

    #[tokio::test]
    async fn test_rejections_happen_before_database() {
        let pool = lazy_pool();
        let inventory = InventoryService::new(&pool);
        let id = ProductTypeId::new(1);

        let err = inventory.add_stock(id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = inventory.subtract_stock(id, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = inventory
            .create_product_type("Wash & Fold", -1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = inventory.create_product_type("  ", 500).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
