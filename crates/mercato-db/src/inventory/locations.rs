//! # Location Registry
//!
//! Create, list, rename and (de)activate a vendor's stock locations.
//!
//! ```text
//!   create ──► active ──(update is_active=false / delete)──► inactive
//!                 ▲                                              │
//!                 └──────────(update is_active=true)─────────────┘
//!
//!   Deactivation is refused while the location holds stock or has a
//!   pending reservation: transfer it out first.
//! ```

use chrono::Utc;
use tracing::{info, instrument};

use super::retry::{run_with_retry, Attempt};
use super::{require_location, InventoryResult, InventoryService};
use crate::repository::location;
use mercato_core::validation::validate_location_name;
use mercato_core::{CoreError, InventoryLocation, ValidationError};

/// Partial update of a location. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl InventoryService {
    /// Creates an active location for an existing vendor.
    #[instrument(skip(self))]
    pub async fn create_location(&self, vendor_id: &str, name: &str) -> InventoryResult<InventoryLocation> {
        let name = validate_location_name(name)?;

        let vendor = self
            .db
            .vendors()
            .get_by_id(vendor_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownReference {
                entity: "Vendor".to_string(),
                id: vendor_id.to_string(),
            })?;

        if !vendor.is_active {
            return Err(ValidationError::Inactive {
                entity: "Vendor".to_string(),
                id: vendor.id,
            }
            .into());
        }

        let location = self
            .db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, name))
            .await?;

        info!(location_id = %location.id, vendor_id = %vendor.id, "Location created");
        Ok(location)
    }

    /// Lists a vendor's locations; inactive ones only when asked.
    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        vendor_id: &str,
        include_inactive: bool,
    ) -> InventoryResult<Vec<InventoryLocation>> {
        if self.db.vendors().get_by_id(vendor_id).await?.is_none() {
            return Err(CoreError::not_found("Vendor", vendor_id).into());
        }

        Ok(self
            .db
            .locations()
            .list_by_vendor(vendor_id, include_inactive)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_location(&self, id: &str) -> InventoryResult<InventoryLocation> {
        self.db
            .locations()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("InventoryLocation", id).into())
    }

    /// Renames and/or (de)activates a location.
    ///
    /// Deactivating runs the same emptiness check as [`Self::delete_location`].
    #[instrument(skip(self))]
    pub async fn update_location(
        &self,
        id: &str,
        update: LocationUpdate,
    ) -> InventoryResult<InventoryLocation> {
        let name = update
            .name
            .as_deref()
            .map(validate_location_name)
            .transpose()?;
        let name = name.as_deref();
        let is_active = update.is_active;

        run_with_retry(&self.retry, "update_location", "InventoryLocation", id, move || {
            self.try_update_location(id, name, is_active)
        })
        .await
    }

    /// Soft-deletes a location (sets `is_active = false`).
    ///
    /// Fails with `Conflict` while any stock record there is non-zero or a
    /// reservation there is still pending. Deleting an inactive location is
    /// a no-op.
    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: &str) -> InventoryResult<InventoryLocation> {
        self.update_location(
            id,
            LocationUpdate {
                name: None,
                is_active: Some(false),
            },
        )
        .await
    }

    async fn try_update_location(
        &self,
        id: &str,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> InventoryResult<Attempt<InventoryLocation>> {
        let mut tx = self.db.pool().begin().await?;

        let current = require_location(&mut tx, id).await?;
        let mut next = current.clone();
        if let Some(name) = name {
            next.name = name.to_string();
        }
        if let Some(active) = is_active {
            next.is_active = active;
        }

        if next == current {
            return Ok(Attempt::Done(current));
        }

        if current.is_active && !next.is_active {
            if location::count_nonzero_stock(&mut tx, id).await? > 0 {
                return Err(CoreError::conflict(
                    "InventoryLocation",
                    id,
                    "location still holds stock; transfer it out first",
                )
                .into());
            }
            if location::count_pending_reservations(&mut tx, id).await? > 0 {
                return Err(CoreError::conflict(
                    "InventoryLocation",
                    id,
                    "location has pending reservations",
                )
                .into());
            }
        }

        next.updated_at = Utc::now();
        location::update(&mut tx, &next).await?;
        tx.commit().await?;

        info!(
            location_id = %next.id,
            name = %next.name,
            is_active = next.is_active,
            "Location updated"
        );
        Ok(Attempt::Done(next))
    }
}
