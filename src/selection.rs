//! Selections

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::services::ServiceId;

/// Errors building a selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Quantities must be at least one.
    #[error("quantity for {0} must be at least 1")]
    ZeroQuantity(ServiceId),

    /// The quantity overflowed when merging a repeated service.
    #[error("quantity for {0} is too large")]
    QuantityOverflow(ServiceId),

    /// A `service[=quantity]` token could not be parsed.
    #[error("invalid selection `{0}`; expected serviceId or serviceId=quantity")]
    InvalidToken(String),
}

/// One selected service and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionLine {
    /// Selected service
    pub service_id: ServiceId,

    /// Number of units (images for per-unit services)
    pub quantity: u32,
}

impl FromStr for SelectionLine {
    type Err = SelectionError;

    /// Parse `hdrPhotography` or `virtualStaging=5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectionError::InvalidToken(s.to_string());

        let (id, quantity) = match s.split_once('=') {
            Some((id, quantity)) => (
                id,
                quantity.trim().parse::<u32>().map_err(|_err| invalid())?,
            ),
            None => (s, 1),
        };

        let service_id = ServiceId::from_id(id.trim())
            .or_else(|| ServiceId::from_name(id))
            .ok_or_else(invalid)?;

        if quantity == 0 {
            return Err(SelectionError::ZeroQuantity(service_id));
        }

        Ok(SelectionLine {
            service_id,
            quantity,
        })
    }
}

/// A customer's chosen services for one size bucket, in the order first chosen.
///
/// Each service appears at most once; choosing it again increases its quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    lines: SmallVec<[SelectionLine; 8]>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from lines, merging repeated services.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] for zero or overflowing quantities.
    pub fn from_lines(
        lines: impl IntoIterator<Item = SelectionLine>,
    ) -> Result<Self, SelectionError> {
        let mut selection = Self::new();

        for line in lines {
            selection.add(line.service_id, line.quantity)?;
        }

        Ok(selection)
    }

    /// Add `quantity` units of a service.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::ZeroQuantity`]: `quantity` is zero.
    /// - [`SelectionError::QuantityOverflow`]: merging would overflow `u32`.
    pub fn add(
        &mut self,
        service_id: ServiceId,
        quantity: u32,
    ) -> Result<&mut Self, SelectionError> {
        if quantity == 0 {
            return Err(SelectionError::ZeroQuantity(service_id));
        }

        match self.lines.iter_mut().find(|line| line.service_id == service_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(SelectionError::QuantityOverflow(service_id))?;
            }
            None => self.lines.push(SelectionLine {
                service_id,
                quantity,
            }),
        }

        Ok(self)
    }

    /// Remove a service entirely. Returns the removed line, if any.
    pub fn remove(&mut self, service_id: ServiceId) -> Option<SelectionLine> {
        let idx = self
            .lines
            .iter()
            .position(|line| line.service_id == service_id)?;

        Some(self.lines.remove(idx))
    }

    /// Quantity chosen for a service, if selected.
    pub fn quantity_of(&self, service_id: ServiceId) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.service_id == service_id)
            .map(|line| line.quantity)
    }

    /// Selected lines in order.
    pub fn lines(&self) -> &[SelectionLine] {
        &self.lines
    }

    /// Get the number of distinct services selected.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
