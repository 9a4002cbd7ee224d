//! Booking Submissions
//!
//! The server side of the booking form. A submission is validated, priced
//! again from the price table (client totals are advisory only), persisted,
//! and confirmed by email. Delivery is attempted once; a failed send is logged
//! and reported on the receipt but does not undo the booking.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    notification::{BookingDetails, ConfirmationEmail, EmailMessage},
    pricing::{PricingEngine, PricingError},
    quote::Quote,
    selection::{Selection, SelectionError, SelectionLine},
    services::ServiceId,
    sizes::{SizeBucket, SizeError},
};

/// Reasons a submission is rejected before pricing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("{0} is required")]
    BlankField(&'static str),

    /// The email address is not plausible.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// No services were selected.
    #[error("at least one service must be selected")]
    NoServices,

    /// A selection line is invalid.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The property is outside the priced size range.
    #[error(transparent)]
    Size(#[from] SizeError),
}

/// Failure persisting a booking.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not accept the record.
    #[error("booking store unavailable: {0}")]
    Unavailable(String),
}

/// Failure delivering a confirmation.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The email provider rejected or could not accept the message.
    #[error("confirmation delivery failed: {0}")]
    Delivery(String),
}

/// Errors returned by [`BookingHandler::submit`].
#[derive(Debug, Error)]
pub enum BookingError {
    /// The submission body is not valid JSON for a booking.
    #[error("malformed booking submission: {0}")]
    Json(#[from] serde_json::Error),

    /// The submission failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Some selected services have no price for the property's size.
    #[error("services not priced for {bucket}: {services:?}")]
    Unpriced {
        /// Bucket the booking was priced in
        bucket: SizeBucket,

        /// Services without a price
        services: Vec<ServiceId>,
    },

    /// Pricing failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Persisting the booking failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Booking form payload, as posted by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    /// Agent's full name
    pub agent_name: String,

    /// Agent's email address
    pub agent_email: String,

    /// Agent's phone number
    #[serde(default)]
    pub agent_phone: Option<String>,

    /// Agent's brokerage
    #[serde(default)]
    pub agent_company: Option<String>,

    /// Property street address
    pub property_address: String,

    /// Property size in square feet
    pub square_feet: u32,

    /// Requested shoot date, as entered
    #[serde(default)]
    pub preferred_date: Option<String>,

    /// Selected services
    #[serde(default)]
    pub services: Vec<SelectionLine>,

    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Total shown to the customer by the client, in dollars
    #[serde(default)]
    pub client_total: Option<Decimal>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    /// Contact and property details
    pub details: BookingDetails,

    /// Bucket resolved from the property size
    pub bucket: SizeBucket,

    /// Deduplicated selection
    pub selection: Selection,

    /// Client-side total, if one was sent
    pub client_total: Option<Decimal>,
}

impl BookingSubmission {
    /// Parse a submission from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Json`] if the body is not a booking submission.
    pub fn from_json(body: &str) -> Result<Self, BookingError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Check required fields, resolve the size bucket, and build the selection.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<ValidatedBooking, ValidationError> {
        if self.agent_name.trim().is_empty() {
            return Err(ValidationError::BlankField("agent name"));
        }

        if self.property_address.trim().is_empty() {
            return Err(ValidationError::BlankField("property address"));
        }

        let email = self.agent_email.trim();

        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ValidationError::InvalidEmail(email.to_string())),
        }

        if self.services.is_empty() {
            return Err(ValidationError::NoServices);
        }

        let bucket = SizeBucket::for_square_feet(self.square_feet)?;
        let selection = Selection::from_lines(self.services.iter().copied())?;

        Ok(ValidatedBooking {
            details: BookingDetails {
                agent_name: self.agent_name.trim().to_string(),
                agent_email: email.to_string(),
                agent_phone: self.agent_phone.clone(),
                agent_company: self.agent_company.clone(),
                property_address: self.property_address.trim().to_string(),
                square_feet: self.square_feet,
                preferred_date: self.preferred_date.clone(),
                notes: self.notes.clone(),
            },
            bucket,
            selection,
            client_total: self.client_total,
        })
    }
}

/// Identifier assigned to a stored booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BK-{:06}", self.0)
    }
}

/// A priced line as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedLine {
    /// Booked service
    pub service_id: ServiceId,

    /// Quantity booked
    pub quantity: u32,

    /// Line amount in dollars, unrounded
    pub amount: Decimal,
}

/// What gets persisted for a booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Contact and property details
    pub details: BookingDetails,

    /// Bucket the booking was priced in
    pub bucket: SizeBucket,

    /// Priced lines
    pub lines: Vec<BookedLine>,

    /// Pre-discount subtotal, in cents
    pub subtotal_minor: i64,

    /// Volume discount percentage points
    pub discount_percent: u32,

    /// Volume discount, in cents
    pub discount_minor: i64,

    /// Amount due, in cents
    pub total_minor: i64,
}

impl BookingRecord {
    fn new(details: BookingDetails, quote: &Quote<'_>) -> Self {
        Self {
            details,
            bucket: quote.bucket(),
            lines: quote
                .breakdown()
                .lines()
                .iter()
                .map(|line| BookedLine {
                    service_id: line.service_id(),
                    quantity: line.quantity(),
                    amount: line.amount(),
                })
                .collect(),
            subtotal_minor: quote.subtotal().to_minor_units(),
            discount_percent: quote.discount().percent_points(),
            discount_minor: quote.discount().discount().to_minor_units(),
            total_minor: quote.total().to_minor_units(),
        }
    }
}

/// Persistence for accepted bookings.
pub trait BookingStore {
    /// Persist a booking and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the record could not be stored.
    fn save(&mut self, record: BookingRecord) -> Result<BookingId, StoreError>;
}

/// Delivery of confirmation emails.
pub trait Notifier {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] if the message was not accepted for delivery.
    fn send(&mut self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    /// Identifier assigned by the store
    pub id: BookingId,

    /// Server-computed amount due
    pub total: Money<'static, Currency>,

    /// Confirmation that was composed
    pub email: EmailMessage,

    /// Whether the confirmation was accepted for delivery
    pub notified: bool,
}

/// Handles booking submissions against a price table, store and notifier.
#[derive(Debug)]
pub struct BookingHandler<'a, S, N> {
    engine: PricingEngine<'a>,
    store: S,
    notifier: N,
}

impl<'a, S: BookingStore, N: Notifier> BookingHandler<'a, S, N> {
    /// Create a handler.
    pub fn new(engine: PricingEngine<'a>, store: S, notifier: N) -> Self {
        Self {
            engine,
            store,
            notifier,
        }
    }

    /// The booking store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The notifier
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Validate, price, persist and confirm a booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Invalid`]: the submission failed validation.
    /// - [`BookingError::Unpriced`]: a selected service has no price for the property size.
    /// - [`BookingError::Pricing`]: pricing failed.
    /// - [`BookingError::Store`]: the booking could not be persisted.
    ///
    /// Notification failures are not errors; see [`BookingReceipt::notified`].
    pub fn submit(&mut self, submission: &BookingSubmission) -> Result<BookingReceipt, BookingError> {
        let booking = submission.validate()?;
        let quote = self.engine.quote(booking.bucket, &booking.selection)?;

        if !quote.is_complete() {
            let services: Vec<ServiceId> = quote
                .unpriced()
                .iter()
                .map(|line| line.service_id)
                .collect();

            warn!(bucket = %booking.bucket, ?services, "rejecting booking with unpriced services");

            return Err(BookingError::Unpriced {
                bucket: booking.bucket,
                services,
            });
        }

        if let Some(client_total) = booking.client_total {
            let client_minor = client_total
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|cents| cents.to_i64());

            if client_minor != Some(quote.total().to_minor_units()) {
                warn!(
                    client_total = %client_total,
                    server_total = %quote.total(),
                    "client total differs from server quote; using server total"
                );
            }
        }

        let record = BookingRecord::new(booking.details.clone(), &quote);
        let id = self.store.save(record)?;

        info!(booking = %id, bucket = %booking.bucket, total = %quote.total(), "booking stored");

        let email = ConfirmationEmail::compose(&booking.details, &quote);

        let notified = match self.notifier.send(&email) {
            Ok(()) => true,
            Err(err) => {
                warn!(booking = %id, error = %err, "confirmation email not sent");

                false
            }
        };

        Ok(BookingReceipt {
            id,
            total: quote.total(),
            email,
            notified,
        })
    }
}

/// Booking store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    records: FxHashMap<BookingId, BookingRecord>,
    last_id: u64,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored booking.
    pub fn get(&self, id: BookingId) -> Option<&BookingRecord> {
        self.records.get(&id)
    }

    /// Get the number of stored bookings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no bookings are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn save(&mut self, record: BookingRecord) -> Result<BookingId, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("booking ids exhausted".to_string()))?;

        let id = BookingId(next);

        self.last_id = next;
        self.records.insert(id, record);

        Ok(id)
    }
}

/// Notifier that keeps every message instead of sending it.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    sent: Vec<EmailMessage>,
}

impl OutboxNotifier {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "sent" so far, oldest first.
    pub fn sent(&self) -> &[EmailMessage] {
        &self.sent
    }
}

impl Notifier for OutboxNotifier {
    fn send(&mut self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent.push(message.clone());

        Ok(())
    }
}
