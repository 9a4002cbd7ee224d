//! Aperture prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    api::PricingData,
    booking::{
        BookingError, BookingHandler, BookingId, BookingReceipt, BookingRecord, BookingStore,
        BookingSubmission, InMemoryBookingStore, Notifier, NotifyError, OutboxNotifier,
        StoreError, ValidationError,
    },
    catalog::{CatalogError, PackageCatalog, PackageOffer},
    discounts::{DiscountError, DiscountTier, VolumeDiscount, apply_volume_discount},
    notification::{BookingDetails, ConfirmationEmail, EmailMessage},
    prices::PriceEntry,
    pricing::{
        PackageRecommendation, PricedLine, PricingEngine, PricingError, SubtotalBreakdown,
        UnpricedLine,
    },
    quote::{Quote, QuoteError},
    selection::{Selection, SelectionError, SelectionLine},
    services::ServiceId,
    sizes::{SizeBucket, SizeError},
    table::{PriceTable, PriceTableParser, SourceFormat, TableError},
};
