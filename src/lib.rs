//! Aperture
//!
//! Aperture prices real estate photography: it reads the published price
//! table, quotes a selection of services for a property size, applies volume
//! discounts, recommends bundled packages, and handles booking submissions.

pub mod api;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod discounts;
pub mod logging;
pub mod notification;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod quote;
pub mod selection;
pub mod services;
pub mod sizes;
pub mod table;
