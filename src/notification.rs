//! Booking Confirmation Emails
//!
//! The plain-text confirmation sent to an agent after a booking. Customers
//! read these directly, so the layout below is fixed: section order, labels,
//! the `•` bullet, and which optional lines appear.
//!
//! ```text
//! Hi <agent name>,
//!
//! Thank you for booking with us! Here are the details of your shoot.
//!
//! PROPERTY DETAILS
//! • Address: <address>
//! • Size: <sqft> sq ft (<bucket>)
//! • Preferred Date: <date>
//!
//! SERVICES BOOKED
//! • <service> x<qty>: $<amount>
//! • <service> x<qty>: price to be confirmed
//! • Subtotal: $<subtotal>
//! • Volume Discount (<n>%): -$<discount>
//! • Total: $<total>
//!
//! PACKAGE SAVINGS
//! • <package>: $<price> (a la carte value $<value>, save $<savings>)
//!
//! AGENT INFORMATION
//! • Name: <name>
//! • Email: <email>
//! • Phone: <phone>
//! • Company: <company>
//!
//! NOTES
//! <notes>
//!
//! We'll be in touch within 24 hours to confirm your appointment.
//! ```

use std::fmt;

use serde::Serialize;

use crate::quote::{Quote, dollars, money_dollars};

const BULLET: &str = "\u{2022} ";

/// Who booked, and for which property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    /// Agent's full name
    pub agent_name: String,

    /// Agent's email address; confirmations are sent here
    pub agent_email: String,

    /// Agent's phone number
    pub agent_phone: Option<String>,

    /// Agent's brokerage
    pub agent_company: Option<String>,

    /// Property street address
    pub property_address: String,

    /// Property size in square feet
    pub square_feet: u32,

    /// Requested shoot date, as entered
    pub preferred_date: Option<String>,

    /// Free-form notes from the agent
    pub notes: Option<String>,
}

/// A composed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body, `\n` line endings
    pub body: String,
}

impl fmt::Display for EmailMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "To: {}\nSubject: {}\n\n{}", self.to, self.subject, self.body)
    }
}

/// Composer for booking confirmation emails.
#[derive(Debug)]
pub struct ConfirmationEmail;

impl ConfirmationEmail {
    /// Compose the confirmation for `details` priced as `quote`.
    ///
    /// The package savings section only appears when every line was priced and
    /// the bucket has packages.
    pub fn compose(details: &BookingDetails, quote: &Quote<'_>) -> EmailMessage {
        let mut lines: Vec<String> = vec![
            format!("Hi {},", details.agent_name.trim()),
            String::new(),
            "Thank you for booking with us! Here are the details of your shoot.".to_string(),
            String::new(),
            "PROPERTY DETAILS".to_string(),
            bullet("Address", details.property_address.trim()),
            bullet(
                "Size",
                &format!("{} sq ft ({})", details.square_feet, quote.bucket()),
            ),
        ];

        if let Some(date) = present(details.preferred_date.as_deref()) {
            lines.push(bullet("Preferred Date", date));
        }

        lines.push(String::new());
        lines.push("SERVICES BOOKED".to_string());

        for line in quote.breakdown().lines() {
            lines.push(bullet(
                &format!("{} x{}", line.service_id().display_name(), line.quantity()),
                &dollars(line.amount()),
            ));
        }

        for line in quote.unpriced() {
            lines.push(bullet(
                &format!("{} x{}", line.service_id.display_name(), line.quantity),
                "price to be confirmed",
            ));
        }

        lines.push(bullet("Subtotal", &money_dollars(quote.subtotal())));

        let discount = quote.discount();

        if discount.is_discounted() {
            lines.push(bullet(
                &format!("Volume Discount ({}%)", discount.percent_points()),
                &format!("-{}", money_dollars(discount.discount())),
            ));
        }

        lines.push(bullet("Total", &money_dollars(quote.total())));

        if quote.package_section_allowed() {
            lines.push(String::new());
            lines.push("PACKAGE SAVINGS".to_string());

            for package in quote.packages() {
                let offer = package.offer();

                lines.push(bullet(
                    offer.name(),
                    &format!(
                        "{} (a la carte value {}, save {})",
                        money_dollars(offer.price()),
                        money_dollars(offer.value()),
                        money_dollars(package.savings()),
                    ),
                ));
            }
        }

        lines.push(String::new());
        lines.push("AGENT INFORMATION".to_string());
        lines.push(bullet("Name", details.agent_name.trim()));
        lines.push(bullet("Email", details.agent_email.trim()));

        if let Some(phone) = present(details.agent_phone.as_deref()) {
            lines.push(bullet("Phone", phone));
        }

        if let Some(company) = present(details.agent_company.as_deref()) {
            lines.push(bullet("Company", company));
        }

        if let Some(notes) = present(details.notes.as_deref()) {
            lines.push(String::new());
            lines.push("NOTES".to_string());
            lines.push(notes.to_string());
        }

        lines.push(String::new());
        lines.push("We'll be in touch within 24 hours to confirm your appointment.".to_string());

        let mut body = lines.join("\n");
        body.push('\n');

        EmailMessage {
            to: details.agent_email.trim().to_string(),
            subject: format!(
                "Booking Confirmation - {}",
                details.property_address.trim()
            ),
            body,
        }
    }
}

fn bullet(label: &str, value: &str) -> String {
    format!("{BULLET}{label}: {value}")
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
