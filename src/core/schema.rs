//! The fixed normalized booking schema
//!
//! Every locator in a mapping points at one of these target fields. The
//! field's [`FieldKind`] decides how extracted raw values are coerced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a target field's raw value is coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Monetary amount, floating point
    Money,
    /// Whole-number count
    Count,
    /// Calendar date, rendered `YYYY-MM-DD`
    Date,
    /// Trimmed free text
    Text,
}

impl FieldKind {
    /// Kind for an arbitrary field name; unknown names are text
    pub fn of(name: &str) -> Self {
        name.parse::<TargetField>()
            .map(|f| f.kind())
            .unwrap_or(FieldKind::Text)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Money => write!(f, "money"),
            FieldKind::Count => write!(f, "count"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Text => write!(f, "text"),
        }
    }
}

/// Target fields of the normalized booking record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    // Identity
    ReservationCode,
    GuestName,
    GuestEmail,
    ListingName,
    Platform,
    // Stay
    CheckInDate,
    CheckOutDate,
    NumNights,
    // Financial
    NightlyRate,
    AccommodationFee,
    CleaningFee,
    LodgingTax,
    SalesTax,
    AirbnbSalesTax,
    Gst,
    Qst,
    ChannelFee,
    PaymentFees,
    StripeFee,
    TotalAmount,
    TotalPrice,
    MgmtFee,
    NetEarnings,
    ExtraGuestFees,
    BedLinenFee,
}

impl TargetField {
    /// Field name as used in mappings and output records
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::ReservationCode => "reservationCode",
            TargetField::GuestName => "guestName",
            TargetField::GuestEmail => "guestEmail",
            TargetField::ListingName => "listingName",
            TargetField::Platform => "platform",
            TargetField::CheckInDate => "checkInDate",
            TargetField::CheckOutDate => "checkOutDate",
            TargetField::NumNights => "numNights",
            TargetField::NightlyRate => "nightlyRate",
            TargetField::AccommodationFee => "accommodationFee",
            TargetField::CleaningFee => "cleaningFee",
            TargetField::LodgingTax => "lodgingTax",
            TargetField::SalesTax => "salesTax",
            TargetField::AirbnbSalesTax => "airbnbSalesTax",
            TargetField::Gst => "gst",
            TargetField::Qst => "qst",
            TargetField::ChannelFee => "channelFee",
            TargetField::PaymentFees => "paymentFees",
            TargetField::StripeFee => "stripeFee",
            TargetField::TotalAmount => "totalAmount",
            TargetField::TotalPrice => "totalPrice",
            TargetField::MgmtFee => "mgmtFee",
            TargetField::NetEarnings => "netEarnings",
            TargetField::ExtraGuestFees => "extraGuestFees",
            TargetField::BedLinenFee => "bedLinenFee",
        }
    }

    /// All target fields in schema order
    pub fn all() -> &'static [TargetField] {
        &[
            TargetField::ReservationCode,
            TargetField::GuestName,
            TargetField::GuestEmail,
            TargetField::ListingName,
            TargetField::Platform,
            TargetField::CheckInDate,
            TargetField::CheckOutDate,
            TargetField::NumNights,
            TargetField::NightlyRate,
            TargetField::AccommodationFee,
            TargetField::CleaningFee,
            TargetField::LodgingTax,
            TargetField::SalesTax,
            TargetField::AirbnbSalesTax,
            TargetField::Gst,
            TargetField::Qst,
            TargetField::ChannelFee,
            TargetField::PaymentFees,
            TargetField::StripeFee,
            TargetField::TotalAmount,
            TargetField::TotalPrice,
            TargetField::MgmtFee,
            TargetField::NetEarnings,
            TargetField::ExtraGuestFees,
            TargetField::BedLinenFee,
        ]
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            TargetField::ReservationCode
            | TargetField::GuestName
            | TargetField::GuestEmail
            | TargetField::ListingName
            | TargetField::Platform => FieldKind::Text,
            TargetField::CheckInDate | TargetField::CheckOutDate => FieldKind::Date,
            TargetField::NumNights => FieldKind::Count,
            _ => FieldKind::Money,
        }
    }

    pub fn is_financial(&self) -> bool {
        self.kind() == FieldKind::Money
    }

    /// Whether a complete mapping must provide this field
    pub fn required(&self) -> bool {
        matches!(
            self,
            TargetField::ReservationCode
                | TargetField::GuestName
                | TargetField::CheckInDate
                | TargetField::CheckOutDate
        )
    }

    /// Names of the required fields in schema order
    pub fn required_names() -> Vec<String> {
        Self::all()
            .iter()
            .filter(|f| f.required())
            .map(|f| f.as_str().to_string())
            .collect()
    }

    /// Source-name patterns used to suggest a column for this field
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            TargetField::ReservationCode => &[
                "confirmation code",
                "reservation code",
                "reservation id",
                "booking id",
                "booking reference",
                "confirmation",
            ],
            TargetField::GuestName => &["guest name", "guest full name", "full name"],
            TargetField::GuestEmail => &["guest email", "email"],
            TargetField::ListingName => &["listing name", "listing", "property name", "property"],
            TargetField::Platform => &["platform", "channel name", "booking source"],
            TargetField::CheckInDate => &["check in", "checkin", "arrival", "start date"],
            TargetField::CheckOutDate => &["check out", "checkout", "departure", "end date"],
            TargetField::NumNights => &["nights", "number of nights", "length of stay"],
            TargetField::NightlyRate => &["nightly rate", "rate per night", "base rate"],
            TargetField::AccommodationFee => &["accommodation fee", "accommodation"],
            TargetField::CleaningFee => &["cleaning fee", "cleaning"],
            TargetField::LodgingTax => &["lodging tax", "occupancy tax"],
            TargetField::AirbnbSalesTax => &["airbnb sales tax", "airbnb remitted tax"],
            TargetField::SalesTax => &["sales tax"],
            TargetField::Gst => &["gst", "goods and services tax"],
            TargetField::Qst => &["qst", "quebec sales tax"],
            TargetField::ChannelFee => &["channel fee", "host fee", "service fee", "commission"],
            TargetField::PaymentFees => &["payment fee", "processing fee"],
            TargetField::StripeFee => &["stripe fee", "stripe"],
            TargetField::TotalAmount => &["total amount", "total payout", "gross amount"],
            TargetField::TotalPrice => &["total price", "booking total"],
            TargetField::MgmtFee => &["management fee", "mgmt fee"],
            TargetField::NetEarnings => &["net earnings", "earnings", "net payout"],
            TargetField::ExtraGuestFees => &["extra guest fee", "additional guest fee"],
            TargetField::BedLinenFee => &["bed linen fee", "linen fee", "linen"],
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("unknown target field: '{0}'")]
pub struct UnknownFieldError(pub String);

/// One suggestion rule: a target field and the source-name patterns that
/// select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub field: String,
    pub patterns: Vec<String>,
}

impl MappingRule {
    pub fn new(field: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            field: field.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Built-in suggestion rules, one per target field in schema order
///
/// `airbnbSalesTax` precedes `salesTax` so the more specific rule is
/// offered a column first.
pub fn default_rules() -> Vec<MappingRule> {
    let mut fields: Vec<TargetField> = TargetField::all().to_vec();
    if let (Some(a), Some(b)) = (
        fields.iter().position(|f| *f == TargetField::SalesTax),
        fields.iter().position(|f| *f == TargetField::AirbnbSalesTax),
    ) {
        fields.swap(a, b);
    }

    fields
        .into_iter()
        .map(|f| MappingRule::new(f.as_str(), f.patterns()))
        .collect()
}
