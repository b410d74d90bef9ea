//! Address types.
//!
//! - [`Address`]: A store's postal address as entered by its owner
//! - [`QueryKey`]: The canonical search string derived from an address

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{QUERY_KEY_COUNTRY, QUERY_KEY_SEPARATOR};

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A postal address to be placed on the store map.
///
/// No validation happens here: whatever the owner typed is sent to the
/// provider as-is, and a useless address simply ends up at the fallback
/// location.
///
/// # Example
/// ```
/// use locator_core::Address;
///
/// let addr = Address::new("1 Main St", "Springfield", "IL", "62701");
/// assert_eq!(addr.query_key().as_str(), "1 Main St, Springfield, IL, 62701, USA");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line, including the house number
    pub street: String,
    /// City or town
    pub city: String,
    /// State or region code
    pub state: String,
    /// Postal code
    #[serde(alias = "postalCode", alias = "postal_code")]
    pub zip: String,
    /// Whether the owner lets the street line be shown publicly
    #[serde(default, alias = "show_address")]
    pub show_address: bool,
}

impl Address {
    /// Creates an address with the street line hidden from the public.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
            show_address: false,
        }
    }

    /// Sets the public visibility flag.
    pub fn with_visibility(mut self, show_address: bool) -> Self {
        self.show_address = show_address;
        self
    }

    /// Renders the canonical query key for this address.
    pub fn query_key(&self) -> QueryKey {
        QueryKey::from_parts(&self.street, &self.city, &self.state, &self.zip)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUERY KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical search string for an address.
///
/// Format: `street, city, state, zip, USA`, each field trimmed. Two addresses
/// that render to the same key share one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    /// Builds a key from the four address fields.
    pub fn from_parts(street: &str, city: &str, state: &str, zip: &str) -> Self {
        let fields = [street.trim(), city.trim(), state.trim(), zip.trim(), QUERY_KEY_COUNTRY];
        Self(fields.join(QUERY_KEY_SEPARATOR))
    }

    /// Wraps an already-rendered query string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&Address> for QueryKey {
    fn from(address: &Address) -> Self {
        address.query_key()
    }
}
