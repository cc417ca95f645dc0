//! Contract address validation.

/// Addresses the language model tends to invent when the user gave none.
pub const PLACEHOLDER_ADDRESSES: [&str; 2] = [
    "0x1234567890123456789012345678901234567890",
    "0x0000000000000000000000000000000000000000",
];

/// The address as a usable analysis target, or `None`.
///
/// A target is `0x` followed by exactly 40 hex digits and is not one of the
/// [`PLACEHOLDER_ADDRESSES`]. Surrounding whitespace is ignored.
pub fn validate_address(address: Option<&str>) -> Option<&str> {
    let address = address?.trim();
    if address.len() != 42 || !address.starts_with("0x") {
        return None;
    }
    if !address[2..].bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if PLACEHOLDER_ADDRESSES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(address))
    {
        return None;
    }
    Some(address)
}
