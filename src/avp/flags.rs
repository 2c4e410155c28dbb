//! AVP flag bit masks (V/M/P, see RFC 6733 section 4.1).

/// Vendor-Specific bit. Set automatically by `Avp::new` when a vendor id is given.
pub const V: u8 = 0x80;
/// Mandatory bit.
pub const M: u8 = 0x40;
/// Protected (may-encrypt) bit.
pub const P: u8 = 0x20;
