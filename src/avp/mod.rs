/*
 * AVP format:
 *   0                   1                   2                   3
 *   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                           AVP Code                             |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |V M P r r r r r|                 AVP Length                     |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                        Vendor-ID (optional)                   |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                             Data ...
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *
 * AVP Flags:
 *   0 1 2 3 4 5 6 7
 *  +-+-+-+-+-+-+-+-+  V(endor), M(andatory), P(rivate)
 *  |V M P r r r r r|  r(eserved)
 *  +-+-+-+-+-+-+-+-+
 *
 */

pub mod address;
pub mod enumerated;
pub mod flags;
pub mod float32;
pub mod float64;
pub mod group;
pub mod identity;
pub mod integer32;
pub mod integer64;
pub mod ipv4;
pub mod ipv6;
pub mod octetstring;
pub mod time;
pub mod unsigned32;
pub mod unsigned64;
pub mod uri;
pub mod utf8string;

use crate::dictionary;
use crate::error::{Error, Result};
use core::fmt;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

pub use self::address::Address;
pub use self::enumerated::Enumerated;
pub use self::float32::Float32;
pub use self::float64::Float64;
pub use self::group::Grouped;
pub use self::identity::Identity;
pub use self::integer32::Integer32;
pub use self::integer64::Integer64;
pub use self::ipv4::IPv4;
pub use self::ipv6::IPv6;
pub use self::octetstring::OctetString;
pub use self::time::Time;
pub use self::unsigned32::Unsigned32;
pub use self::unsigned64::Unsigned64;
pub use self::uri::DiameterURI;
pub use self::utf8string::UTF8String;

#[derive(Debug, Clone)]
pub struct Avp {
    header: AvpHeader,
    value: AvpValue,
    padding: u8,
}

#[derive(Debug, Clone)]
pub struct AvpHeader {
    code: u32,
    flags: AvpFlags,
    length: u32,
    vendor_id: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct AvpFlags {
    pub vendor: bool,
    pub mandatory: bool,
    pub private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvpType {
    Unknown,
    Address,
    AddressIPv4,
    AddressIPv6,
    Identity,
    DiameterURI,
    Enumerated,
    Float32,
    Float64,
    Grouped,
    Integer32,
    Integer64,
    OctetString,
    Time,
    Unsigned32,
    Unsigned64,
    UTF8String,
}

#[derive(Debug, Clone)]
pub enum AvpValue {
    Address(Address),
    AddressIPv4(IPv4),
    AddressIPv6(IPv6),
    Identity(Identity),
    DiameterURI(DiameterURI),
    Enumerated(Enumerated),
    Float32(Float32),
    Float64(Float64),
    Grouped(Grouped),
    Integer32(Integer32),
    Integer64(Integer64),
    OctetString(OctetString),
    Time(Time),
    Unsigned32(Unsigned32),
    Unsigned64(Unsigned64),
    UTF8String(UTF8String),
}

impl fmt::Display for AvpValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AvpValue::Address(avp) => avp.fmt(f),
            AvpValue::AddressIPv4(avp) => avp.fmt(f),
            AvpValue::AddressIPv6(avp) => avp.fmt(f),
            AvpValue::Float32(avp) => avp.fmt(f),
            AvpValue::Float64(avp) => avp.fmt(f),
            AvpValue::Enumerated(avp) => avp.fmt(f),
            AvpValue::Grouped(avp) => avp.fmt(f),
            AvpValue::Integer32(avp) => avp.fmt(f),
            AvpValue::Integer64(avp) => avp.fmt(f),
            AvpValue::Unsigned32(avp) => avp.fmt(f),
            AvpValue::Unsigned64(avp) => avp.fmt(f),
            AvpValue::UTF8String(avp) => avp.fmt(f),
            AvpValue::OctetString(avp) => avp.fmt(f),
            AvpValue::Identity(avp) => avp.fmt(f),
            AvpValue::DiameterURI(avp) => avp.fmt(f),
            AvpValue::Time(avp) => avp.fmt(f),
        }
    }
}

impl AvpValue {
    pub fn length(&self) -> u32 {
        match self {
            AvpValue::Address(avp) => avp.length(),
            AvpValue::AddressIPv4(avp) => avp.length(),
            AvpValue::AddressIPv6(avp) => avp.length(),
            AvpValue::Float32(avp) => avp.length(),
            AvpValue::Float64(avp) => avp.length(),
            AvpValue::Enumerated(avp) => avp.length(),
            AvpValue::Grouped(avp) => avp.length(),
            AvpValue::Integer32(avp) => avp.length(),
            AvpValue::Integer64(avp) => avp.length(),
            AvpValue::Unsigned32(avp) => avp.length(),
            AvpValue::Unsigned64(avp) => avp.length(),
            AvpValue::UTF8String(avp) => avp.length(),
            AvpValue::OctetString(avp) => avp.length(),
            AvpValue::Identity(avp) => avp.length(),
            AvpValue::DiameterURI(avp) => avp.length(),
            AvpValue::Time(avp) => avp.length(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AvpValue::Address(_) => "Address",
            AvpValue::AddressIPv4(_) => "AddressIPv4",
            AvpValue::AddressIPv6(_) => "AddressIPv6",
            AvpValue::Float32(_) => "Float32",
            AvpValue::Float64(_) => "Float64",
            AvpValue::Enumerated(_) => "Enumerated",
            AvpValue::Grouped(_) => "Grouped",
            AvpValue::Integer32(_) => "Integer32",
            AvpValue::Integer64(_) => "Integer64",
            AvpValue::Unsigned32(_) => "Unsigned32",
            AvpValue::Unsigned64(_) => "Unsigned64",
            AvpValue::UTF8String(_) => "UTF8String",
            AvpValue::OctetString(_) => "OctetString",
            AvpValue::Identity(_) => "Identity",
            AvpValue::DiameterURI(_) => "DiameterURI",
            AvpValue::Time(_) => "Time",
        }
    }
}

impl From<Address> for AvpValue {
    fn from(v: Address) -> Self {
        AvpValue::Address(v)
    }
}
impl From<Identity> for AvpValue {
    fn from(v: Identity) -> Self {
        AvpValue::Identity(v)
    }
}
impl From<DiameterURI> for AvpValue {
    fn from(v: DiameterURI) -> Self {
        AvpValue::DiameterURI(v)
    }
}
impl From<Enumerated> for AvpValue {
    fn from(v: Enumerated) -> Self {
        AvpValue::Enumerated(v)
    }
}
impl From<Float32> for AvpValue {
    fn from(v: Float32) -> Self {
        AvpValue::Float32(v)
    }
}
impl From<Float64> for AvpValue {
    fn from(v: Float64) -> Self {
        AvpValue::Float64(v)
    }
}
impl From<Grouped> for AvpValue {
    fn from(v: Grouped) -> Self {
        AvpValue::Grouped(v)
    }
}
impl From<Integer32> for AvpValue {
    fn from(v: Integer32) -> Self {
        AvpValue::Integer32(v)
    }
}
impl From<Integer64> for AvpValue {
    fn from(v: Integer64) -> Self {
        AvpValue::Integer64(v)
    }
}
impl From<IPv4> for AvpValue {
    fn from(v: IPv4) -> Self {
        AvpValue::AddressIPv4(v)
    }
}
impl From<IPv6> for AvpValue {
    fn from(v: IPv6) -> Self {
        AvpValue::AddressIPv6(v)
    }
}
impl From<OctetString> for AvpValue {
    fn from(v: OctetString) -> Self {
        AvpValue::OctetString(v)
    }
}
impl From<Time> for AvpValue {
    fn from(v: Time) -> Self {
        AvpValue::Time(v)
    }
}
impl From<Unsigned32> for AvpValue {
    fn from(v: Unsigned32) -> Self {
        AvpValue::Unsigned32(v)
    }
}
impl From<Unsigned64> for AvpValue {
    fn from(v: Unsigned64) -> Self {
        AvpValue::Unsigned64(v)
    }
}
impl From<UTF8String> for AvpValue {
    fn from(v: UTF8String) -> Self {
        AvpValue::UTF8String(v)
    }
}

impl AvpHeader {
    pub fn decode_from<R: Read>(reader: &mut R) -> Result<AvpHeader> {
        let mut b = [0; 8];
        reader.read_exact(&mut b)?;

        let code = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);

        let flags = AvpFlags {
            vendor: (b[4] & flags::V) != 0,
            mandatory: (b[4] & flags::M) != 0,
            private: (b[4] & flags::P) != 0,
        };

        let length = u32::from_be_bytes([0, b[5], b[6], b[7]]);

        if flags.vendor {
            let mut b = [0; 4];
            reader.read_exact(&mut b)?;
            let vendor_id = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);

            Ok(AvpHeader {
                code,
                flags,
                length,
                vendor_id: Some(vendor_id),
            })
        } else {
            Ok(AvpHeader {
                code,
                flags,
                length,
                vendor_id: None,
            })
        }
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.code.to_be_bytes())?;

        let mut flag_byte: u8 = 0;
        if self.flags.vendor {
            flag_byte |= flags::V;
        }
        if self.flags.mandatory {
            flag_byte |= flags::M;
        }
        if self.flags.private {
            flag_byte |= flags::P;
        }
        writer.write_all(&[flag_byte])?;

        let length_bytes = &self.length.to_be_bytes()[1..4];
        writer.write_all(length_bytes)?;

        if let Some(vendor_id) = self.vendor_id {
            writer.write_all(&vendor_id.to_be_bytes())?;
        }

        Ok(())
    }
}

impl Avp {
    /// `flags` carries the M/P bits (see `avp::flags`); the V bit is derived
    /// from whether `vendor_id` is set.
    pub fn new(code: u32, vendor_id: Option<u32>, flags: u8, value: AvpValue) -> Avp {
        let header_length: u32 = if vendor_id.is_some() { 12 } else { 8 };
        let padding = Avp::pad_to_32_bits(value.length());
        let header = AvpHeader {
            code,
            flags: AvpFlags {
                vendor: vendor_id.is_some(),
                mandatory: flags & self::flags::M != 0,
                private: flags & self::flags::P != 0,
            },
            length: header_length + value.length(),
            vendor_id,
        };
        Avp {
            header,
            value,
            padding,
        }
    }

    pub fn code(&self) -> u32 {
        self.header.code
    }

    pub fn flags(&self) -> &AvpFlags {
        &self.header.flags
    }

    pub fn vendor_id(&self) -> Option<u32> {
        self.header.vendor_id
    }

    pub fn length(&self) -> u32 {
        self.header.length
    }

    pub fn padding(&self) -> u8 {
        self.padding
    }

    pub fn value(&self) -> &AvpValue {
        &self.value
    }

    pub fn decode_from<R: Read + Seek>(reader: &mut R) -> Result<Avp> {
        let header = AvpHeader::decode_from(reader)?;

        let header_length: u32 = if header.flags.vendor { 12 } else { 8 };
        if header.length < header_length {
            return Err(Error::MalformedHeader("AVP length shorter than header".into()));
        }
        let value_length = header.length - header_length;

        let remaining = {
            let current = reader.stream_position()?;
            let end = reader.seek(SeekFrom::End(0))?;
            reader.seek(SeekFrom::Start(current))?;
            end - current
        };
        if (value_length as u64) > remaining {
            return Err(Error::TruncatedAvp);
        }

        let avp_type = dictionary::DEFAULT_DICT.avp_type(header.vendor_id, header.code);

        let value = match avp_type {
            AvpType::Address => AvpValue::Address(Address::decode_from(reader, value_length as usize)?),
            AvpType::AddressIPv4 => AvpValue::AddressIPv4(IPv4::decode_from(reader)?),
            AvpType::AddressIPv6 => AvpValue::AddressIPv6(IPv6::decode_from(reader)?),
            AvpType::Float32 => AvpValue::Float32(Float32::decode_from(reader)?),
            AvpType::Float64 => AvpValue::Float64(Float64::decode_from(reader)?),
            AvpType::Enumerated => AvpValue::Enumerated(Enumerated::decode_from(reader)?),
            AvpType::Grouped => {
                AvpValue::Grouped(Grouped::decode_from(reader, value_length as usize)?)
            }
            AvpType::Integer32 => AvpValue::Integer32(Integer32::decode_from(reader)?),
            AvpType::Integer64 => AvpValue::Integer64(Integer64::decode_from(reader)?),
            AvpType::Unsigned32 => AvpValue::Unsigned32(Unsigned32::decode_from(reader)?),
            AvpType::Unsigned64 => AvpValue::Unsigned64(Unsigned64::decode_from(reader)?),
            AvpType::UTF8String => {
                AvpValue::UTF8String(UTF8String::decode_from(reader, value_length as usize)?)
            }
            AvpType::OctetString => {
                AvpValue::OctetString(OctetString::decode_from(reader, value_length as usize)?)
            }
            AvpType::Identity => {
                AvpValue::Identity(Identity::decode_from(reader, value_length as usize)?)
            }
            AvpType::DiameterURI => {
                AvpValue::DiameterURI(DiameterURI::decode_from(reader, value_length as usize)?)
            }
            AvpType::Time => AvpValue::Time(Time::decode_from(reader)?),
            // Unknown AVPs with the M-bit set must fail the whole message
            // (RFC 6733 section 7.1.1, DIAMETER_AVP_UNSUPPORTED); without
            // it they round-trip as opaque bytes.
            AvpType::Unknown => {
                if header.flags.mandatory {
                    return Err(Error::UnknownMandatoryAvp(header.code));
                }
                AvpValue::OctetString(OctetString::decode_from(reader, value_length as usize)?)
            }
        };

        let padding = Avp::pad_to_32_bits(value_length);
        if padding > 0 {
            reader.seek(SeekFrom::Current(padding as i64))?;
        }

        Ok(Avp {
            header,
            value,
            padding,
        })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.encode_to(writer)?;

        match &self.value {
            AvpValue::Address(avp) => avp.encode_to(writer)?,
            AvpValue::AddressIPv4(avp) => avp.encode_to(writer)?,
            AvpValue::AddressIPv6(avp) => avp.encode_to(writer)?,
            AvpValue::Float32(avp) => avp.encode_to(writer)?,
            AvpValue::Float64(avp) => avp.encode_to(writer)?,
            AvpValue::Enumerated(avp) => avp.encode_to(writer)?,
            AvpValue::Grouped(avp) => avp.encode_to(writer)?,
            AvpValue::Integer32(avp) => avp.encode_to(writer)?,
            AvpValue::Integer64(avp) => avp.encode_to(writer)?,
            AvpValue::Unsigned32(avp) => avp.encode_to(writer)?,
            AvpValue::Unsigned64(avp) => avp.encode_to(writer)?,
            AvpValue::UTF8String(avp) => avp.encode_to(writer)?,
            AvpValue::OctetString(avp) => avp.encode_to(writer)?,
            AvpValue::Identity(avp) => avp.encode_to(writer)?,
            AvpValue::DiameterURI(avp) => avp.encode_to(writer)?,
            AvpValue::Time(avp) => avp.encode_to(writer)?,
        };

        for _ in 0..self.padding {
            writer.write_all(&[0])?;
        }

        Ok(())
    }

    fn pad_to_32_bits(length: u32) -> u8 {
        ((4 - (length & 0b11)) % 4) as u8
    }

    pub fn as_integer32(&self) -> Option<i32> {
        match &self.value {
            AvpValue::Integer32(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_unsigned32(&self) -> Option<u32> {
        match &self.value {
            AvpValue::Unsigned32(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_enumerated(&self) -> Option<i32> {
        match &self.value {
            AvpValue::Enumerated(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_utf8string(&self) -> Option<&str> {
        match &self.value {
            AvpValue::UTF8String(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_identity(&self) -> Option<&Identity> {
        match &self.value {
            AvpValue::Identity(avp) => Some(avp),
            _ => None,
        }
    }

    pub fn as_unsigned64(&self) -> Option<u64> {
        match &self.value {
            AvpValue::Unsigned64(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match &self.value {
            AvpValue::Address(avp) => Some(avp),
            _ => None,
        }
    }

    pub fn as_octetstring(&self) -> Option<&[u8]> {
        match &self.value {
            AvpValue::OctetString(avp) => Some(avp.value()),
            _ => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&Grouped> {
        match &self.value {
            AvpValue::Grouped(avp) => Some(avp),
            _ => None,
        }
    }
}

/// Builds an `Avp`. `avp!(code, vendor_id, value)` defaults flags to 0;
/// `avp!(code, vendor_id, flags, value)` sets the M/P bits explicitly.
#[macro_export]
macro_rules! avp {
    ($code:expr, $vendor_id:expr, $value:expr) => {
        $crate::avp::Avp::new($code, $vendor_id, 0, $value.into())
    };
    ($code:expr, $vendor_id:expr, $flags:expr, $value:expr) => {
        $crate::avp::Avp::new($code, $vendor_id, $flags, $value.into())
    };
}
