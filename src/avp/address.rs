use crate::error::{Error, Result};
use std::fmt;
use std::io::Read;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

const FAMILY_IPV4: u16 = 1;
const FAMILY_IPV6: u16 = 2;
const FAMILY_E164: u16 = 8;

/// Address AVP: a 2-byte address-family tag (IANA Address Family Numbers)
/// followed by the address itself. Diameter nodes only ever emit IPv4,
/// IPv6 or E.164 (telephone number, as text), so those are the only
/// families decoded; anything else round-trips as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    IPv4(Ipv4Addr),
    IPv6(Ipv6Addr),
    E164(String),
    Other(u16, Vec<u8>),
}

impl Address {
    pub fn decode_from<R: Read>(reader: &mut R, len: usize) -> Result<Address> {
        if len < 2 {
            return Err(Error::DecodeError("truncated Address AVP".into()));
        }
        let mut family_bytes = [0u8; 2];
        reader.read_exact(&mut family_bytes)?;
        let family = u16::from_be_bytes(family_bytes);

        let mut data = vec![0u8; len - 2];
        reader.read_exact(&mut data)?;

        match family {
            FAMILY_IPV4 => {
                if data.len() != 4 {
                    return Err(Error::DecodeError("invalid IPv4 address length".into()));
                }
                Ok(Address::IPv4(Ipv4Addr::new(data[0], data[1], data[2], data[3])))
            }
            FAMILY_IPV6 => {
                if data.len() != 16 {
                    return Err(Error::DecodeError("invalid IPv6 address length".into()));
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&data);
                Ok(Address::IPv6(Ipv6Addr::from(octets)))
            }
            FAMILY_E164 => {
                let s = String::from_utf8(data)
                    .map_err(|e| Error::DecodeError(format!("invalid E.164 address: {}", e)))?;
                Ok(Address::E164(s))
            }
            other => Ok(Address::Other(other, data)),
        }
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Address::IPv4(ip) => {
                writer.write_all(&FAMILY_IPV4.to_be_bytes())?;
                writer.write_all(&ip.octets())?;
            }
            Address::IPv6(ip) => {
                writer.write_all(&FAMILY_IPV6.to_be_bytes())?;
                writer.write_all(&ip.octets())?;
            }
            Address::E164(s) => {
                writer.write_all(&FAMILY_E164.to_be_bytes())?;
                writer.write_all(s.as_bytes())?;
            }
            Address::Other(family, data) => {
                writer.write_all(&family.to_be_bytes())?;
                writer.write_all(data)?;
            }
        }
        Ok(())
    }

    pub fn length(&self) -> u32 {
        2 + match self {
            Address::IPv4(_) => 4,
            Address::IPv6(_) => 16,
            Address::E164(s) => s.as_bytes().len() as u32,
            Address::Other(_, data) => data.len() as u32,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::IPv4(ip) => write!(f, "{}", ip),
            Address::IPv6(ip) => write!(f, "{}", ip),
            Address::E164(s) => write!(f, "{}", s),
            Address::Other(family, data) => {
                write!(f, "family={} ", family)?;
                for (index, &byte) in data.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_decode_ipv4() {
        let addr = Address::IPv4(Ipv4Addr::new(10, 0, 0, 1));
        let mut encoded = Vec::new();
        addr.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let decoded = Address::decode_from(&mut cursor, encoded.len()).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_encode_decode_ipv6() {
        let addr = Address::IPv6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let mut encoded = Vec::new();
        addr.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let decoded = Address::decode_from(&mut cursor, encoded.len()).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_encode_decode_e164() {
        let addr = Address::E164("14155550123".to_string());
        let mut encoded = Vec::new();
        addr.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let decoded = Address::decode_from(&mut cursor, encoded.len()).unwrap();
        assert_eq!(decoded, addr);
    }
}
