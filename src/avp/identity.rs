use crate::avp::OctetString;
use crate::error::Result;
use std::fmt;
use std::io::Read;
use std::io::Write;

/// DiameterIdentity AVP: a fully-qualified host or realm name, carried as
/// an OctetString restricted to ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(OctetString);

impl Identity {
    pub fn new(value: Vec<u8>) -> Identity {
        Identity(OctetString::new(value))
    }

    pub fn from_str(value: &str) -> Identity {
        Identity(OctetString::new(value.as_bytes().to_vec()))
    }

    pub fn value(&self) -> &[u8] {
        self.0.value()
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.0.value())
    }

    pub fn decode_from<R: Read>(reader: &mut R, len: usize) -> Result<Identity> {
        let avp = OctetString::decode_from(reader, len)?;
        Ok(Identity(avp))
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.encode_to(writer)?;
        Ok(())
    }

    pub fn length(&self) -> u32 {
        self.0.length()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_decode_ascii() {
        let bytes = b"example.com";
        let avp = Identity::new(bytes.to_vec());
        let mut encoded = Vec::new();
        avp.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let avp = Identity::decode_from(&mut cursor, bytes.len()).unwrap();
        assert_eq!(avp.value(), bytes);
        assert_eq!(avp.as_str(), "example.com");
    }
}
