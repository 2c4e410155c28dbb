//! Diameter message header and generic message container (RFC 6733 section
//! 3).
//!
//! Raw packet format:
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |    Version    |                 Message Length                |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  | command flags |                  Command-Code                 |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                         Application-ID                        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                      Hop-by-Hop Identifier                    |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                      End-to-End Identifier                    |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! Command codes and application ids are plain 32-bit values, not a closed
//! enum: `constants` names the ones this crate understands, `commands`
//! gives typed structs for a handful of them, and anything else flows
//! through as a `GenericMessage`.

use crate::avp::Avp;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

pub const VERSION: u8 = 1;
pub const HEADER_LENGTH: u32 = 20;

pub type CommandCode = u32;
pub type ApplicationId = u32;

/// Command flag bit masks (RFC 6733 section 3).
pub mod flags {
    /// Request. Clear in an answer.
    pub const REQUEST: u8 = 0x80;
    /// May be proxied, relayed or redirected.
    pub const PROXYABLE: u8 = 0x40;
    /// Answer carries a protocol-error Result-Code; payload may not match
    /// the command's normal answer CCF.
    pub const ERROR: u8 = 0x20;
    /// Possible duplicate of an earlier transmission, set on failover.
    pub const RETRANSMIT: u8 = 0x10;
}

#[derive(Debug, Clone)]
pub struct DiameterHeader {
    pub version: u8,
    pub length: u32,
    pub flags: u8,
    pub code: CommandCode,
    pub application_id: ApplicationId,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
}

impl DiameterHeader {
    pub fn new(
        code: CommandCode,
        application_id: ApplicationId,
        flags: u8,
        hop_by_hop_id: u32,
        end_to_end_id: u32,
    ) -> DiameterHeader {
        DiameterHeader {
            version: VERSION,
            length: HEADER_LENGTH,
            flags,
            code,
            application_id,
            hop_by_hop_id,
            end_to_end_id,
        }
    }

    pub fn is_request(&self) -> bool {
        self.flags & flags::REQUEST != 0
    }

    pub fn is_proxyable(&self) -> bool {
        self.flags & flags::PROXYABLE != 0
    }

    pub fn is_error(&self) -> bool {
        self.flags & flags::ERROR != 0
    }

    pub fn is_retransmit(&self) -> bool {
        self.flags & flags::RETRANSMIT != 0
    }

    pub fn decode_from<R: Read>(reader: &mut R) -> Result<DiameterHeader> {
        let mut b = [0; 20];
        reader.read_exact(&mut b)?;

        let version = b[0];
        let length = u32::from_be_bytes([0, b[1], b[2], b[3]]);
        let flags = b[4];
        let code = u32::from_be_bytes([0, b[5], b[6], b[7]]);
        let application_id = u32::from_be_bytes([b[8], b[9], b[10], b[11]]);
        let hop_by_hop_id = u32::from_be_bytes([b[12], b[13], b[14], b[15]]);
        let end_to_end_id = u32::from_be_bytes([b[16], b[17], b[18], b[19]]);

        if version != VERSION {
            return Err(Error::MalformedHeader(format!(
                "unsupported diameter version {}",
                version
            )));
        }
        if length < HEADER_LENGTH {
            return Err(Error::MalformedHeader("message length shorter than header".into()));
        }

        Ok(DiameterHeader {
            version,
            length,
            flags,
            code,
            application_id,
            hop_by_hop_id,
            end_to_end_id,
        })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version])?;
        writer.write_all(&self.length.to_be_bytes()[1..4])?;
        writer.write_all(&[self.flags])?;
        writer.write_all(&self.code.to_be_bytes()[1..4])?;
        writer.write_all(&self.application_id.to_be_bytes())?;
        writer.write_all(&self.hop_by_hop_id.to_be_bytes())?;
        writer.write_all(&self.end_to_end_id.to_be_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DiameterMessage {
    pub header: DiameterHeader,
    pub avps: Vec<Avp>,
}

/// A message whose command isn't one of the typed structs in `commands` --
/// the router and the relay/proxy path deal exclusively in these, since
/// they don't need to interpret the payload.
pub type GenericMessage = DiameterMessage;

impl DiameterMessage {
    pub fn new(
        code: CommandCode,
        application_id: ApplicationId,
        flags: u8,
        hop_by_hop_id: u32,
        end_to_end_id: u32,
    ) -> DiameterMessage {
        DiameterMessage {
            header: DiameterHeader::new(code, application_id, flags, hop_by_hop_id, end_to_end_id),
            avps: Vec::new(),
        }
    }

    pub fn add_avp(&mut self, avp: Avp) -> &mut Self {
        self.header.length += avp.length() + avp.padding() as u32;
        self.avps.push(avp);
        self
    }

    pub fn get_avp(&self, code: u32, vendor_id: Option<u32>) -> Option<&Avp> {
        self.avps
            .iter()
            .find(|a| a.code() == code && a.vendor_id() == vendor_id)
    }

    pub fn get_avps(&self, code: u32, vendor_id: Option<u32>) -> Vec<&Avp> {
        self.avps
            .iter()
            .filter(|a| a.code() == code && a.vendor_id() == vendor_id)
            .collect()
    }

    pub fn decode_from<R: Read + Seek>(reader: &mut R) -> Result<DiameterMessage> {
        let header = DiameterHeader::decode_from(reader)?;

        let mut avps = Vec::new();
        let mut offset = HEADER_LENGTH;
        while offset < header.length {
            let avp = Avp::decode_from(reader).map_err(|e| Error::MalformedBody {
                header: Box::new(header.clone()),
                source: Box::new(e),
            })?;
            offset += avp.length() + avp.padding() as u32;
            avps.push(avp);
        }

        if offset != header.length {
            return Err(Error::MalformedBody {
                header: Box::new(header.clone()),
                source: Box::new(Error::DecodeError("invalid diameter message: length mismatch".into())),
            });
        }

        Ok(DiameterMessage { header, avps })
    }

    pub fn from_bytes(b: &[u8]) -> Result<DiameterMessage> {
        let mut cursor = Cursor::new(b);
        DiameterMessage::decode_from(&mut cursor)
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.encode_to(writer)?;
        for avp in &self.avps {
            avp.encode_to(writer)?;
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.header.length as usize);
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    /// Peeks the total message length from the first 4 bytes of a header,
    /// used by the transport layer to know how many more bytes to read off
    /// the wire before decoding.
    pub fn peek_length(b: &[u8]) -> Option<u32> {
        if b.len() < 4 {
            return None;
        }
        Some(u32::from_be_bytes([0, b[1], b[2], b[3]]))
    }

    /// Builds an empty answer shell: R bit cleared, same command code,
    /// application id and end-to-end id, same hop-by-hop id so the sender
    /// can correlate it. Callers add their own AVPs (Result-Code first,
    /// conventionally).
    pub fn to_answer(&self) -> DiameterMessage {
        let mut flags = self.header.flags & !self::flags::REQUEST;
        flags &= !self::flags::RETRANSMIT;
        DiameterMessage::new(
            self.header.code,
            self.header.application_id,
            flags,
            self.header.hop_by_hop_id,
            self.header.end_to_end_id,
        )
    }

    pub fn seek_to_start<R: Seek>(reader: &mut R) -> Result<()> {
        reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::Identity;
    use crate::avp::Unsigned32;

    #[test]
    fn test_header_roundtrip() {
        let header = DiameterHeader::new(272, 4, flags::REQUEST, 1123158610, 3102381851);
        let mut encoded = Vec::new();
        header.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let decoded = DiameterHeader::decode_from(&mut cursor).unwrap();
        assert_eq!(decoded.code, 272);
        assert_eq!(decoded.application_id, 4);
        assert!(decoded.is_request());
        assert!(!decoded.is_error());
    }

    #[test]
    fn test_message_roundtrip() {
        let mut msg = DiameterMessage::new(272, 4, flags::REQUEST, 1, 2);
        msg.add_avp(avp!(264, None, Identity::from_str("client.example.com")));
        msg.add_avp(avp!(296, None, Identity::from_str("example.com")));

        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.avps.len(), 2);
        assert_eq!(decoded.header.length, msg.header.length);
    }

    #[test]
    fn test_to_answer_clears_request_bit() {
        let mut req = DiameterMessage::new(272, 4, flags::REQUEST, 42, 99);
        req.add_avp(avp!(268, None, Unsigned32::new(2001)));
        let answer = req.to_answer();
        assert!(!answer.header.is_request());
        assert_eq!(answer.header.hop_by_hop_id, 42);
        assert_eq!(answer.header.end_to_end_id, 99);
        assert_eq!(answer.header.code, 272);
    }

    #[test]
    fn test_decode_wraps_unknown_mandatory_avp_as_malformed_body() {
        use crate::avp::{Avp, AvpValue, OctetString};
        use crate::diameter::flags as cmd_flags;

        let mut msg = DiameterMessage::new(272, 4, cmd_flags::REQUEST, 1, 1);
        msg.add_avp(Avp::new(999_996, None, crate::avp::flags::M, AvpValue::OctetString(OctetString::new(vec![9, 9]))));

        let bytes = msg.as_bytes().unwrap();
        match DiameterMessage::from_bytes(&bytes) {
            Err(Error::MalformedBody { header, source }) => {
                assert_eq!(header.code, 272);
                assert!(matches!(*source, Error::UnknownMandatoryAvp(999_996)));
            }
            other => panic!("expected MalformedBody, got {:?}", other.map(|_| ())),
        }
    }
}
