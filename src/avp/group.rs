use crate::avp::Avp;
use crate::error::{Error, Result};
use std::io::Read;
use std::io::Seek;
use std::io::Write;

/// A Grouped AVP: an ordered sequence of AVPs nested inside a single value.
/// Children whose codes aren't in a command's schema are still decoded and
/// kept in `avps` in their original order -- callers that only care about
/// known fields read through the command struct; anything else round-trips
/// through `avps` unchanged.
#[derive(Debug, Clone, Default)]
pub struct Grouped {
    avps: Vec<Avp>,
}

impl Grouped {
    pub fn new(avps: Vec<Avp>) -> Grouped {
        Grouped { avps }
    }

    pub fn avps(&self) -> &[Avp] {
        &self.avps
    }

    pub fn add(&mut self, avp: Avp) {
        self.avps.push(avp);
    }

    pub fn find(&self, code: u32, vendor_id: Option<u32>) -> Option<&Avp> {
        self.avps
            .iter()
            .find(|a| a.code() == code && a.vendor_id() == vendor_id)
    }

    pub fn decode_from<R: Read + Seek>(reader: &mut R, len: usize) -> Result<Grouped> {
        let mut avps = Vec::new();

        let mut offset = 0;
        while offset < len {
            let avp = Avp::decode_from(reader)?;
            offset += avp.length() as usize;
            offset += avp.padding() as usize;
            avps.push(avp);
        }

        if offset != len {
            return Err(Error::DecodeError(
                "invalid grouped AVP: length mismatch".into(),
            ));
        }

        Ok(Grouped { avps })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for avp in &self.avps {
            avp.encode_to(writer)?;
        }
        Ok(())
    }

    pub fn length(&self) -> u32 {
        self.avps
            .iter()
            .map(|avp| avp.length() + avp.padding() as u32)
            .sum()
    }
}

impl std::fmt::Display for Grouped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for avp in &self.avps {
            write!(f, "{{{}: {}}} ", avp.code(), avp.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::enumerated::Enumerated;
    use crate::avp::unsigned32::Unsigned32;
    use crate::avp::AvpValue;
    use std::io::Cursor;

    #[test]
    fn test_new_grouped_avp() {
        let mut grouped = Grouped::new(vec![]);
        grouped.add(avp!(416, None, Enumerated::new(1)));
        grouped.add(avp!(415, None, Unsigned32::new(1000)));

        assert_eq!(grouped.avps().len(), 2);
        assert_eq!(grouped.avps()[0].code(), 416);
        assert_eq!(grouped.avps()[1].code(), 415);
    }

    #[test]
    fn test_encode_decode() {
        let grouped = Grouped::new(vec![
            avp!(416, None, Enumerated::new(1)),
            avp!(415, None, Unsigned32::new(1000)),
        ]);
        let mut encoded = Vec::new();
        grouped.encode_to(&mut encoded).unwrap();

        let mut cursor = Cursor::new(&encoded);
        let decoded = Grouped::decode_from(&mut cursor, encoded.len()).unwrap();
        assert_eq!(decoded.avps().len(), 2);
        assert_eq!(decoded.avps()[0].code(), 416);
        assert_eq!(decoded.avps()[1].code(), 415);

        match decoded.avps()[0].value() {
            AvpValue::Enumerated(v) => assert_eq!(v.value(), 1),
            _ => panic!("expected Enumerated"),
        }
        match decoded.avps()[1].value() {
            AvpValue::Unsigned32(v) => assert_eq!(v.value(), 1000),
            _ => panic!("expected Unsigned32"),
        }
    }
}
