//! Minimal command-code-format schema: just enough to check that the
//! mandatory AVPs a command requires are present before a typed struct is
//! built from a decoded `DiameterMessage`. Not a full ABNF grammar --
//! ordering and grouped-AVP nesting rules aren't checked, only top-level
//! presence and cardinality.

use crate::avp::Avp;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Must appear exactly once.
    Required,
    /// May appear zero or one times.
    Optional,
    /// May appear any number of times, including zero.
    Repeated,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub code: u32,
    pub vendor_id: Option<u32>,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [FieldDef],
}

impl Schema {
    pub fn validate(&self, avps: &[Avp]) -> Result<()> {
        for field in self.fields {
            let count = avps
                .iter()
                .filter(|a| a.code() == field.code && a.vendor_id() == field.vendor_id)
                .count();
            match field.kind {
                FieldKind::Required if count == 0 => {
                    return Err(Error::MissingAvp(field.code));
                }
                FieldKind::Optional if count > 1 => {
                    return Err(Error::DecodeError(format!(
                        "AVP {} ({}) must not occur more than once",
                        field.name, field.code
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::Identity;
    use crate::constants::avp_code;

    const TEST_SCHEMA: Schema = Schema {
        fields: &[FieldDef {
            name: "Origin-Host",
            code: avp_code::ORIGIN_HOST,
            vendor_id: None,
            kind: FieldKind::Required,
        }],
    };

    #[test]
    fn test_validate_missing_required() {
        let avps = vec![];
        match TEST_SCHEMA.validate(&avps) {
            Err(Error::MissingAvp(code)) => assert_eq!(code, avp_code::ORIGIN_HOST),
            _ => panic!("expected MissingAvp"),
        }
    }

    #[test]
    fn test_validate_present() {
        let avps = vec![avp!(avp_code::ORIGIN_HOST, None, Identity::from_str("a.com"))];
        assert!(TEST_SCHEMA.validate(&avps).is_ok());
    }
}
