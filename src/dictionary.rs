//! AVP dictionary: maps an AVP's (vendor id, code) pair to its wire type
//! and a human-readable name, used by the codec (to pick a decoder) and by
//! `Display` impls (for logging). The default dictionary is embedded at
//! compile time; `Dictionary::from_xml` is available for applications that
//! want to load a Wireshark-style dictionary XML at boot instead.

use lazy_static::lazy_static;
use serde::Deserialize;
use serde_xml_rs::from_str;
use std::collections::BTreeMap;

use crate::avp::AvpType;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct AvpDefinition {
    code: u32,
    vendor_id: Option<u32>,
    name: String,
    avp_type: AvpType,
}

#[derive(Debug)]
pub struct Dictionary {
    avps: BTreeMap<(Option<u32>, u32), AvpDefinition>,
    names: BTreeMap<String, (Option<u32>, u32)>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary {
            avps: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn from_xml(xml: &str) -> Result<Dictionary> {
        parse(xml)
    }

    pub fn add_avp(&mut self, avp: AvpDefinition) {
        self.names
            .insert(avp.name.clone(), (avp.vendor_id, avp.code));
        self.avps.insert((avp.vendor_id, avp.code), avp);
    }

    pub fn get_avp(&self, vendor_id: Option<u32>, code: u32) -> Option<&AvpDefinition> {
        self.avps.get(&(vendor_id, code))
    }

    /// The AVP's decoded type, or `AvpType::Unknown` if it isn't registered.
    /// Base (non-vendor) AVPs are looked up first; vendor AVPs fall back to
    /// their (vendor_id, code) entry.
    pub fn avp_type(&self, vendor_id: Option<u32>, code: u32) -> AvpType {
        if vendor_id.is_none() {
            if let Some(def) = self.avps.get(&(None, code)) {
                return def.avp_type;
            }
        }
        self.avps
            .get(&(vendor_id, code))
            .map(|d| d.avp_type)
            .unwrap_or(AvpType::Unknown)
    }

    pub fn get_avp_name(&self, vendor_id: Option<u32>, code: u32) -> Option<&str> {
        self.avps
            .get(&(vendor_id, code))
            .map(|avp| avp.name.as_str())
    }

    pub fn get_avp_code(&self, name: &str) -> Option<(Option<u32>, u32)> {
        self.names.get(name).copied()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Dictionary::new()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Diameter {
    application: Vec<Application>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Application {
    id: String,
    name: String,
    #[serde(rename = "avp", default)]
    avps: Vec<Avp>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Avp {
    name: String,
    code: String,
    #[serde(rename = "vendor-id")]
    vendor_id: Option<String>,
    data: Data,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Data {
    #[serde(rename = "type")]
    data_type: String,
    #[serde(rename = "item", default)]
    items: Vec<EnumItem>,
}

/// A named value of an `Enumerated` AVP, e.g. `<item code="1"
/// name="INITIAL_REQUEST"/>`. Enumerated values are looked up by number
/// everywhere in this crate (`constants::cc_request_type` and friends), so
/// these are parsed only to keep the dictionary schema lenient -- the names
/// aren't indexed.
#[derive(Debug, Deserialize, PartialEq)]
struct EnumItem {
    #[allow(dead_code)]
    code: String,
    #[allow(dead_code)]
    name: String,
}

fn parse(xml: &str) -> Result<Dictionary> {
    let dict: Diameter = from_str(xml)
        .map_err(|e| Error::DecodeError(format!("invalid dictionary xml: {}", e)))?;

    let mut dictionary = Dictionary::new();

    for application in &dict.application {
        for avp in &application.avps {
            let avp_type = match avp.data.data_type.as_str() {
                "UTF8String" => AvpType::UTF8String,
                "OctetString" => AvpType::OctetString,
                "Integer32" => AvpType::Integer32,
                "Integer64" => AvpType::Integer64,
                "Unsigned32" => AvpType::Unsigned32,
                "Unsigned64" => AvpType::Unsigned64,
                "Enumerated" => AvpType::Enumerated,
                "Grouped" => AvpType::Grouped,
                "DiameterIdentity" => AvpType::Identity,
                "DiameterURI" => AvpType::DiameterURI,
                "Time" => AvpType::Time,
                "Address" => AvpType::Address,
                "IPv4" => AvpType::AddressIPv4,
                "IPv6" => AvpType::AddressIPv6,
                "Float32" => AvpType::Float32,
                "Float64" => AvpType::Float64,
                _ => AvpType::Unknown,
            };

            let vendor_id = avp
                .vendor_id
                .as_ref()
                .map(|v| v.parse::<u32>())
                .transpose()
                .map_err(|_| Error::DecodeError("invalid vendor-id".into()))?;

            let code = avp
                .code
                .parse::<u32>()
                .map_err(|_| Error::DecodeError("invalid avp code".into()))?;

            dictionary.add_avp(AvpDefinition {
                code,
                vendor_id,
                name: avp.name.clone(),
                avp_type,
            });
        }
    }

    Ok(dictionary)
}

lazy_static! {
    pub static ref DEFAULT_DICT: Dictionary =
        parse(DEFAULT_DICT_XML).expect("embedded dictionary must parse");
}

/// AVP coverage for the base protocol and the worked Credit-Control
/// example application; not the full IANA/3GPP registry.
pub const DEFAULT_DICT_XML: &str = r#"
<diameter>
    <application id="0" name="Base">
        <avp name="User-Name" code="1"><data type="UTF8String"/></avp>
        <avp name="Session-Timeout" code="27"><data type="Unsigned32"/></avp>
        <avp name="Proxy-State" code="33"><data type="OctetString"/></avp>
        <avp name="Event-Timestamp" code="55"><data type="Time"/></avp>
        <avp name="Host-IP-Address" code="257"><data type="Address"/></avp>
        <avp name="Auth-Application-Id" code="258"><data type="Unsigned32"/></avp>
        <avp name="Acct-Application-Id" code="259"><data type="Unsigned32"/></avp>
        <avp name="Vendor-Specific-Application-Id" code="260"><data type="Grouped"/></avp>
        <avp name="Session-Id" code="263"><data type="UTF8String"/></avp>
        <avp name="Origin-Host" code="264"><data type="DiameterIdentity"/></avp>
        <avp name="Supported-Vendor-Id" code="265"><data type="Unsigned32"/></avp>
        <avp name="Vendor-Id" code="266"><data type="Unsigned32"/></avp>
        <avp name="Firmware-Revision" code="267"><data type="Unsigned32"/></avp>
        <avp name="Result-Code" code="268"><data type="Unsigned32"/></avp>
        <avp name="Product-Name" code="269"><data type="UTF8String"/></avp>
        <avp name="Disconnect-Cause" code="273"><data type="Enumerated"/></avp>
        <avp name="Auth-Session-State" code="277"><data type="Enumerated"/></avp>
        <avp name="Origin-State-Id" code="278"><data type="Unsigned32"/></avp>
        <avp name="Failed-AVP" code="279"><data type="Grouped"/></avp>
        <avp name="Proxy-Host" code="280"><data type="DiameterIdentity"/></avp>
        <avp name="Error-Message" code="281"><data type="UTF8String"/></avp>
        <avp name="Route-Record" code="282"><data type="DiameterIdentity"/></avp>
        <avp name="Destination-Realm" code="283"><data type="DiameterIdentity"/></avp>
        <avp name="Proxy-Info" code="284"><data type="Grouped"/></avp>
        <avp name="Re-Auth-Request-Type" code="285"><data type="Enumerated"/></avp>
        <avp name="Destination-Host" code="293"><data type="DiameterIdentity"/></avp>
        <avp name="Error-Reporting-Host" code="294"><data type="DiameterIdentity"/></avp>
        <avp name="Termination-Cause" code="295"><data type="Enumerated"/></avp>
        <avp name="Origin-Realm" code="296"><data type="DiameterIdentity"/></avp>
        <avp name="Inband-Security-Id" code="299"><data type="Unsigned32"/></avp>
    </application>

    <application id="4" name="Credit-Control">
        <avp name="CC-Input-Octets" code="412"><data type="Unsigned64"/></avp>
        <avp name="CC-Money" code="413"><data type="Grouped"/></avp>
        <avp name="CC-Output-Octets" code="414"><data type="Unsigned64"/></avp>
        <avp name="CC-Request-Number" code="415"><data type="Unsigned32"/></avp>
        <avp name="CC-Request-Type" code="416">
            <data type="Enumerated">
                <item code="1" name="INITIAL_REQUEST"/>
                <item code="2" name="UPDATE_REQUEST"/>
                <item code="3" name="TERMINATION_REQUEST"/>
                <item code="4" name="EVENT_REQUEST"/>
            </data>
        </avp>
        <avp name="CC-Session-Failover" code="418"><data type="Enumerated"/></avp>
        <avp name="CC-Sub-Session-Id" code="419"><data type="Unsigned64"/></avp>
        <avp name="CC-Time" code="420"><data type="Unsigned32"/></avp>
        <avp name="CC-Total-Octets" code="421"><data type="Unsigned64"/></avp>
        <avp name="Check-Balance-Result" code="422"><data type="Enumerated"/></avp>
        <avp name="Cost-Information" code="423"><data type="Grouped"/></avp>
        <avp name="Currency-Code" code="425"><data type="Unsigned32"/></avp>
        <avp name="Credit-Control" code="426"><data type="Enumerated"/></avp>
        <avp name="Credit-Control-Failure-Handling" code="427"><data type="Enumerated"/></avp>
        <avp name="Direct-Debiting-Failure-Handling" code="428"><data type="Enumerated"/></avp>
        <avp name="Exponent" code="429"><data type="Integer32"/></avp>
        <avp name="Final-Unit-Indication" code="430"><data type="Grouped"/></avp>
        <avp name="Granted-Service-Unit" code="431"><data type="Grouped"/></avp>
        <avp name="Rating-Group" code="432"><data type="Unsigned32"/></avp>
        <avp name="Redirect-Address-Type" code="433"><data type="Enumerated"/></avp>
        <avp name="Redirect-Server" code="434"><data type="Grouped"/></avp>
        <avp name="Redirect-Server-Address" code="435"><data type="UTF8String"/></avp>
        <avp name="Requested-Action" code="436"><data type="Enumerated"/></avp>
        <avp name="Requested-Service-Unit" code="437"><data type="Grouped"/></avp>
        <avp name="Restriction-Filter-Rule" code="438"><data type="UTF8String"/></avp>
        <avp name="Service-Identifier" code="439"><data type="Unsigned32"/></avp>
        <avp name="Service-Parameter-Info" code="440"><data type="Grouped"/></avp>
        <avp name="Service-Parameter-Type" code="441"><data type="Unsigned32"/></avp>
        <avp name="Service-Parameter-Value" code="442"><data type="UTF8String"/></avp>
        <avp name="Subscription-Id" code="443"><data type="Grouped"/></avp>
        <avp name="Subscription-Id-Data" code="444"><data type="UTF8String"/></avp>
        <avp name="Unit-Value" code="445"><data type="Grouped"/></avp>
        <avp name="Used-Service-Unit" code="446"><data type="Grouped"/></avp>
        <avp name="Value-Digits" code="447"><data type="Integer64"/></avp>
        <avp name="Validity-Time" code="448"><data type="Unsigned32"/></avp>
        <avp name="Final-Unit-Action" code="449">
            <data type="Enumerated">
                <item code="0" name="TERMINATE"/>
                <item code="1" name="REDIRECT"/>
                <item code="2" name="RESTRICT_ACCESS"/>
            </data>
        </avp>
        <avp name="Subscription-Id-Type" code="450">
            <data type="Enumerated">
                <item code="0" name="END_USER_E164"/>
                <item code="1" name="END_USER_IMSI"/>
                <item code="2" name="END_USER_SIP_URI"/>
                <item code="3" name="END_USER_NAI"/>
                <item code="4" name="END_USER_PRIVATE"/>
            </data>
        </avp>
        <avp name="Tariff-Time-Change" code="451"><data type="Time"/></avp>
        <avp name="Tariff-Change-Usage" code="452"><data type="Enumerated"/></avp>
        <avp name="G-S-U-Pool-Identifier" code="453"><data type="Unsigned32"/></avp>
        <avp name="CC-Unit-Type" code="454"><data type="Enumerated"/></avp>
        <avp name="Multiple-Services-Indicator" code="455"><data type="Enumerated"/></avp>
        <avp name="Multiple-Services-Credit-Control" code="456"><data type="Grouped"/></avp>
        <avp name="G-S-U-Pool-Reference" code="457"><data type="Grouped"/></avp>
        <avp name="User-Equipment-Info" code="458"><data type="Grouped"/></avp>
        <avp name="User-Equipment-Info-Type" code="459"><data type="Enumerated"/></avp>
        <avp name="User-Equipment-Info-Value" code="460"><data type="OctetString"/></avp>
    </application>
</diameter>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dict_resolves_base_avps() {
        assert_eq!(DEFAULT_DICT.avp_type(None, 264), AvpType::Identity);
        assert_eq!(DEFAULT_DICT.avp_type(None, 268), AvpType::Unsigned32);
        assert_eq!(DEFAULT_DICT.avp_type(None, 279), AvpType::Grouped);
    }

    #[test]
    fn test_default_dict_resolves_credit_control_avps() {
        assert_eq!(DEFAULT_DICT.avp_type(None, 416), AvpType::Enumerated);
        assert_eq!(DEFAULT_DICT.avp_type(None, 443), AvpType::Grouped);
    }

    #[test]
    fn test_unknown_code_is_unknown_type() {
        assert_eq!(DEFAULT_DICT.avp_type(None, 999_999), AvpType::Unknown);
    }

    #[test]
    fn test_from_xml_custom_dictionary() {
        let xml = r#"
        <diameter>
            <application id="99" name="Test">
                <avp name="Custom-Avp" code="5000"><data type="UTF8String"/></avp>
            </application>
        </diameter>
        "#;
        let dict = Dictionary::from_xml(xml).unwrap();
        assert_eq!(dict.avp_type(None, 5000), AvpType::UTF8String);
        assert_eq!(dict.get_avp_name(None, 5000), Some("Custom-Avp"));
    }
}
