use crate::avp::{Address, Avp, Identity, UTF8String, Unsigned32};
use crate::commands::schema::{FieldDef, FieldKind, Schema};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};

const CER_SCHEMA: Schema = Schema {
    fields: &[
        FieldDef {
            name: "Origin-Host",
            code: avp_code::ORIGIN_HOST,
            vendor_id: None,
            kind: FieldKind::Required,
        },
        FieldDef {
            name: "Origin-Realm",
            code: avp_code::ORIGIN_REALM,
            vendor_id: None,
            kind: FieldKind::Required,
        },
        FieldDef {
            name: "Host-IP-Address",
            code: avp_code::HOST_IP_ADDRESS,
            vendor_id: None,
            kind: FieldKind::Repeated,
        },
        FieldDef {
            name: "Vendor-Id",
            code: avp_code::VENDOR_ID,
            vendor_id: None,
            kind: FieldKind::Required,
        },
        FieldDef {
            name: "Product-Name",
            code: avp_code::PRODUCT_NAME,
            vendor_id: None,
            kind: FieldKind::Required,
        },
    ],
};

/// Capabilities-Exchange-Request (RFC 6733 section 5.3.1).
#[derive(Debug, Clone)]
pub struct CapabilitiesExchangeRequest {
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub host_ip_addresses: Vec<Address>,
    pub vendor_id: u32,
    pub product_name: String,
    pub origin_state_id: Option<u32>,
    pub supported_vendor_ids: Vec<u32>,
    pub auth_application_ids: Vec<u32>,
    pub acct_application_ids: Vec<u32>,
    pub firmware_revision: Option<u32>,
    pub additional_avps: Vec<Avp>,
}

impl CapabilitiesExchangeRequest {
    pub fn new(origin_host: &str, origin_realm: &str, vendor_id: u32, product_name: &str) -> Self {
        CapabilitiesExchangeRequest {
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            host_ip_addresses: Vec::new(),
            vendor_id,
            product_name: product_name.to_string(),
            origin_state_id: None,
            supported_vendor_ids: Vec::new(),
            auth_application_ids: Vec::new(),
            acct_application_ids: Vec::new(),
            firmware_revision: None,
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for CapabilitiesExchangeRequest {
    type Error = Error;

    fn try_from(msg: DiameterMessage) -> Result<Self> {
        CER_SCHEMA.validate(&msg.avps)?;

        let origin_host = msg
            .get_avp(avp_code::ORIGIN_HOST, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::ORIGIN_HOST))?;
        let origin_realm = msg
            .get_avp(avp_code::ORIGIN_REALM, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::ORIGIN_REALM))?;
        let vendor_id = msg
            .get_avp(avp_code::VENDOR_ID, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::VENDOR_ID))?;
        let product_name = msg
            .get_avp(avp_code::PRODUCT_NAME, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)
            .ok_or(Error::MissingAvp(avp_code::PRODUCT_NAME))?;

        let host_ip_addresses = msg
            .get_avps(avp_code::HOST_IP_ADDRESS, None)
            .into_iter()
            .filter_map(|a| a.as_address().cloned())
            .collect();
        let supported_vendor_ids = msg
            .get_avps(avp_code::SUPPORTED_VENDOR_ID, None)
            .into_iter()
            .filter_map(|a| a.as_unsigned32())
            .collect();
        let auth_application_ids = msg
            .get_avps(avp_code::AUTH_APPLICATION_ID, None)
            .into_iter()
            .filter_map(|a| a.as_unsigned32())
            .collect();
        let acct_application_ids = msg
            .get_avps(avp_code::ACCT_APPLICATION_ID, None)
            .into_iter()
            .filter_map(|a| a.as_unsigned32())
            .collect();
        let origin_state_id = msg
            .get_avp(avp_code::ORIGIN_STATE_ID, None)
            .and_then(|a| a.as_unsigned32());
        let firmware_revision = msg
            .get_avp(avp_code::FIRMWARE_REVISION, None)
            .and_then(|a| a.as_unsigned32());

        let known_codes = [
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::VENDOR_ID,
            avp_code::PRODUCT_NAME,
            avp_code::HOST_IP_ADDRESS,
            avp_code::SUPPORTED_VENDOR_ID,
            avp_code::AUTH_APPLICATION_ID,
            avp_code::ACCT_APPLICATION_ID,
            avp_code::ORIGIN_STATE_ID,
            avp_code::FIRMWARE_REVISION,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(CapabilitiesExchangeRequest {
            origin_host,
            origin_realm,
            host_ip_addresses,
            vendor_id,
            product_name,
            origin_state_id,
            supported_vendor_ids,
            auth_application_ids,
            acct_application_ids,
            firmware_revision,
            additional_avps,
        })
    }
}

impl From<CapabilitiesExchangeRequest> for DiameterMessage {
    fn from(req: CapabilitiesExchangeRequest) -> Self {
        let mut msg = DiameterMessage::new(
            command_code::CAPABILITIES_EXCHANGE,
            0 as ApplicationId,
            flags::REQUEST,
            0,
            0,
        );
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        for ip in req.host_ip_addresses {
            msg.add_avp(crate::avp!(avp_code::HOST_IP_ADDRESS, None, ip));
        }
        msg.add_avp(crate::avp!(avp_code::VENDOR_ID, None, Unsigned32::new(req.vendor_id)));
        msg.add_avp(crate::avp!(
            avp_code::PRODUCT_NAME,
            None,
            UTF8String::new(req.product_name)
        ));
        if let Some(state_id) = req.origin_state_id {
            msg.add_avp(crate::avp!(avp_code::ORIGIN_STATE_ID, None, Unsigned32::new(state_id)));
        }
        for vendor in req.supported_vendor_ids {
            msg.add_avp(crate::avp!(avp_code::SUPPORTED_VENDOR_ID, None, Unsigned32::new(vendor)));
        }
        for app_id in req.auth_application_ids {
            msg.add_avp(crate::avp!(avp_code::AUTH_APPLICATION_ID, None, Unsigned32::new(app_id)));
        }
        for app_id in req.acct_application_ids {
            msg.add_avp(crate::avp!(avp_code::ACCT_APPLICATION_ID, None, Unsigned32::new(app_id)));
        }
        if let Some(rev) = req.firmware_revision {
            msg.add_avp(crate::avp!(avp_code::FIRMWARE_REVISION, None, Unsigned32::new(rev)));
        }
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Capabilities-Exchange-Answer (RFC 6733 section 5.3.2).
#[derive(Debug, Clone)]
pub struct CapabilitiesExchangeAnswer {
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub host_ip_addresses: Vec<Address>,
    pub vendor_id: u32,
    pub product_name: String,
    pub error_message: Option<String>,
    pub auth_application_ids: Vec<u32>,
    pub acct_application_ids: Vec<u32>,
    pub additional_avps: Vec<Avp>,
}

impl CapabilitiesExchangeAnswer {
    pub fn new(result_code: u32, origin_host: &str, origin_realm: &str, vendor_id: u32, product_name: &str) -> Self {
        CapabilitiesExchangeAnswer {
            result_code,
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            host_ip_addresses: Vec::new(),
            vendor_id,
            product_name: product_name.to_string(),
            error_message: None,
            auth_application_ids: Vec::new(),
            acct_application_ids: Vec::new(),
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for CapabilitiesExchangeAnswer {
    type Error = Error;

    fn try_from(msg: DiameterMessage) -> Result<Self> {
        let result_code = msg
            .get_avp(avp_code::RESULT_CODE, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::RESULT_CODE))?;
        let origin_host = msg
            .get_avp(avp_code::ORIGIN_HOST, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::ORIGIN_HOST))?;
        let origin_realm = msg
            .get_avp(avp_code::ORIGIN_REALM, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::ORIGIN_REALM))?;
        let vendor_id = msg
            .get_avp(avp_code::VENDOR_ID, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::VENDOR_ID))?;
        let product_name = msg
            .get_avp(avp_code::PRODUCT_NAME, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)
            .ok_or(Error::MissingAvp(avp_code::PRODUCT_NAME))?;
        let error_message = msg
            .get_avp(avp_code::ERROR_MESSAGE, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string);
        let host_ip_addresses = msg
            .get_avps(avp_code::HOST_IP_ADDRESS, None)
            .into_iter()
            .filter_map(|a| a.as_address().cloned())
            .collect();
        let auth_application_ids = msg
            .get_avps(avp_code::AUTH_APPLICATION_ID, None)
            .into_iter()
            .filter_map(|a| a.as_unsigned32())
            .collect();
        let acct_application_ids = msg
            .get_avps(avp_code::ACCT_APPLICATION_ID, None)
            .into_iter()
            .filter_map(|a| a.as_unsigned32())
            .collect();

        let known_codes = [
            avp_code::RESULT_CODE,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::VENDOR_ID,
            avp_code::PRODUCT_NAME,
            avp_code::ERROR_MESSAGE,
            avp_code::HOST_IP_ADDRESS,
            avp_code::AUTH_APPLICATION_ID,
            avp_code::ACCT_APPLICATION_ID,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(CapabilitiesExchangeAnswer {
            result_code,
            origin_host,
            origin_realm,
            host_ip_addresses,
            vendor_id,
            product_name,
            error_message,
            auth_application_ids,
            acct_application_ids,
            additional_avps,
        })
    }
}

impl From<CapabilitiesExchangeAnswer> for DiameterMessage {
    fn from(ans: CapabilitiesExchangeAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::CAPABILITIES_EXCHANGE, 0, 0, 0, 0);
        msg.add_avp(crate::avp!(
            avp_code::RESULT_CODE,
            None,
            Unsigned32::new(ans.result_code)
        ));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, ans.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, ans.origin_realm));
        for ip in ans.host_ip_addresses {
            msg.add_avp(crate::avp!(avp_code::HOST_IP_ADDRESS, None, ip));
        }
        msg.add_avp(crate::avp!(avp_code::VENDOR_ID, None, Unsigned32::new(ans.vendor_id)));
        msg.add_avp(crate::avp!(
            avp_code::PRODUCT_NAME,
            None,
            UTF8String::new(ans.product_name)
        ));
        if let Some(error_message) = ans.error_message {
            msg.add_avp(crate::avp!(avp_code::ERROR_MESSAGE, None, UTF8String::new(error_message)));
        }
        for app_id in ans.auth_application_ids {
            msg.add_avp(crate::avp!(avp_code::AUTH_APPLICATION_ID, None, Unsigned32::new(app_id)));
        }
        for app_id in ans.acct_application_ids {
            msg.add_avp(crate::avp!(avp_code::ACCT_APPLICATION_ID, None, Unsigned32::new(app_id)));
        }
        for avp in ans.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_cer_roundtrip() {
        let mut req = CapabilitiesExchangeRequest::new("client.example.com", "example.com", 10415, "diameter-rs");
        req.host_ip_addresses.push(Address::IPv4(Ipv4Addr::new(10, 0, 0, 1)));
        req.auth_application_ids.push(4);

        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = CapabilitiesExchangeRequest::try_from(decoded).unwrap();

        assert_eq!(back.origin_host.as_str(), "client.example.com");
        assert_eq!(back.vendor_id, 10415);
        assert_eq!(back.auth_application_ids, vec![4]);
        assert_eq!(back.host_ip_addresses.len(), 1);
    }

    #[test]
    fn test_cea_roundtrip() {
        let ans = CapabilitiesExchangeAnswer::new(2001, "server.example.com", "example.com", 10415, "diameter-rs");
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = CapabilitiesExchangeAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
        assert_eq!(back.origin_host.as_str(), "server.example.com");
    }
}
