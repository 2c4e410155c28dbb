use crate::avp::{Avp, Identity, Unsigned32};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, DiameterMessage};
use crate::error::{Error, Result};

/// Device-Watchdog-Request (RFC 3539 section 3.4).
#[derive(Debug, Clone)]
pub struct DeviceWatchdogRequest {
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub origin_state_id: Option<u32>,
    pub additional_avps: Vec<Avp>,
}

impl DeviceWatchdogRequest {
    pub fn new(origin_host: &str, origin_realm: &str) -> Self {
        DeviceWatchdogRequest {
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            origin_state_id: None,
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for DeviceWatchdogRequest {
    type Error = Error;

    fn try_from(msg: DiameterMessage) -> Result<Self> {
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
        let origin_state_id = msg
            .get_avp(avp_code::ORIGIN_STATE_ID, None)
            .and_then(|a| a.as_unsigned32());

        let known_codes = [avp_code::ORIGIN_HOST, avp_code::ORIGIN_REALM, avp_code::ORIGIN_STATE_ID];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(DeviceWatchdogRequest {
            origin_host,
            origin_realm,
            origin_state_id,
            additional_avps,
        })
    }
}

impl From<DeviceWatchdogRequest> for DiameterMessage {
    fn from(req: DeviceWatchdogRequest) -> Self {
        let mut msg = DiameterMessage::new(command_code::DEVICE_WATCHDOG, 0, flags::REQUEST, 0, 0);
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        if let Some(state_id) = req.origin_state_id {
            msg.add_avp(crate::avp!(avp_code::ORIGIN_STATE_ID, None, Unsigned32::new(state_id)));
        }
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Device-Watchdog-Answer (RFC 3539 section 3.4).
#[derive(Debug, Clone)]
pub struct DeviceWatchdogAnswer {
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub origin_state_id: Option<u32>,
    pub additional_avps: Vec<Avp>,
}

impl DeviceWatchdogAnswer {
    pub fn new(result_code: u32, origin_host: &str, origin_realm: &str) -> Self {
        DeviceWatchdogAnswer {
            result_code,
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            origin_state_id: None,
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for DeviceWatchdogAnswer {
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
        let origin_state_id = msg
            .get_avp(avp_code::ORIGIN_STATE_ID, None)
            .and_then(|a| a.as_unsigned32());

        let known_codes = [
            avp_code::RESULT_CODE,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::ORIGIN_STATE_ID,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(DeviceWatchdogAnswer {
            result_code,
            origin_host,
            origin_realm,
            origin_state_id,
            additional_avps,
        })
    }
}

impl From<DeviceWatchdogAnswer> for DiameterMessage {
    fn from(ans: DeviceWatchdogAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::DEVICE_WATCHDOG, 0, 0, 0, 0);
        msg.add_avp(crate::avp!(avp_code::RESULT_CODE, None, Unsigned32::new(ans.result_code)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, ans.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, ans.origin_realm));
        if let Some(state_id) = ans.origin_state_id {
            msg.add_avp(crate::avp!(avp_code::ORIGIN_STATE_ID, None, Unsigned32::new(state_id)));
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

    #[test]
    fn test_dwr_roundtrip() {
        let req = DeviceWatchdogRequest::new("client.example.com", "example.com");
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = DeviceWatchdogRequest::try_from(decoded).unwrap();
        assert_eq!(back.origin_host.as_str(), "client.example.com");
    }

    #[test]
    fn test_dwa_roundtrip() {
        let ans = DeviceWatchdogAnswer::new(2001, "server.example.com", "example.com");
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = DeviceWatchdogAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
    }
}
