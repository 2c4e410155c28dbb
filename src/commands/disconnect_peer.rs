use crate::avp::{Avp, Identity, Enumerated};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, DiameterMessage};
use crate::error::{Error, Result};

/// Disconnect-Peer-Request (RFC 6733 section 5.4.1).
#[derive(Debug, Clone)]
pub struct DisconnectPeerRequest {
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub disconnect_cause: i32,
    pub additional_avps: Vec<Avp>,
}

impl DisconnectPeerRequest {
    pub fn new(origin_host: &str, origin_realm: &str, disconnect_cause: i32) -> Self {
        DisconnectPeerRequest {
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            disconnect_cause,
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for DisconnectPeerRequest {
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
        let disconnect_cause = msg
            .get_avp(avp_code::DISCONNECT_CAUSE, None)
            .and_then(|a| a.as_enumerated())
            .ok_or(Error::MissingAvp(avp_code::DISCONNECT_CAUSE))?;

        let known_codes = [avp_code::ORIGIN_HOST, avp_code::ORIGIN_REALM, avp_code::DISCONNECT_CAUSE];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(DisconnectPeerRequest {
            origin_host,
            origin_realm,
            disconnect_cause,
            additional_avps,
        })
    }
}

impl From<DisconnectPeerRequest> for DiameterMessage {
    fn from(req: DisconnectPeerRequest) -> Self {
        let mut msg = DiameterMessage::new(command_code::DISCONNECT_PEER, 0, flags::REQUEST, 0, 0);
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        msg.add_avp(crate::avp!(
            avp_code::DISCONNECT_CAUSE,
            None,
            Enumerated::new(req.disconnect_cause)
        ));
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Disconnect-Peer-Answer (RFC 6733 section 5.4.2).
#[derive(Debug, Clone)]
pub struct DisconnectPeerAnswer {
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub additional_avps: Vec<Avp>,
}

impl DisconnectPeerAnswer {
    pub fn new(result_code: u32, origin_host: &str, origin_realm: &str) -> Self {
        DisconnectPeerAnswer {
            result_code,
            origin_host: Identity::from_str(origin_host),
            origin_realm: Identity::from_str(origin_realm),
            additional_avps: Vec::new(),
        }
    }
}

impl TryFrom<DiameterMessage> for DisconnectPeerAnswer {
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

        let known_codes = [avp_code::RESULT_CODE, avp_code::ORIGIN_HOST, avp_code::ORIGIN_REALM];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(DisconnectPeerAnswer {
            result_code,
            origin_host,
            origin_realm,
            additional_avps,
        })
    }
}

impl From<DisconnectPeerAnswer> for DiameterMessage {
    fn from(ans: DisconnectPeerAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::DISCONNECT_PEER, 0, 0, 0, 0);
        msg.add_avp(crate::avp!(avp_code::RESULT_CODE, None, crate::avp::Unsigned32::new(ans.result_code)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, ans.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, ans.origin_realm));
        for avp in ans.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::disconnect_cause;

    #[test]
    fn test_dpr_roundtrip() {
        let req = DisconnectPeerRequest::new("client.example.com", "example.com", disconnect_cause::REBOOTING);
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = DisconnectPeerRequest::try_from(decoded).unwrap();
        assert_eq!(back.disconnect_cause, disconnect_cause::REBOOTING);
    }

    #[test]
    fn test_dpa_roundtrip() {
        let ans = DisconnectPeerAnswer::new(2001, "server.example.com", "example.com");
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = DisconnectPeerAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
    }
}
