use crate::avp::{Avp, Identity, UTF8String, Unsigned32};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};

/// Abort-Session-Request (RFC 6733 section 8.5.1).
#[derive(Debug, Clone)]
pub struct AbortSessionRequest {
    pub session_id: String,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub destination_realm: Identity,
    pub destination_host: Identity,
    pub auth_application_id: u32,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for AbortSessionRequest {
    type Error = Error;

    fn try_from(msg: DiameterMessage) -> Result<Self> {
        let session_id = msg
            .get_avp(avp_code::SESSION_ID, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)
            .ok_or(Error::MissingAvp(avp_code::SESSION_ID))?;
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
        let destination_realm = msg
            .get_avp(avp_code::DESTINATION_REALM, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::DESTINATION_REALM))?;
        let destination_host = msg
            .get_avp(avp_code::DESTINATION_HOST, None)
            .and_then(|a| a.as_identity())
            .cloned()
            .ok_or(Error::MissingAvp(avp_code::DESTINATION_HOST))?;
        let auth_application_id = msg
            .get_avp(avp_code::AUTH_APPLICATION_ID, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::AUTH_APPLICATION_ID))?;

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::DESTINATION_REALM,
            avp_code::DESTINATION_HOST,
            avp_code::AUTH_APPLICATION_ID,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(AbortSessionRequest {
            session_id,
            origin_host,
            origin_realm,
            destination_realm,
            destination_host,
            auth_application_id,
            additional_avps,
        })
    }
}

impl From<AbortSessionRequest> for DiameterMessage {
    fn from(req: AbortSessionRequest) -> Self {
        let mut msg = DiameterMessage::new(
            command_code::ABORT_SESSION,
            req.auth_application_id as ApplicationId,
            flags::REQUEST,
            0,
            0,
        );
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(req.session_id)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        msg.add_avp(crate::avp!(avp_code::DESTINATION_REALM, None, req.destination_realm));
        msg.add_avp(crate::avp!(avp_code::DESTINATION_HOST, None, req.destination_host));
        msg.add_avp(crate::avp!(
            avp_code::AUTH_APPLICATION_ID,
            None,
            Unsigned32::new(req.auth_application_id)
        ));
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Abort-Session-Answer (RFC 6733 section 8.5.2).
#[derive(Debug, Clone)]
pub struct AbortSessionAnswer {
    pub session_id: String,
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for AbortSessionAnswer {
    type Error = Error;

    fn try_from(msg: DiameterMessage) -> Result<Self> {
        let session_id = msg
            .get_avp(avp_code::SESSION_ID, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)
            .ok_or(Error::MissingAvp(avp_code::SESSION_ID))?;
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

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::RESULT_CODE,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(AbortSessionAnswer {
            session_id,
            result_code,
            origin_host,
            origin_realm,
            additional_avps,
        })
    }
}

impl From<AbortSessionAnswer> for DiameterMessage {
    fn from(ans: AbortSessionAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::ABORT_SESSION, 0, 0, 0, 0);
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(ans.session_id)));
        msg.add_avp(crate::avp!(avp_code::RESULT_CODE, None, Unsigned32::new(ans.result_code)));
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

    #[test]
    fn test_asr_roundtrip() {
        let req = AbortSessionRequest {
            session_id: "example.com;1;2".to_string(),
            origin_host: Identity::from_str("server.example.com"),
            origin_realm: Identity::from_str("example.com"),
            destination_realm: Identity::from_str("example.com"),
            destination_host: Identity::from_str("client.example.com"),
            auth_application_id: 4,
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = AbortSessionRequest::try_from(decoded).unwrap();
        assert_eq!(back.session_id, "example.com;1;2");
    }

    #[test]
    fn test_asa_roundtrip() {
        let ans = AbortSessionAnswer {
            session_id: "example.com;1;2".to_string(),
            result_code: 2001,
            origin_host: Identity::from_str("client.example.com"),
            origin_realm: Identity::from_str("example.com"),
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = AbortSessionAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
    }
}
