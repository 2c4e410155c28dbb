use crate::avp::{Avp, Enumerated, Identity, UTF8String, Unsigned32};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};

/// Session-Termination-Request (RFC 6733 section 8.4.1).
#[derive(Debug, Clone)]
pub struct SessionTerminateRequest {
    pub session_id: String,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub destination_realm: Identity,
    pub auth_application_id: u32,
    pub termination_cause: i32,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for SessionTerminateRequest {
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
        let auth_application_id = msg
            .get_avp(avp_code::AUTH_APPLICATION_ID, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::AUTH_APPLICATION_ID))?;
        let termination_cause = msg
            .get_avp(avp_code::TERMINATION_CAUSE, None)
            .and_then(|a| a.as_enumerated())
            .ok_or(Error::MissingAvp(avp_code::TERMINATION_CAUSE))?;

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::DESTINATION_REALM,
            avp_code::AUTH_APPLICATION_ID,
            avp_code::TERMINATION_CAUSE,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(SessionTerminateRequest {
            session_id,
            origin_host,
            origin_realm,
            destination_realm,
            auth_application_id,
            termination_cause,
            additional_avps,
        })
    }
}

impl From<SessionTerminateRequest> for DiameterMessage {
    fn from(req: SessionTerminateRequest) -> Self {
        let mut msg = DiameterMessage::new(
            command_code::SESSION_TERMINATE,
            req.auth_application_id as ApplicationId,
            flags::REQUEST,
            0,
            0,
        );
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(req.session_id)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        msg.add_avp(crate::avp!(avp_code::DESTINATION_REALM, None, req.destination_realm));
        msg.add_avp(crate::avp!(
            avp_code::AUTH_APPLICATION_ID,
            None,
            Unsigned32::new(req.auth_application_id)
        ));
        msg.add_avp(crate::avp!(
            avp_code::TERMINATION_CAUSE,
            None,
            Enumerated::new(req.termination_cause)
        ));
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Session-Termination-Answer (RFC 6733 section 8.4.2).
#[derive(Debug, Clone)]
pub struct SessionTerminateAnswer {
    pub session_id: String,
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for SessionTerminateAnswer {
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

        Ok(SessionTerminateAnswer {
            session_id,
            result_code,
            origin_host,
            origin_realm,
            additional_avps,
        })
    }
}

impl From<SessionTerminateAnswer> for DiameterMessage {
    fn from(ans: SessionTerminateAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::SESSION_TERMINATE, 0, 0, 0, 0);
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
    use crate::constants::termination_cause;

    #[test]
    fn test_str_roundtrip() {
        let req = SessionTerminateRequest {
            session_id: "example.com;1;2".to_string(),
            origin_host: Identity::from_str("client.example.com"),
            origin_realm: Identity::from_str("example.com"),
            destination_realm: Identity::from_str("example.com"),
            auth_application_id: 4,
            termination_cause: termination_cause::DIAMETER_LOGOUT,
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = SessionTerminateRequest::try_from(decoded).unwrap();
        assert_eq!(back.termination_cause, termination_cause::DIAMETER_LOGOUT);
    }

    #[test]
    fn test_sta_roundtrip() {
        let ans = SessionTerminateAnswer {
            session_id: "example.com;1;2".to_string(),
            result_code: 2001,
            origin_host: Identity::from_str("server.example.com"),
            origin_realm: Identity::from_str("example.com"),
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = SessionTerminateAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
    }
}
