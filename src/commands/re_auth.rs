use crate::avp::{Avp, Enumerated, Identity, UTF8String};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};

/// Re-Auth-Request (RFC 6733 section 8.3.1).
#[derive(Debug, Clone)]
pub struct ReAuthRequest {
    pub session_id: String,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub destination_realm: Identity,
    pub destination_host: Identity,
    pub auth_application_id: u32,
    pub re_auth_request_type: i32,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for ReAuthRequest {
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
        let re_auth_request_type = msg
            .get_avp(avp_code::RE_AUTH_REQUEST_TYPE, None)
            .and_then(|a| a.as_enumerated())
            .ok_or(Error::MissingAvp(avp_code::RE_AUTH_REQUEST_TYPE))?;

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::DESTINATION_REALM,
            avp_code::DESTINATION_HOST,
            avp_code::AUTH_APPLICATION_ID,
            avp_code::RE_AUTH_REQUEST_TYPE,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(ReAuthRequest {
            session_id,
            origin_host,
            origin_realm,
            destination_realm,
            destination_host,
            auth_application_id,
            re_auth_request_type,
            additional_avps,
        })
    }
}

impl From<ReAuthRequest> for DiameterMessage {
    fn from(req: ReAuthRequest) -> Self {
        let mut msg = DiameterMessage::new(
            command_code::RE_AUTH,
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
            crate::avp::Unsigned32::new(req.auth_application_id)
        ));
        msg.add_avp(crate::avp!(
            avp_code::RE_AUTH_REQUEST_TYPE,
            None,
            Enumerated::new(req.re_auth_request_type)
        ));
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Re-Auth-Answer (RFC 6733 section 8.3.2).
#[derive(Debug, Clone)]
pub struct ReAuthAnswer {
    pub session_id: String,
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for ReAuthAnswer {
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

        Ok(ReAuthAnswer {
            session_id,
            result_code,
            origin_host,
            origin_realm,
            additional_avps,
        })
    }
}

impl From<ReAuthAnswer> for DiameterMessage {
    fn from(ans: ReAuthAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::RE_AUTH, 0, 0, 0, 0);
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(ans.session_id)));
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
    use crate::constants::re_auth_request_type;

    #[test]
    fn test_rar_roundtrip() {
        let req = ReAuthRequest {
            session_id: "example.com;1;2".to_string(),
            origin_host: Identity::from_str("server.example.com"),
            origin_realm: Identity::from_str("example.com"),
            destination_realm: Identity::from_str("example.com"),
            destination_host: Identity::from_str("client.example.com"),
            auth_application_id: 4,
            re_auth_request_type: re_auth_request_type::AUTHORIZE_ONLY,
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = ReAuthRequest::try_from(decoded).unwrap();
        assert_eq!(back.session_id, "example.com;1;2");
        assert_eq!(back.auth_application_id, 4);
    }

    #[test]
    fn test_raa_roundtrip() {
        let ans = ReAuthAnswer {
            session_id: "example.com;1;2".to_string(),
            result_code: 2001,
            origin_host: Identity::from_str("client.example.com"),
            origin_realm: Identity::from_str("example.com"),
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = ReAuthAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
    }
}
