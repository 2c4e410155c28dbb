//! Named constants for application ids, command codes, AVP codes, vendor
//! ids and enumerated AVP values used by the base protocol and the
//! Credit-Control application. Not the full IANA/3GPP registry -- only
//! what `commands` models as typed structs.

/// Application-Id values (RFC 6733 section 2.4, RFC 4006 section 1).
pub mod application_id {
    pub const COMMON: u32 = 0;
    pub const ACCOUNTING: u32 = 3;
    pub const CREDIT_CONTROL: u32 = 4;
    pub const RELAY: u32 = 0xffff_ffff;
}

/// Command-Code values (RFC 6733 section 3, RFC 3539 section 3.4, RFC 4006
/// section 3).
pub mod command_code {
    pub const ABORT_SESSION: u32 = 274;
    pub const ACCOUNTING: u32 = 271;
    pub const CAPABILITIES_EXCHANGE: u32 = 257;
    pub const CREDIT_CONTROL: u32 = 272;
    pub const DEVICE_WATCHDOG: u32 = 280;
    pub const DISCONNECT_PEER: u32 = 282;
    pub const RE_AUTH: u32 = 258;
    pub const SESSION_TERMINATE: u32 = 275;
}

/// Vendor-Id values referenced by the worked examples.
pub mod vendor_id {
    pub const TGPP: u32 = 10415;
}

/// AVP codes used by typed command structs.
pub mod avp_code {
    pub const USER_NAME: u32 = 1;
    pub const SESSION_TIMEOUT: u32 = 27;
    pub const HOST_IP_ADDRESS: u32 = 257;
    pub const AUTH_APPLICATION_ID: u32 = 258;
    pub const ACCT_APPLICATION_ID: u32 = 259;
    pub const VENDOR_SPECIFIC_APPLICATION_ID: u32 = 260;
    pub const SESSION_ID: u32 = 263;
    pub const ORIGIN_HOST: u32 = 264;
    pub const SUPPORTED_VENDOR_ID: u32 = 265;
    pub const VENDOR_ID: u32 = 266;
    pub const FIRMWARE_REVISION: u32 = 267;
    pub const RESULT_CODE: u32 = 268;
    pub const PRODUCT_NAME: u32 = 269;
    pub const DISCONNECT_CAUSE: u32 = 273;
    pub const AUTH_SESSION_STATE: u32 = 277;
    pub const ORIGIN_STATE_ID: u32 = 278;
    pub const FAILED_AVP: u32 = 279;
    pub const ERROR_MESSAGE: u32 = 281;
    pub const DESTINATION_REALM: u32 = 283;
    pub const RE_AUTH_REQUEST_TYPE: u32 = 285;
    pub const DESTINATION_HOST: u32 = 293;
    pub const ERROR_REPORTING_HOST: u32 = 294;
    pub const TERMINATION_CAUSE: u32 = 295;
    pub const ORIGIN_REALM: u32 = 296;
    pub const INBAND_SECURITY_ID: u32 = 299;

    pub const CC_REQUEST_NUMBER: u32 = 415;
    pub const CC_REQUEST_TYPE: u32 = 416;
    pub const SUBSCRIPTION_ID: u32 = 443;
    pub const SUBSCRIPTION_ID_DATA: u32 = 444;
    pub const SUBSCRIPTION_ID_TYPE: u32 = 450;
    pub const GRANTED_SERVICE_UNIT: u32 = 431;
    pub const REQUESTED_SERVICE_UNIT: u32 = 437;
    pub const USED_SERVICE_UNIT: u32 = 446;
    pub const MULTIPLE_SERVICES_CREDIT_CONTROL: u32 = 456;
    pub const CC_TOTAL_OCTETS: u32 = 421;
    pub const CC_INPUT_OCTETS: u32 = 412;
    pub const CC_OUTPUT_OCTETS: u32 = 414;
    pub const CC_TIME: u32 = 420;
    pub const RATING_GROUP: u32 = 432;
    pub const SERVICE_CONTEXT_ID: u32 = 461;
}

/// Result-Code values (RFC 6733 section 7.1).
pub mod result_code {
    pub const DIAMETER_MULTI_ROUND_AUTH: u32 = 1001;

    pub const DIAMETER_SUCCESS: u32 = 2001;
    pub const DIAMETER_LIMITED_SUCCESS: u32 = 2002;

    pub const DIAMETER_COMMAND_UNSUPPORTED: u32 = 3001;
    pub const DIAMETER_UNABLE_TO_DELIVER: u32 = 3002;
    pub const DIAMETER_REALM_NOT_SERVED: u32 = 3003;
    pub const DIAMETER_TOO_BUSY: u32 = 3004;
    pub const DIAMETER_LOOP_DETECTED: u32 = 3005;
    pub const DIAMETER_REDIRECT_INDICATION: u32 = 3006;
    pub const DIAMETER_APPLICATION_UNSUPPORTED: u32 = 3007;
    pub const DIAMETER_INVALID_HDR_BITS: u32 = 3008;
    pub const DIAMETER_INVALID_AVP_BITS: u32 = 3009;
    pub const DIAMETER_UNKNOWN_PEER: u32 = 3010;

    pub const DIAMETER_AUTHENTICATION_REJECTED: u32 = 4001;
    pub const DIAMETER_OUT_OF_SPACE: u32 = 4002;
    pub const ELECTION_LOST: u32 = 4003;

    pub const DIAMETER_AVP_UNSUPPORTED: u32 = 5001;
    pub const DIAMETER_UNKNOWN_SESSION_ID: u32 = 5002;
    pub const DIAMETER_AUTHORIZATION_REJECTED: u32 = 5003;
    pub const DIAMETER_INVALID_AVP_VALUE: u32 = 5004;
    pub const DIAMETER_MISSING_AVP: u32 = 5005;
    pub const DIAMETER_RESOURCES_EXCEEDED: u32 = 5006;
    pub const DIAMETER_CONTRADICTING_AVPS: u32 = 5007;
    pub const DIAMETER_AVP_NOT_ALLOWED: u32 = 5008;
    pub const DIAMETER_AVP_OCCURS_TOO_MANY_TIMES: u32 = 5009;
    pub const DIAMETER_NO_COMMON_APPLICATION: u32 = 5010;
    pub const DIAMETER_UNSUPPORTED_VERSION: u32 = 5011;
    pub const DIAMETER_UNABLE_TO_COMPLY: u32 = 5012;
    pub const DIAMETER_INVALID_BIT_IN_HEADER: u32 = 5013;
    pub const DIAMETER_INVALID_AVP_LENGTH: u32 = 5014;
    pub const DIAMETER_INVALID_MESSAGE_LENGTH: u32 = 5015;
    pub const DIAMETER_INVALID_AVP_BIT_COMBO: u32 = 5016;
    pub const DIAMETER_NO_COMMON_SECURITY: u32 = 5017;

    /// Whether a Result-Code indicates the request succeeded (2xxx).
    pub fn is_success(code: u32) -> bool {
        (2000..3000).contains(&code)
    }

    /// Whether a Result-Code is a protocol error that a relay may retry
    /// against a different peer (3xxx).
    pub fn is_protocol_error(code: u32) -> bool {
        (3000..4000).contains(&code)
    }
}

/// CC-Request-Type enumerated values (RFC 4006 section 8.3).
pub mod cc_request_type {
    pub const INITIAL_REQUEST: i32 = 1;
    pub const UPDATE_REQUEST: i32 = 2;
    pub const TERMINATION_REQUEST: i32 = 3;
    pub const EVENT_REQUEST: i32 = 4;
}

/// Termination-Cause enumerated values (RFC 6733 section 8.15).
pub mod termination_cause {
    pub const DIAMETER_LOGOUT: i32 = 1;
    pub const DIAMETER_SERVICE_NOT_PROVIDED: i32 = 2;
    pub const DIAMETER_BAD_ANSWER: i32 = 3;
    pub const DIAMETER_ADMINISTRATIVE: i32 = 4;
    pub const DIAMETER_LINK_BROKEN: i32 = 5;
    pub const DIAMETER_AUTH_EXPIRED: i32 = 6;
    pub const DIAMETER_USER_MOVED: i32 = 7;
    pub const DIAMETER_SESSION_TIMEOUT: i32 = 8;
}

/// Disconnect-Cause enumerated values (RFC 6733 section 5.4.3).
pub mod disconnect_cause {
    pub const REBOOTING: i32 = 0;
    pub const BUSY: i32 = 1;
    pub const DO_NOT_WANT_TO_TALK_TO_YOU: i32 = 2;
}

/// Re-Auth-Request-Type enumerated values (RFC 6733 section 8.7).
pub mod re_auth_request_type {
    pub const AUTHORIZE_ONLY: i32 = 0;
    pub const AUTHORIZE_AUTHENTICATE: i32 = 1;
}

/// Auth-Session-State enumerated values (RFC 6733 section 8.11).
pub mod auth_session_state {
    pub const STATE_MAINTAINED: i32 = 0;
    pub const NO_STATE_MAINTAINED: i32 = 1;
}

/// Subscription-Id-Type enumerated values (RFC 4006 section 8.46).
pub mod subscription_id_type {
    pub const END_USER_E164: i32 = 0;
    pub const END_USER_IMSI: i32 = 1;
    pub const END_USER_SIP_URI: i32 = 2;
    pub const END_USER_NAI: i32 = 3;
    pub const END_USER_PRIVATE: i32 = 4;
}

#[cfg(test)]
mod tests {
    use super::result_code::*;

    #[test]
    fn test_is_success() {
        assert!(is_success(DIAMETER_SUCCESS));
        assert!(!is_success(DIAMETER_UNABLE_TO_COMPLY));
    }

    #[test]
    fn test_is_protocol_error() {
        assert!(is_protocol_error(DIAMETER_TOO_BUSY));
        assert!(!is_protocol_error(DIAMETER_SUCCESS));
    }
}
