use crate::avp::{Avp, Enumerated, Grouped, Identity, UTF8String, Unsigned32, Unsigned64};
use crate::constants::{avp_code, command_code};
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};

/// A CC-Service-Unit grouped AVP (Granted-/Requested-/Used-Service-Unit,
/// RFC 4006 sections 8.17-8.19/8.21). All fields optional since only a
/// subset is meaningful per direction.
#[derive(Debug, Clone, Default)]
pub struct ServiceUnit {
    pub cc_time: Option<u32>,
    pub cc_total_octets: Option<u64>,
    pub cc_input_octets: Option<u64>,
    pub cc_output_octets: Option<u64>,
}

impl ServiceUnit {
    fn from_grouped(g: &Grouped) -> ServiceUnit {
        ServiceUnit {
            cc_time: g.find(avp_code::CC_TIME, None).and_then(|a| a.as_unsigned32()),
            cc_total_octets: g
                .find(avp_code::CC_TOTAL_OCTETS, None)
                .and_then(|a| a.as_unsigned64()),
            cc_input_octets: g
                .find(avp_code::CC_INPUT_OCTETS, None)
                .and_then(|a| a.as_unsigned64()),
            cc_output_octets: g
                .find(avp_code::CC_OUTPUT_OCTETS, None)
                .and_then(|a| a.as_unsigned64()),
        }
    }

    fn into_grouped(self) -> Grouped {
        let mut g = Grouped::new(Vec::new());
        if let Some(v) = self.cc_time {
            g.add(crate::avp!(avp_code::CC_TIME, None, Unsigned32::new(v)));
        }
        if let Some(v) = self.cc_total_octets {
            g.add(crate::avp!(avp_code::CC_TOTAL_OCTETS, None, Unsigned64::new(v)));
        }
        if let Some(v) = self.cc_input_octets {
            g.add(crate::avp!(avp_code::CC_INPUT_OCTETS, None, Unsigned64::new(v)));
        }
        if let Some(v) = self.cc_output_octets {
            g.add(crate::avp!(avp_code::CC_OUTPUT_OCTETS, None, Unsigned64::new(v)));
        }
        g
    }
}

/// Multiple-Services-Credit-Control grouped AVP (RFC 4006 section 8.16).
#[derive(Debug, Clone, Default)]
pub struct MultipleServicesCreditControl {
    pub rating_group: Option<u32>,
    pub requested_service_unit: Option<ServiceUnit>,
    pub granted_service_unit: Option<ServiceUnit>,
    pub used_service_unit: Option<ServiceUnit>,
}

impl MultipleServicesCreditControl {
    fn from_grouped(g: &Grouped) -> MultipleServicesCreditControl {
        MultipleServicesCreditControl {
            rating_group: g.find(avp_code::RATING_GROUP, None).and_then(|a| a.as_unsigned32()),
            requested_service_unit: g
                .find(avp_code::REQUESTED_SERVICE_UNIT, None)
                .and_then(|a| a.as_grouped())
                .map(ServiceUnit::from_grouped),
            granted_service_unit: g
                .find(avp_code::GRANTED_SERVICE_UNIT, None)
                .and_then(|a| a.as_grouped())
                .map(ServiceUnit::from_grouped),
            used_service_unit: g
                .find(avp_code::USED_SERVICE_UNIT, None)
                .and_then(|a| a.as_grouped())
                .map(ServiceUnit::from_grouped),
        }
    }

    fn into_grouped(self) -> Grouped {
        let mut g = Grouped::new(Vec::new());
        if let Some(v) = self.rating_group {
            g.add(crate::avp!(avp_code::RATING_GROUP, None, Unsigned32::new(v)));
        }
        if let Some(unit) = self.requested_service_unit {
            g.add(crate::avp!(avp_code::REQUESTED_SERVICE_UNIT, None, unit.into_grouped()));
        }
        if let Some(unit) = self.granted_service_unit {
            g.add(crate::avp!(avp_code::GRANTED_SERVICE_UNIT, None, unit.into_grouped()));
        }
        if let Some(unit) = self.used_service_unit {
            g.add(crate::avp!(avp_code::USED_SERVICE_UNIT, None, unit.into_grouped()));
        }
        g
    }
}

/// Subscription-Id grouped AVP (RFC 4006 section 8.46).
#[derive(Debug, Clone)]
pub struct SubscriptionId {
    pub subscription_id_type: i32,
    pub subscription_id_data: String,
}

impl SubscriptionId {
    fn from_grouped(g: &Grouped) -> Option<SubscriptionId> {
        let subscription_id_type = g.find(avp_code::SUBSCRIPTION_ID_TYPE, None).and_then(|a| a.as_enumerated())?;
        let subscription_id_data = g
            .find(avp_code::SUBSCRIPTION_ID_DATA, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)?;
        Some(SubscriptionId {
            subscription_id_type,
            subscription_id_data,
        })
    }

    fn into_grouped(self) -> Grouped {
        let mut g = Grouped::new(Vec::new());
        g.add(crate::avp!(
            avp_code::SUBSCRIPTION_ID_TYPE,
            None,
            Enumerated::new(self.subscription_id_type)
        ));
        g.add(crate::avp!(
            avp_code::SUBSCRIPTION_ID_DATA,
            None,
            UTF8String::new(self.subscription_id_data)
        ));
        g
    }
}

/// Credit-Control-Request (RFC 4006 section 3.1).
#[derive(Debug, Clone)]
pub struct CreditControlRequest {
    pub session_id: String,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub destination_realm: Identity,
    pub service_context_id: String,
    pub cc_request_type: i32,
    pub cc_request_number: u32,
    pub destination_host: Option<Identity>,
    pub subscription_ids: Vec<SubscriptionId>,
    pub multiple_services_credit_control: Vec<MultipleServicesCreditControl>,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for CreditControlRequest {
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
        let service_context_id = msg
            .get_avp(avp_code::SERVICE_CONTEXT_ID, None)
            .and_then(|a| a.as_utf8string())
            .map(str::to_string)
            .ok_or(Error::MissingAvp(avp_code::SERVICE_CONTEXT_ID))?;
        let cc_request_type = msg
            .get_avp(avp_code::CC_REQUEST_TYPE, None)
            .and_then(|a| a.as_enumerated())
            .ok_or(Error::MissingAvp(avp_code::CC_REQUEST_TYPE))?;
        let cc_request_number = msg
            .get_avp(avp_code::CC_REQUEST_NUMBER, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::CC_REQUEST_NUMBER))?;
        let destination_host = msg
            .get_avp(avp_code::DESTINATION_HOST, None)
            .and_then(|a| a.as_identity())
            .cloned();

        let subscription_ids = msg
            .get_avps(avp_code::SUBSCRIPTION_ID, None)
            .into_iter()
            .filter_map(|a| a.as_grouped())
            .filter_map(SubscriptionId::from_grouped)
            .collect();
        let multiple_services_credit_control = msg
            .get_avps(avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL, None)
            .into_iter()
            .filter_map(|a| a.as_grouped())
            .map(MultipleServicesCreditControl::from_grouped)
            .collect();

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::DESTINATION_REALM,
            avp_code::SERVICE_CONTEXT_ID,
            avp_code::CC_REQUEST_TYPE,
            avp_code::CC_REQUEST_NUMBER,
            avp_code::DESTINATION_HOST,
            avp_code::SUBSCRIPTION_ID,
            avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(CreditControlRequest {
            session_id,
            origin_host,
            origin_realm,
            destination_realm,
            service_context_id,
            cc_request_type,
            cc_request_number,
            destination_host,
            subscription_ids,
            multiple_services_credit_control,
            additional_avps,
        })
    }
}

impl From<CreditControlRequest> for DiameterMessage {
    fn from(req: CreditControlRequest) -> Self {
        let mut msg = DiameterMessage::new(
            command_code::CREDIT_CONTROL,
            4 as ApplicationId,
            flags::REQUEST,
            0,
            0,
        );
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(req.session_id)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, req.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, req.origin_realm));
        msg.add_avp(crate::avp!(avp_code::DESTINATION_REALM, None, req.destination_realm));
        msg.add_avp(crate::avp!(
            avp_code::SERVICE_CONTEXT_ID,
            None,
            UTF8String::new(req.service_context_id)
        ));
        msg.add_avp(crate::avp!(
            avp_code::CC_REQUEST_TYPE,
            None,
            Enumerated::new(req.cc_request_type)
        ));
        msg.add_avp(crate::avp!(
            avp_code::CC_REQUEST_NUMBER,
            None,
            Unsigned32::new(req.cc_request_number)
        ));
        if let Some(host) = req.destination_host {
            msg.add_avp(crate::avp!(avp_code::DESTINATION_HOST, None, host));
        }
        for sub in req.subscription_ids {
            msg.add_avp(crate::avp!(avp_code::SUBSCRIPTION_ID, None, sub.into_grouped()));
        }
        for mscc in req.multiple_services_credit_control {
            msg.add_avp(crate::avp!(
                avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL,
                None,
                mscc.into_grouped()
            ));
        }
        for avp in req.additional_avps {
            msg.add_avp(avp);
        }
        msg
    }
}

/// Credit-Control-Answer (RFC 4006 section 3.2).
#[derive(Debug, Clone)]
pub struct CreditControlAnswer {
    pub session_id: String,
    pub result_code: u32,
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub cc_request_type: i32,
    pub cc_request_number: u32,
    pub multiple_services_credit_control: Vec<MultipleServicesCreditControl>,
    pub additional_avps: Vec<Avp>,
}

impl TryFrom<DiameterMessage> for CreditControlAnswer {
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
        let cc_request_type = msg
            .get_avp(avp_code::CC_REQUEST_TYPE, None)
            .and_then(|a| a.as_enumerated())
            .ok_or(Error::MissingAvp(avp_code::CC_REQUEST_TYPE))?;
        let cc_request_number = msg
            .get_avp(avp_code::CC_REQUEST_NUMBER, None)
            .and_then(|a| a.as_unsigned32())
            .ok_or(Error::MissingAvp(avp_code::CC_REQUEST_NUMBER))?;

        let multiple_services_credit_control = msg
            .get_avps(avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL, None)
            .into_iter()
            .filter_map(|a| a.as_grouped())
            .map(MultipleServicesCreditControl::from_grouped)
            .collect();

        let known_codes = [
            avp_code::SESSION_ID,
            avp_code::RESULT_CODE,
            avp_code::ORIGIN_HOST,
            avp_code::ORIGIN_REALM,
            avp_code::CC_REQUEST_TYPE,
            avp_code::CC_REQUEST_NUMBER,
            avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL,
        ];
        let additional_avps = msg
            .avps
            .into_iter()
            .filter(|a| !known_codes.contains(&a.code()))
            .collect();

        Ok(CreditControlAnswer {
            session_id,
            result_code,
            origin_host,
            origin_realm,
            cc_request_type,
            cc_request_number,
            multiple_services_credit_control,
            additional_avps,
        })
    }
}

impl From<CreditControlAnswer> for DiameterMessage {
    fn from(ans: CreditControlAnswer) -> Self {
        let mut msg = DiameterMessage::new(command_code::CREDIT_CONTROL, 4, 0, 0, 0);
        msg.add_avp(crate::avp!(avp_code::SESSION_ID, None, UTF8String::new(ans.session_id)));
        msg.add_avp(crate::avp!(avp_code::RESULT_CODE, None, Unsigned32::new(ans.result_code)));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, ans.origin_host));
        msg.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, ans.origin_realm));
        msg.add_avp(crate::avp!(
            avp_code::CC_REQUEST_TYPE,
            None,
            Enumerated::new(ans.cc_request_type)
        ));
        msg.add_avp(crate::avp!(
            avp_code::CC_REQUEST_NUMBER,
            None,
            Unsigned32::new(ans.cc_request_number)
        ));
        for mscc in ans.multiple_services_credit_control {
            msg.add_avp(crate::avp!(
                avp_code::MULTIPLE_SERVICES_CREDIT_CONTROL,
                None,
                mscc.into_grouped()
            ));
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
    use crate::constants::cc_request_type;

    fn sample_request() -> CreditControlRequest {
        CreditControlRequest {
            session_id: "client.example.com;1;2".to_string(),
            origin_host: Identity::from_str("client.example.com"),
            origin_realm: Identity::from_str("example.com"),
            destination_realm: Identity::from_str("example.com"),
            service_context_id: "voice@example.com".to_string(),
            cc_request_type: cc_request_type::EVENT_REQUEST,
            cc_request_number: 0,
            destination_host: None,
            subscription_ids: vec![SubscriptionId {
                subscription_id_type: crate::constants::subscription_id_type::END_USER_E164,
                subscription_id_data: "15551234".to_string(),
            }],
            multiple_services_credit_control: vec![MultipleServicesCreditControl {
                rating_group: Some(100),
                requested_service_unit: Some(ServiceUnit {
                    cc_time: Some(60),
                    ..Default::default()
                }),
                granted_service_unit: None,
                used_service_unit: None,
            }],
            additional_avps: Vec::new(),
        }
    }

    #[test]
    fn test_ccr_event_roundtrip() {
        let req = sample_request();
        let msg: DiameterMessage = req.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = CreditControlRequest::try_from(decoded).unwrap();

        assert_eq!(back.cc_request_type, cc_request_type::EVENT_REQUEST);
        assert_eq!(back.subscription_ids.len(), 1);
        assert_eq!(back.subscription_ids[0].subscription_id_data, "15551234");
        assert_eq!(back.multiple_services_credit_control.len(), 1);
        let mscc = &back.multiple_services_credit_control[0];
        assert_eq!(mscc.rating_group, Some(100));
        assert_eq!(mscc.requested_service_unit.as_ref().unwrap().cc_time, Some(60));
    }

    #[test]
    fn test_cca_roundtrip() {
        let ans = CreditControlAnswer {
            session_id: "client.example.com;1;2".to_string(),
            result_code: 2001,
            origin_host: Identity::from_str("server.example.com"),
            origin_realm: Identity::from_str("example.com"),
            cc_request_type: cc_request_type::EVENT_REQUEST,
            cc_request_number: 0,
            multiple_services_credit_control: vec![MultipleServicesCreditControl {
                rating_group: Some(100),
                requested_service_unit: None,
                granted_service_unit: Some(ServiceUnit {
                    cc_time: Some(3600),
                    ..Default::default()
                }),
                used_service_unit: None,
            }],
            additional_avps: Vec::new(),
        };
        let msg: DiameterMessage = ans.into();
        let bytes = msg.as_bytes().unwrap();
        let decoded = DiameterMessage::from_bytes(&bytes).unwrap();
        let back = CreditControlAnswer::try_from(decoded).unwrap();
        assert_eq!(back.result_code, 2001);
        assert_eq!(
            back.multiple_services_credit_control[0]
                .granted_service_unit
                .as_ref()
                .unwrap()
                .cc_time,
            Some(3600)
        );
    }
}
