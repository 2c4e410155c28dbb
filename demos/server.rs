use diameter::avp::Identity;
use diameter::commands::{CreditControlAnswer, CreditControlRequest, MultipleServicesCreditControl, ServiceUnit};
use diameter::constants::{application_id, result_code};
use diameter::node::application::ThreadPerRequestApplication;
use diameter::node::{Node, NodeConfig};
use diameter::DiameterMessage;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let node = Arc::new(Node::new(NodeConfig {
        origin_host: "server.example.com".to_string(),
        origin_realm: "example.com".to_string(),
        vendor_id: 35838,
        product_name: "diameter-rs".to_string(),
        ..Default::default()
    }));

    let app = ThreadPerRequestApplication::new(application_id::CREDIT_CONTROL, handle_ccr);
    node.router().register_application(Arc::new(app));

    let addr = "0.0.0.0:3868";
    log::info!("Listening at {}", addr);
    node.listen(addr).await.unwrap();
}

async fn handle_ccr(req: DiameterMessage) -> diameter::Result<DiameterMessage> {
    log::info!("Received request: {:?}", req.header);

    let ccr = CreditControlRequest::try_from(req)?;

    let multiple_services_credit_control = ccr
        .multiple_services_credit_control
        .into_iter()
        .map(|req_mscc| MultipleServicesCreditControl {
            rating_group: req_mscc.rating_group,
            requested_service_unit: None,
            granted_service_unit: Some(ServiceUnit {
                cc_time: Some(7786),
                cc_total_octets: None,
                cc_input_octets: None,
                cc_output_octets: None,
            }),
            used_service_unit: None,
        })
        .collect();

    let cca = CreditControlAnswer {
        session_id: ccr.session_id,
        result_code: result_code::DIAMETER_SUCCESS,
        origin_host: Identity::from_str("server.example.com"),
        origin_realm: Identity::from_str("example.com"),
        cc_request_type: ccr.cc_request_type,
        cc_request_number: ccr.cc_request_number,
        multiple_services_credit_control,
        additional_avps: Vec::new(),
    };

    Ok(cca.into())
}
