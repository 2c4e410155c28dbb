use diameter::commands::{CreditControlAnswer, CreditControlRequest};
use diameter::constants::{application_id, cc_request_type};
use diameter::node::application::PeerHandle;
use diameter::node::{Node, NodeConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let node = Arc::new(Node::new(NodeConfig {
        origin_host: "client.example.com".to_string(),
        origin_realm: "example.com".to_string(),
        vendor_id: 35838,
        product_name: "diameter-rs".to_string(),
        ..Default::default()
    }));

    node.connect("localhost:3868").await.unwrap();

    let peer = node
        .router()
        .peer(&diameter::avp::Identity::from_str("server.example.com"))
        .expect("peer registered after connect");
    let handle = PeerHandle::new(peer);
    handle.wait_for_ready().await;

    send_ccr(&handle).await;
}

async fn send_ccr(handle: &PeerHandle) {
    let req = CreditControlRequest {
        session_id: "client.example.com;12345888".to_string(),
        origin_host: diameter::avp::Identity::from_str("client.example.com"),
        origin_realm: diameter::avp::Identity::from_str("example.com"),
        destination_realm: diameter::avp::Identity::from_str("example.com"),
        service_context_id: "voice@example.com".to_string(),
        cc_request_type: cc_request_type::EVENT_REQUEST,
        cc_request_number: 0,
        destination_host: None,
        subscription_ids: Vec::new(),
        multiple_services_credit_control: Vec::new(),
        additional_avps: Vec::new(),
    };
    let mut msg: diameter::DiameterMessage = req.into();
    msg.header.application_id = application_id::CREDIT_CONTROL;

    let answer = handle.send_request(msg, Duration::from_secs(5)).await.unwrap();
    let cca = CreditControlAnswer::try_from(answer).unwrap();
    log::info!("Received Credit-Control-Answer, Result-Code: {}", cca.result_code);
}
