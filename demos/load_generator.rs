use diameter::commands::{CreditControlAnswer, CreditControlRequest};
use diameter::constants::{application_id, cc_request_type};
use diameter::node::application::PeerHandle;
use diameter::node::{Node, NodeConfig};
use diameter::DiameterMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

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
    let handle = Arc::new(PeerHandle::new(peer));
    handle.wait_for_ready().await;

    let batch_size = 10;
    let mut ccri_handles: Vec<JoinHandle<String>> = Vec::with_capacity(batch_size);
    for i in 0..batch_size {
        let session_id = format!("client.example.com;{:09}", i);
        ccri_handles.push(send_ccr_i(Arc::clone(&handle), session_id));
    }

    let mut ccrt_handles = Vec::with_capacity(batch_size);
    for ccri in ccri_handles {
        let session_id = ccri.await.unwrap();
        ccrt_handles.push(send_ccr_t(Arc::clone(&handle), session_id));
    }

    for ccrt in ccrt_handles {
        ccrt.await.unwrap();
    }
}

fn send_ccr_i(handle: Arc<PeerHandle>, session_id: String) -> JoinHandle<String> {
    tokio::spawn(async move {
        log::info!("CCR-I Request sent session_id: {}", session_id);
        let msg = ccr(&session_id, cc_request_type::INITIAL_REQUEST);
        let answer = handle.send_request(msg, Duration::from_secs(5)).await.unwrap();
        let cca = CreditControlAnswer::try_from(answer).unwrap();
        log::info!(
            "CCR-I Response recv session_id: {} result_code: {}",
            cca.session_id,
            cca.result_code
        );
        cca.session_id
    })
}

fn send_ccr_t(handle: Arc<PeerHandle>, session_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!("CCR-T Request sent session_id: {}", session_id);
        let msg = ccr(&session_id, cc_request_type::TERMINATION_REQUEST);
        let answer = handle.send_request(msg, Duration::from_secs(5)).await.unwrap();
        let cca = CreditControlAnswer::try_from(answer).unwrap();
        log::info!(
            "CCR-T Response recv session_id: {} result_code: {}",
            cca.session_id,
            cca.result_code
        );
    })
}

fn ccr(session_id: &str, request_type: i32) -> DiameterMessage {
    let req = CreditControlRequest {
        session_id: session_id.to_string(),
        origin_host: diameter::avp::Identity::from_str("client.example.com"),
        origin_realm: diameter::avp::Identity::from_str("example.com"),
        destination_realm: diameter::avp::Identity::from_str("example.com"),
        service_context_id: "voice@example.com".to_string(),
        cc_request_type: request_type,
        cc_request_number: 0,
        destination_host: None,
        subscription_ids: Vec::new(),
        multiple_services_credit_control: Vec::new(),
        additional_avps: Vec::new(),
    };
    let mut msg: DiameterMessage = req.into();
    msg.header.application_id = application_id::CREDIT_CONTROL;
    msg
}
