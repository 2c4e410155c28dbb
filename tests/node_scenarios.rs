//! End-to-end scenarios over real loopback TCP connections: capabilities
//! exchange, a Credit-Control round trip, watchdog keep-alive, request
//! timeout, election, and the application-unsupported answer path.

use diameter::avp::Identity;
use diameter::commands::{CreditControlAnswer, CreditControlRequest};
use diameter::constants::{application_id, cc_request_type, result_code, subscription_id_type};
use diameter::node::application::{PeerHandle, ThreadPerRequestApplication};
use diameter::node::peer::{elect, Peer};
use diameter::node::router::Router;
use diameter::node::{Node, NodeConfig};
use diameter::{DiameterMessage, Error};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn node_config(host: &str) -> NodeConfig {
    NodeConfig {
        origin_host: host.to_string(),
        origin_realm: "test".to_string(),
        vendor_id: 10415,
        product_name: "diameter-rs".to_string(),
        ..Default::default()
    }
}

/// Polls the router for `host` for a brief window: the peer is registered
/// on the accept side slightly after the CEA bytes reach the dialer, so the
/// dialer observing an open connection doesn't guarantee the listener's
/// router has added the peer yet.
async fn wait_for_peer(router: &Router, host: &Identity) -> Arc<Peer> {
    for _ in 0..200 {
        if let Some(peer) = router.peer(host) {
            return peer;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("peer {} never registered", host);
}

async fn connected_pair(server_host: &str, client_host: &str) -> (Arc<Node>, Arc<Node>, Arc<PeerHandle>) {
    let server = Arc::new(Node::new(node_config(server_host)));
    let addr = server.listen_background("127.0.0.1:0").await.unwrap();

    let client = Arc::new(Node::new(node_config(client_host)));
    client.connect(&addr.to_string()).await.unwrap();

    let peer = client
        .router()
        .peer(&Identity::from_str(server_host))
        .expect("peer registered after connect");
    let handle = Arc::new(PeerHandle::new(peer));
    handle.wait_for_ready().await;

    (server, client, handle)
}

#[tokio::test]
async fn capabilities_exchange_succeeds_and_both_sides_open() {
    let (server, client, handle) = connected_pair("s.test", "c.test").await;

    assert!(handle.state().is_open());
    let server_side_peer = wait_for_peer(&server.router(), &Identity::from_str("c.test")).await;
    assert!(server_side_peer.state().is_open());

    drop(client);
}

#[tokio::test]
async fn credit_control_event_request_round_trips() {
    let (server, client, handle) = connected_pair("s.test", "c.test").await;

    let app = ThreadPerRequestApplication::new(application_id::CREDIT_CONTROL, |req: DiameterMessage| async move {
        let ccr = CreditControlRequest::try_from(req)?;
        Ok(CreditControlAnswer {
            session_id: ccr.session_id,
            result_code: result_code::DIAMETER_SUCCESS,
            origin_host: Identity::from_str("s.test"),
            origin_realm: Identity::from_str("test"),
            cc_request_type: ccr.cc_request_type,
            cc_request_number: ccr.cc_request_number,
            multiple_services_credit_control: Vec::new(),
            additional_avps: Vec::new(),
        }
        .into())
    });
    server.router().register_application(Arc::new(app));

    let req = CreditControlRequest {
        session_id: "c.test;1;2;3".to_string(),
        origin_host: Identity::from_str("c.test"),
        origin_realm: Identity::from_str("test"),
        destination_realm: Identity::from_str("test"),
        service_context_id: "32274@3gpp.org".to_string(),
        cc_request_type: cc_request_type::EVENT_REQUEST,
        cc_request_number: 1,
        destination_host: None,
        subscription_ids: vec![diameter::commands::credit_control::SubscriptionId {
            subscription_id_type: subscription_id_type::END_USER_E164,
            subscription_id_data: "41780000001".to_string(),
        }],
        multiple_services_credit_control: Vec::new(),
        additional_avps: Vec::new(),
    };
    let mut msg: DiameterMessage = req.into();
    msg.header.application_id = application_id::CREDIT_CONTROL;

    let answer = handle.send_request(msg, Duration::from_secs(5)).await.unwrap();
    let cca = CreditControlAnswer::try_from(answer).unwrap();

    assert_eq!(cca.session_id, "c.test;1;2;3");
    assert_eq!(cca.result_code, result_code::DIAMETER_SUCCESS);
    assert_eq!(cca.cc_request_type, cc_request_type::EVENT_REQUEST);
    assert_eq!(cca.cc_request_number, 1);
}

#[tokio::test]
async fn watchdog_keeps_idle_peer_open() {
    let server = Arc::new(Node::new(NodeConfig {
        watchdog_interval: Duration::from_millis(150),
        watchdog_answer_timeout: Duration::from_millis(500),
        ..node_config("s.test")
    }));
    let addr = server.listen_background("127.0.0.1:0").await.unwrap();

    let client = Arc::new(Node::new(NodeConfig {
        watchdog_interval: Duration::from_millis(150),
        watchdog_answer_timeout: Duration::from_millis(500),
        ..node_config("c.test")
    }));
    client.connect(&addr.to_string()).await.unwrap();

    let peer = client.router().peer(&Identity::from_str("s.test")).unwrap();
    let handle = Arc::new(PeerHandle::new(peer));
    handle.wait_for_ready().await;

    // No application traffic for several watchdog intervals; only DWR/DWA
    // keeps the connection alive.
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(handle.state().is_open());
    let server_side_peer = server.router().peer(&Identity::from_str("c.test")).unwrap();
    assert!(server_side_peer.state().is_open());
}

#[tokio::test]
async fn client_request_times_out_and_outstanding_table_is_cleared() {
    // A bare listener that accepts the CER but never answers application
    // requests, so the client's CCR never gets a reply.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _cer = diameter::node::connection::read_message(&mut stream).await.unwrap();
        let cea = diameter::commands::CapabilitiesExchangeAnswer::new(result_code::DIAMETER_SUCCESS, "black-hole.test", "test", 0, "black-hole");
        diameter::node::connection::write_message(&mut stream, &cea.into()).await.unwrap();
        // Hold the connection open but never answer anything else.
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client = Arc::new(Node::new(node_config("c.test")));
    client.connect(&addr.to_string()).await.unwrap();
    let peer = client.router().peer(&Identity::from_str("black-hole.test")).unwrap();
    let handle = Arc::new(PeerHandle::new(peer.clone()));
    handle.wait_for_ready().await;

    let req = DiameterMessage::new(272, application_id::CREDIT_CONTROL, diameter::flags::REQUEST, 0, 0);
    let started = Instant::now();
    let result = handle.send_request(req, Duration::from_secs(1)).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(Error::Timeout)));
    assert!(elapsed >= Duration::from_millis(900) && elapsed <= Duration::from_millis(1500));
    assert_eq!(peer.outstanding_len().await, 0);
}

#[tokio::test]
async fn election_resolves_the_same_way_from_both_sides() {
    let a = Identity::from_str("aaa.test");
    let b = Identity::from_str("bbb.test");

    // From A's perspective A is local; from B's perspective B is local.
    // RFC 6733 5.6.4: the host with the lexicographically greater
    // Origin-Host keeps the connection it initiated.
    use diameter::node::peer::Keep;
    assert_eq!(elect(&a, &b), Keep::Remote);
    assert_eq!(elect(&b, &a), Keep::Local);
}

#[tokio::test]
async fn shutdown_sends_dpr_and_closes_both_sides() {
    let (server, client, handle) = connected_pair("s.test", "c.test").await;

    client.shutdown(Duration::from_secs(5)).await;

    assert!(!handle.state().is_open());
    assert!(client.router().peer(&Identity::from_str("s.test")).is_none());

    // The server observes the DPR and tears its side down too.
    for _ in 0..200 {
        if server.router().peer(&Identity::from_str("c.test")).is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(server.router().peer(&Identity::from_str("c.test")).is_none());
}

#[tokio::test]
async fn unregistered_application_gets_3007_answer() {
    let (_server, _client, handle) = connected_pair("s.test", "c.test").await;

    // No Credit-Control application registered on the server.
    let req = DiameterMessage::new(272, application_id::CREDIT_CONTROL, diameter::flags::REQUEST, 0, 0);
    let answer = handle.send_request(req, Duration::from_secs(5)).await.unwrap();

    let result_code = answer
        .get_avp(diameter::constants::avp_code::RESULT_CODE, None)
        .and_then(|a| a.as_unsigned32())
        .unwrap();
    assert_eq!(result_code, diameter::constants::result_code::DIAMETER_APPLICATION_UNSUPPORTED);
    assert_eq!(answer.header.flags & diameter::flags::REQUEST, 0);
}
