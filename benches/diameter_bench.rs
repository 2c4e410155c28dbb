#![feature(test)]

extern crate test;
use diameter::avp::flags::M;
use diameter::avp::{Enumerated, Grouped, Identity, UTF8String, Unsigned32};
use diameter::diameter::flags;
use diameter::{DiameterHeader, DiameterMessage};
use std::io::Cursor;
use test::black_box;
use test::Bencher;

#[bench]
fn bench_decode_header(b: &mut Bencher) {
    let data = test_data();
    b.iter(|| {
        let mut cursor = Cursor::new(&data);
        black_box(DiameterHeader::decode_from(&mut cursor).unwrap())
    });
}

#[bench]
fn bench_encode_header(b: &mut Bencher) {
    let data = test_data();
    let mut cursor = Cursor::new(&data);
    let header = DiameterHeader::decode_from(&mut cursor).unwrap();

    let mut encoded = Vec::new();
    b.iter(|| {
        encoded.clear();
        black_box(header.encode_to(&mut encoded).unwrap());
    });
}

#[bench]
fn bench_decode_message(b: &mut Bencher) {
    let data = test_data_2();
    b.iter(|| black_box(DiameterMessage::from_bytes(&data).unwrap()));
}

#[bench]
fn bench_encode_message(b: &mut Bencher) {
    let data = test_data_2();
    let message = DiameterMessage::from_bytes(&data).unwrap();

    let mut encoded = Vec::new();
    b.iter(|| {
        encoded.clear();
        black_box(message.encode_to(&mut encoded).unwrap());
    });
}

#[bench]
fn bench_decode_cca(b: &mut Bencher) {
    let message = cca_message();
    let data = message.as_bytes().unwrap();

    b.iter(|| black_box(DiameterMessage::from_bytes(&data).unwrap()));
}

#[bench]
fn bench_encode_cca(b: &mut Bencher) {
    let message = cca_message();
    let mut encoded = Vec::new();
    b.iter(|| {
        encoded.clear();
        black_box(message.encode_to(&mut encoded).unwrap());
    });
}

fn test_data() -> &'static [u8] {
    return &[
        0x01, 0x00, 0x00, 0x14, // version, length
        0x80, 0x00, 0x01, 0x10, // flags, code
        0x00, 0x00, 0x00, 0x04, // application_id
        0x00, 0x00, 0x00, 0x03, // hop_by_hop_id
        0x00, 0x00, 0x00, 0x04, // end_to_end_id
    ];
}

fn test_data_2() -> &'static [u8] {
    return &[
        0x01, 0x00, 0x00, 0x34, // version, length
        0x80, 0x00, 0x01, 0x10, // flags, code
        0x00, 0x00, 0x00, 0x04, // application_id
        0x00, 0x00, 0x00, 0x03, // hop_by_hop_id
        0x00, 0x00, 0x00, 0x04, // end_to_end_id
        0x00, 0x00, 0x01, 0x9F, // avp code
        0x40, 0x00, 0x00, 0x0C, // flags, length
        0x00, 0x00, 0x04, 0xB0, // value
        0x00, 0x00, 0x00, 0x1E, // avp code
        0x00, 0x00, 0x00, 0x12, // flags, length
        0x66, 0x6F, 0x6F, 0x62, // value
        0x61, 0x72, 0x31, 0x32, // value
        0x33, 0x34, 0x00, 0x00,
    ];
}

fn cca_message() -> DiameterMessage {
    let mut message = DiameterMessage::new(272, 4, flags::REQUEST | flags::PROXYABLE, 1123158610, 3102381851);

    message.add_avp(diameter::avp!(264, None, M, Identity::from_str("host.example.com")));
    message.add_avp(diameter::avp!(296, None, M, Identity::from_str("realm.example.com")));
    message.add_avp(diameter::avp!(263, None, M, UTF8String::new("ses;12345888")));
    message.add_avp(diameter::avp!(268, None, M, Unsigned32::new(2001)));
    message.add_avp(diameter::avp!(416, None, M, Enumerated::new(1)));
    message.add_avp(diameter::avp!(415, None, M, Unsigned32::new(1000)));

    let mut ps_information = Grouped::new(vec![]);
    ps_information.add(diameter::avp!(30, None, M, UTF8String::new("10999")));
    let mut service_information = Grouped::new(vec![]);
    service_information.add(diameter::avp!(874, Some(10415), M, ps_information));

    message.add_avp(diameter::avp!(873, Some(10415), M, service_information));
    message
}

fn main() {}
