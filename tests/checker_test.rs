//! Certificate checks against a local TLS server

use certnotify::{CheckError, ExpirySource, Report, TlsChecker, UrgencyTier};
use chrono::{DateTime, Local};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

const NOT_AFTER: i64 = 1_900_000_000;

fn self_signed(not_after: i64) -> (PKey<Private>, X509) {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(not_after).unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();

    (pkey, builder.build())
}

/// Serves one TLS handshake on an ephemeral port and returns the port.
fn serve_once(not_after: i64) -> u16 {
    let (pkey, cert) = self_signed(not_after);
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pkey).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            if let Ok(mut tls) = acceptor.accept(stream) {
                let mut buf = [0u8; 16];
                let _ = tls.read(&mut buf);
            }
        }
    });
    port
}

#[test]
fn test_reads_leaf_not_after() {
    let port = serve_once(NOT_AFTER);
    let checker = TlsChecker::insecure().unwrap().port(port);

    let expiry = checker.expiry("127.0.0.1").unwrap();

    let expected: DateTime<Local> = DateTime::from_timestamp(NOT_AFTER, 0)
        .unwrap()
        .with_timezone(&Local);
    assert_eq!(expiry, expected);
}

#[test]
fn test_untrusted_certificate_fails_with_verification() {
    let port = serve_once(NOT_AFTER);
    let checker = TlsChecker::new().unwrap().port(port);

    match checker.expiry("127.0.0.1") {
        Err(CheckError::HandshakeFailed { .. }) => {}
        other => panic!("expected handshake failure, got {:?}", other),
    }
}

#[test]
fn test_silent_server_times_out() {
    // accepted by the kernel backlog but never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let checker = TlsChecker::insecure()
        .unwrap()
        .port(port)
        .timeout(Duration::from_millis(200));

    match checker.expiry("127.0.0.1") {
        Err(CheckError::Timeout { limit, .. }) => assert_eq!(limit, Duration::from_millis(200)),
        other => panic!("expected timeout, got {:?}", other),
    }
    drop(listener);
}

#[test]
fn test_slow_handshake_is_cut_off_at_the_limit() {
    // a TLS record header, then one byte every 50ms for up to 10s
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            if stream.write_all(&[0x16, 0x03, 0x03, 0x40, 0x00]).is_err() {
                return;
            }
            for _ in 0..200 {
                thread::sleep(Duration::from_millis(50));
                if stream.write_all(&[0x02]).is_err() {
                    return;
                }
            }
        }
    });
    let checker = TlsChecker::insecure()
        .unwrap()
        .port(port)
        .timeout(Duration::from_millis(300));

    let started = Instant::now();
    let result = checker.expiry("127.0.0.1");
    let elapsed = started.elapsed();

    assert!(result.is_err());
    assert!(elapsed < Duration::from_secs(2), "check took {:?}", elapsed);
}

#[test]
fn test_refused_connection() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let checker = TlsChecker::insecure().unwrap().port(port);

    match checker.expiry("127.0.0.1") {
        Err(CheckError::ConnectionFailed { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{}", port))
        }
        other => panic!("expected connection failure, got {:?}", other),
    }
}

#[test]
fn test_report_from_live_check() {
    let port = serve_once(NOT_AFTER);
    let checker = TlsChecker::insecure().unwrap().port(port);
    let now: DateTime<Local> = DateTime::from_timestamp(NOT_AFTER - 86_400, 0)
        .unwrap()
        .with_timezone(&Local);

    let report = Report::build(&["127.0.0.1".to_string()], now, &checker);

    assert_eq!(report.entries()[0].tier, UrgencyTier::ExpiringSoon);
    assert!(report.as_str().ends_with("\u{26a0}\u{fe0f}\r\n"));
}
