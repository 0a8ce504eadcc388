use crate::error::CheckError;
use chrono::{DateTime, Local};
use log::debug;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslVerifyMode};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

static TIMEOUT: u64 = 30;
static HTTPS_PORT: u16 = 443;

/// Outcome of one certificate check: the leaf certificate's expiry in local
/// time, or the reason it could not be read.
pub type CheckResult = Result<DateTime<Local>, CheckError>;

/// Anything that can look up the certificate expiry of a host.
pub trait ExpirySource {
    fn expiry(&self, host: &str) -> CheckResult;
}

/// Reads the `NotAfter` date of the certificate a host presents on port 443.
pub struct TlsChecker {
    connector: SslConnector,
    port: u16,
    timeout: Duration,
}

impl TlsChecker {
    /// A checker that verifies the peer against the system trust store.
    pub fn new() -> Result<TlsChecker, CheckError> {
        let builder = SslConnector::builder(SslMethod::tls())?;
        Ok(TlsChecker::with_connector(builder.build()))
    }

    /// A checker that accepts any peer certificate, so expired or
    /// self-signed certificates still yield a date.
    pub fn insecure() -> Result<TlsChecker, CheckError> {
        let mut builder = SslConnector::builder(SslMethod::tls())?;
        builder.set_verify(SslVerifyMode::NONE);
        Ok(TlsChecker::with_connector(builder.build()))
    }

    pub fn with_connector(connector: SslConnector) -> TlsChecker {
        TlsChecker {
            connector,
            port: HTTPS_PORT,
            timeout: Duration::from_secs(TIMEOUT),
        }
    }

    pub fn port(mut self, port: u16) -> TlsChecker {
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> TlsChecker {
        self.timeout = timeout;
        self
    }

    fn connect(&self, host: &str, deadline: Instant) -> Result<TcpStream, CheckError> {
        let address = format!("{}:{}", host, self.port);
        let addrs = (host, self.port)
            .to_socket_addrs()
            .map_err(|source| CheckError::DnsResolution {
                hostname: host.to_string(),
                source,
            })?;

        let mut last_error = None;
        for socket_addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(host));
            }
            match TcpStream::connect_timeout(&socket_addr, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(source) => Err(CheckError::ConnectionFailed { address, source }),
            None => Err(CheckError::DnsResolution {
                hostname: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            }),
        }
    }

    fn timed_out(&self, host: &str) -> CheckError {
        CheckError::Timeout {
            hostname: host.to_string(),
            limit: self.timeout,
        }
    }
}

impl ExpirySource for TlsChecker {
    /// Connecting and the handshake share one time limit.
    fn expiry(&self, host: &str) -> CheckResult {
        let deadline = Instant::now() + self.timeout;
        let stream = DeadlineStream {
            inner: self.connect(host, deadline)?,
            deadline,
            expired: false,
        };

        // the stream is closed when it goes out of scope
        let stream = self.connector.connect(host, stream).map_err(|e| {
            let expired = match &e {
                HandshakeError::Failure(mid) | HandshakeError::WouldBlock(mid) => {
                    mid.get_ref().expired
                }
                HandshakeError::SetupFailure(_) => false,
            };
            if expired {
                self.timed_out(host)
            } else {
                CheckError::from(e)
            }
        })?;
        let leaf = stream
            .ssl()
            .peer_certificate()
            .ok_or_else(|| CheckError::CertificateError {
                reason: "peer sent no certificate".to_string(),
            })?;
        let expiry = not_after_local(leaf.not_after())?;
        debug!("{} expires {}", host, expiry);
        Ok(expiry)
    }
}

/// A socket whose reads and writes fail once a fixed instant has passed,
/// however the peer paces its bytes.
#[derive(Debug)]
struct DeadlineStream {
    inner: TcpStream,
    deadline: Instant,
    expired: bool,
}

impl DeadlineStream {
    fn remaining(&mut self) -> io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            self.expired = true;
            Err(io::Error::new(io::ErrorKind::TimedOut, "check deadline passed"))
        } else {
            Ok(remaining)
        }
    }

    fn track<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &result {
            if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                self.expired = true;
            }
        }
        result
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_read_timeout(Some(remaining))?;
        let result = self.inner.read(buf);
        self.track(result)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_write_timeout(Some(remaining))?;
        let result = self.inner.write(buf);
        self.track(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Converts an ASN.1 time into local time.
pub fn not_after_local(not_after: &Asn1TimeRef) -> CheckResult {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(not_after)?;
    let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| CheckError::CertificateError {
            reason: format!("expiry {} is out of range", not_after),
        })
}
