use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Protocol-level failures (AVP_UNSUPPORTED, MISSING_AVP, ...) are carried as
/// Result-Code AVPs in answer messages, not as `Error` variants -- see
/// `constants` for those. This enum covers codec, transport, correlation and
/// call-site failures.
#[derive(Debug)]
pub enum Error {
    DecodeError(String),
    EncodeError(String),
    UnknownAvpCode(u32),
    MissingAvp(u32),
    TruncatedAvp,
    MalformedHeader(String),
    UnknownMandatoryAvp(u32),
    /// The header decoded cleanly but an AVP in the body didn't (unknown
    /// mandatory AVP, truncated AVP, length mismatch, ...). Carries the
    /// header so the caller can still answer with a Result-Code instead of
    /// just disconnecting.
    MalformedBody {
        header: Box<crate::diameter::DiameterHeader>,
        source: Box<Error>,
    },
    ClientError(String),
    ServerError(String),
    IoError(std::io::Error),
    TryFromSliceError(std::array::TryFromSliceError),
    Utf8Error(std::string::FromUtf8Error),
    /// A request timed out waiting for an answer.
    Timeout,
    /// The peer a request was addressed to is no longer connected.
    PeerGone,
    /// No application is registered for the (application-id, command-code).
    ApplicationUnsupported,
    /// An answer arrived whose hop-by-hop id matches no outstanding request.
    NoOutstandingRequest(u32),
    /// A peer reused a hop-by-hop id that was already outstanding.
    DuplicateHopByHopId(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DecodeError(msg) => write!(f, "{}", msg),
            Error::EncodeError(msg) => write!(f, "{}", msg),
            Error::UnknownAvpCode(code) => write!(f, "unknown AVP code: {}", code),
            Error::MissingAvp(code) => write!(f, "missing required AVP: {}", code),
            Error::TruncatedAvp => write!(f, "truncated AVP"),
            Error::MalformedHeader(msg) => write!(f, "malformed header: {}", msg),
            Error::UnknownMandatoryAvp(code) => {
                write!(f, "unsupported mandatory AVP: {}", code)
            }
            Error::MalformedBody { header, source } => {
                write!(f, "malformed body for code {} (application {}): {}", header.code, header.application_id, source)
            }
            Error::ClientError(msg) => write!(f, "{}", msg),
            Error::ServerError(msg) => write!(f, "{}", msg),
            Error::IoError(e) => write!(f, "{}", e),
            Error::TryFromSliceError(e) => write!(f, "{}", e),
            Error::Utf8Error(e) => write!(f, "{}", e),
            Error::Timeout => write!(f, "request timed out"),
            Error::PeerGone => write!(f, "peer is gone"),
            Error::ApplicationUnsupported => write!(f, "no application bound for request"),
            Error::NoOutstandingRequest(hbh) => {
                write!(f, "no outstanding request for hop-by-hop id {}", hbh)
            }
            Error::DuplicateHopByHopId(hbh) => {
                write!(f, "duplicate hop-by-hop id {}", hbh)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<std::array::TryFromSliceError> for Error {
    fn from(err: std::array::TryFromSliceError) -> Error {
        Error::TryFromSliceError(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Error {
        Error::Utf8Error(err)
    }
}
