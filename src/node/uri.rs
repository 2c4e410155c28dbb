//! Diameter URI parsing (aaa://, aaas://), RFC 6733 section 4.5.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Aaa,
    Aaas,
}

/// A parsed `aaa://host[:port]` / `aaas://host[:port]` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiameterUri {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl DiameterUri {
    pub fn parse(s: &str) -> Result<DiameterUri> {
        let (scheme, rest) = if let Some(rest) = s.strip_prefix("aaas://") {
            (Scheme::Aaas, rest)
        } else if let Some(rest) = s.strip_prefix("aaa://") {
            (Scheme::Aaa, rest)
        } else {
            return Err(Error::MalformedHeader(format!("not a Diameter URI: {}", s)));
        };

        // Drop any trailing ;transport=tcp / ;protocol=diameter parameters.
        let authority = rest.split(';').next().unwrap_or(rest);
        if authority.is_empty() {
            return Err(Error::MalformedHeader(format!("empty host in URI: {}", s)));
        }

        let default_port = match scheme {
            Scheme::Aaa => 3868,
            Scheme::Aaas => 5658,
        };

        match authority.rsplit_once(':') {
            Some((host, port_str)) if !host.is_empty() => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| Error::MalformedHeader(format!("invalid port in URI: {}", s)))?;
                Ok(DiameterUri {
                    scheme,
                    host: host.to_string(),
                    port,
                })
            }
            _ => Ok(DiameterUri {
                scheme,
                host: authority.to_string(),
                port: default_port,
            }),
        }
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aaa_default_port() {
        let uri = DiameterUri::parse("aaa://hss.example.com").unwrap();
        assert_eq!(uri.scheme, Scheme::Aaa);
        assert_eq!(uri.host, "hss.example.com");
        assert_eq!(uri.port, 3868);
    }

    #[test]
    fn test_parse_aaas_explicit_port() {
        let uri = DiameterUri::parse("aaas://hss.example.com:5868").unwrap();
        assert_eq!(uri.scheme, Scheme::Aaas);
        assert_eq!(uri.port, 5868);
    }

    #[test]
    fn test_parse_with_transport_param() {
        let uri = DiameterUri::parse("aaa://hss.example.com:3868;transport=tcp").unwrap();
        assert_eq!(uri.host, "hss.example.com");
        assert_eq!(uri.port, 3868);
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        assert!(DiameterUri::parse("http://hss.example.com").is_err());
    }
}
