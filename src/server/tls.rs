//! TLS termination for the server.
//!
//! Two certificate sources are supported: a self-signed certificate generated
//! at startup (development only) and PEM files on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};

use super::ServerError;

/// Where the server certificate comes from.
enum CertSource {
    SelfSigned,
    PemFiles { cert: PathBuf, key: PathBuf },
}

/// TLS configuration for [`Server::tls`](crate::Server::tls).
///
/// # Examples
///
/// ```rust,no_run
/// use routekit::{Server, TlsSettings};
///
/// # fn build() -> Server {
/// Server::new("127.0.0.1:8443").tls(TlsSettings::self_signed())
/// # }
/// ```
pub struct TlsSettings {
    source: CertSource,
}

impl TlsSettings {
    /// Generate a self-signed certificate for `localhost` at startup.
    ///
    /// Clients will not trust it; intended for local development only.
    pub fn self_signed() -> Self {
        Self {
            source: CertSource::SelfSigned,
        }
    }

    /// Load the certificate chain and private key from PEM files.
    pub fn from_pem_files(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            source: CertSource::PemFiles {
                cert: cert.into(),
                key: key.into(),
            },
        }
    }

    pub(crate) fn build_acceptor(&self) -> Result<TlsAcceptor, ServerError> {
        let (certs, key) = match &self.source {
            CertSource::SelfSigned => {
                let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_owned()])?;
                let cert = generated.cert.der().clone();
                let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
                    generated.key_pair.serialize_der(),
                ));
                (vec![cert], key)
            }
            CertSource::PemFiles { cert, key } => {
                let cert_file = File::open(cert)?;
                let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
                    .collect::<Result<Vec<_>, _>>()?;

                let key_file = File::open(key)?;
                let private_key = rustls_pemfile::private_key(&mut BufReader::new(key_file))?
                    .ok_or_else(|| ServerError::MissingPrivateKey { path: key.clone() })?;
                (certs, private_key)
            }
        };

        let config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)?;
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}
