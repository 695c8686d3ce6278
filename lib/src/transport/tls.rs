use crate::error::ProbeError;
use crate::transport::{AsyncStream, IoStream};
use log::debug;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use tokio_rustls::TlsConnector;

// sni must carry the stun server's hostname, not the proxy's

pub async fn wrap<S>(stream: S, host: &str) -> Result<IoStream, ProbeError>
where
    S: AsyncStream + 'static,
{
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let name = ServerName::try_from(host.to_string())
        .map_err(|_| ProbeError::Tls(format!("bad server name: {}", host)))?;

    let tls = connector
        .connect(name, stream)
        .await
        .map_err(|e| ProbeError::Tls(format!("{}", e)))?;
    debug!("tls handshake done, sni {}", host);

    Ok(Box::new(tls))
}
