//! Reachability probe used as the platform signal on desktop hosts.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::NetworkKind;

/// Periodically opens a TCP connection to the backend host and reports the
/// result as a platform network event.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host:port of `url` (scheme default port if none is given).
    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(url).with_context(|| format!("invalid probe url: {url}"))?;
        let host = parsed
            .host_str()
            .with_context(|| format!("probe url has no host: {url}"))?;
        let port = parsed
            .port_or_known_default()
            .with_context(|| format!("probe url has no port: {url}"))?;
        Ok(Self::new(format!("{host}:{port}"), timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One reachability check.
    pub async fn probe_once(&self) -> NetworkKind {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => NetworkKind::Other,
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, "probe connect failed: {}", e);
                NetworkKind::None
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "probe timed out");
                NetworkKind::None
            }
        }
    }

    /// Spawn a loop pushing one event per `interval` until the receiver is gone.
    pub fn spawn(self, interval: Duration, events: mpsc::Sender<NetworkKind>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let kind = self.probe_once().await;
                if events.send(kind).await.is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_uses_default_port() {
        let probe = TcpProbe::from_url("https://api.example.org/v1", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.addr(), "api.example.org:443");
        let probe = TcpProbe::from_url("http://10.0.0.5:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.addr(), "10.0.0.5:8080");
    }

    #[test]
    fn from_url_rejects_garbage() {
        assert!(TcpProbe::from_url("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn probe_reports_listening_and_closed_ports() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(2));
        assert_eq!(probe.probe_once().await, NetworkKind::Other);

        drop(listener);
        assert_eq!(probe.probe_once().await, NetworkKind::None);
    }
}
