//! Raw SCPI-over-TCP command channel.
//!
//! Both bench instruments are LAN SCPI endpoints (port 5025 style sockets):
//! newline-terminated writes, line-framed replies. Timeouts are a transport
//! concern; a read or write that exceeds the configured timeout is a fatal
//! communication failure at this level.

use crate::error::{BenchError, BenchResult};
use crate::instrument::CommandChannel;
use async_trait::async_trait;
use log::{debug, info};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// SCPI socket channel to one instrument.
pub struct TcpChannel {
    name: String,
    address: String,
    io_timeout: Duration,
    stream: Mutex<Option<BufReader<TcpStream>>>,
}

impl TcpChannel {
    /// Connects to an instrument at `address` (`host:port`).
    pub async fn connect(
        name: impl Into<String>,
        address: impl Into<String>,
        io_timeout: Duration,
    ) -> BenchResult<Self> {
        let name = name.into();
        let address = address.into();

        let stream = timeout(io_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| BenchError::comm(&name, format!("connect to {address} timed out")))?
            .map_err(|err| BenchError::comm(&name, format!("connect to {address} failed: {err}")))?;

        info!("connected to {name} at {address}");
        Ok(Self {
            name,
            address,
            io_timeout,
            stream: Mutex::new(Some(BufReader::new(stream))),
        })
    }

    async fn write_line(&self, command: &str) -> BenchResult<()> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| BenchError::comm(&self.name, "channel is closed"))?;

        let line = format!("{command}\n");
        timeout(self.io_timeout, stream.get_mut().write_all(line.as_bytes()))
            .await
            .map_err(|_| BenchError::comm(&self.name, format!("write timed out: {command}")))?
            .map_err(|err| BenchError::comm(&self.name, format!("write failed: {err}")))?;
        Ok(())
    }

    async fn read_line(&self) -> BenchResult<String> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| BenchError::comm(&self.name, "channel is closed"))?;

        let mut line = String::new();
        let bytes = timeout(self.io_timeout, stream.read_line(&mut line))
            .await
            .map_err(|_| BenchError::comm(&self.name, "read timed out"))?
            .map_err(|err| BenchError::comm(&self.name, format!("read failed: {err}")))?;
        if bytes == 0 {
            return Err(BenchError::comm(&self.name, "connection closed by peer"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait]
impl CommandChannel for TcpChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, command: &str) -> BenchResult<()> {
        debug!("{} <- {}", self.name, command);
        self.write_line(command).await
    }

    async fn query(&self, command: &str) -> BenchResult<String> {
        self.write_line(command).await?;
        let reply = self.read_line().await?;
        debug!("{} <- {} -> {}", self.name, command, reply);
        Ok(reply)
    }

    async fn close(&self) -> BenchResult<()> {
        let mut guard = self.stream.lock().await;
        if let Some(stream) = guard.take() {
            drop(stream);
            info!("closed channel to {} at {}", self.name, self.address);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn echo_instrument() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        (listener, address)
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let (listener, address) = echo_instrument().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(line, ":MEAS:VRMS? CHAN1\n");
            reader
                .get_mut()
                .write_all(b"+2.5E+00\n")
                .await
                .unwrap();
        });

        let channel = TcpChannel::connect("scope", address, Duration::from_secs(1))
            .await
            .unwrap();
        let reply = channel.query(":MEAS:VRMS? CHAN1").await.unwrap();
        assert_eq!(reply, "+2.5E+00");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_poisons_io() {
        let (listener, address) = echo_instrument().await;
        tokio::spawn(async move {
            let _conn = listener.accept().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let channel = TcpChannel::connect("supply", address, Duration::from_secs(1))
            .await
            .unwrap();
        channel.close().await.unwrap();
        channel.close().await.unwrap();

        let err = channel.send("OUTP OFF, (@2)").await.unwrap_err();
        assert!(matches!(err, BenchError::Communication { .. }));
    }

    #[tokio::test]
    async fn test_read_timeout_is_communication_error() {
        let (listener, address) = echo_instrument().await;
        tokio::spawn(async move {
            // Accept but never answer.
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let channel = TcpChannel::connect("scope", address, Duration::from_millis(50))
            .await
            .unwrap();
        let err = channel.query("WGEN:FREQ?").await.unwrap_err();
        assert!(matches!(err, BenchError::Communication { .. }));
        assert!(err.to_string().contains("timed out"));
    }
}
