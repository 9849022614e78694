//! aliyundrive_open - A client for the Aliyun Drive open platform API.
//!
//! This library provides functionality to:
//! - Authorize through QR code scan or H5 redirect, and refresh tokens
//! - List, inspect, rename, move, copy, trash and delete files
//! - Upload files in fixed-size parts and fetch download links
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use aliyundrive_open::{AuthClient, AuthorizeOptions, ClientConfig, DriveClient, QrStatus, Transport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = Transport::new(&ClientConfig::default())?;
//!     let auth = AuthClient::new("client-id", "client-secret", transport.clone());
//!
//!     let qr = auth.qr_code(&AuthorizeOptions::qr_code()).await?;
//!     println!("Scan: {}", qr.qr_code_url);
//!
//!     let code = loop {
//!         let status = auth.qr_code_status(&qr.sid).await?;
//!         match (status.status, status.auth_code) {
//!             (QrStatus::LoginSuccess, Some(code)) => break code,
//!             (QrStatus::WaitLogin | QrStatus::ScanSuccess, _) => {}
//!             (other, _) => anyhow::bail!("login ended with {:?}", other),
//!         }
//!         tokio::time::sleep(Duration::from_secs(1)).await;
//!     };
//!
//!     let session = auth.authorize(&code).await?;
//!     let client = DriveClient::new(transport, session);
//!
//!     for file in client.list_all("root").await? {
//!         println!("{}", file);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod split;
pub mod transport;
pub mod upload;

// Re-exports for convenience
pub use auth::{code_from_redirect, AuthClient, AuthorizeOptions, Scope, Session};
pub use client::DriveClient;
pub use config::ClientConfig;
pub use error::{DriveError, Result};
pub use models::{FileMetadata, FileType, QrStatus};
pub use options::FileOptions;
pub use split::{split_parts, FilePart};
pub use transport::Transport;
