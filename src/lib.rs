//! Fetch the computed secrets of a Doppler project config.
//!
//! ```no_run
//! # async fn run() -> doppler_secrets::Result<()> {
//! let client = doppler_secrets::SecretsClient::new("backend", "dp.st.xxxx", "staging")?;
//! let database_url = client.get_one("DATABASE_URL").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod result;
pub mod transport;

pub use client::{SecretMap, SecretsClient};
pub use error::{BoxError, Error};
pub use result::Result;
pub use transport::{ReqwestTransport, Request, Response, Transport};
