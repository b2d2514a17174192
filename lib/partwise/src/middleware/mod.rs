//! Tower middleware layers for the partwise HTTP client.
//!
//! Layers wrap the type-erased [`BoxedService`](crate::BoxedService) and are
//! added with [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer).
//! The first layer added sits closest to the transport.
//!
//! - [`LoggingLayer`] - logs requests and responses using `tracing`
//!
//! # Example
//!
//! ```
//! use partwise::HyperClient;
//! use partwise::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
