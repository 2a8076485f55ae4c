//! Engine Stream Adapters
//!
//! WebSocket clients for the engine's two receive-only channels:
//!
//! - **Metrics**: one JSON partial-snapshot per frame, merged into the store
//! - **Transactions**: single events or batches, appended to the bounded log
//!
//! Both sessions reconnect forever until disposed; the metrics session uses
//! growing backoff, the transaction session a fixed retry delay.

pub mod codec;
pub mod metrics_stream;
pub mod reconnect;
pub mod session;
pub mod tx_stream;

pub use codec::{CodecError, JsonCodec};
pub use metrics_stream::{MetricsStreamClient, MetricsStreamConfig};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use session::{ConnectionPhase, StreamError};
pub use tx_stream::{TxStreamClient, TxStreamConfig};
