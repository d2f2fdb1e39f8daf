pub mod config;
pub mod enrich;
pub mod metrics;
pub mod participation;
pub mod policy;
pub mod readability;
pub mod session;
pub mod signature;
pub mod text;
pub mod tfidf;
pub mod timeline;

pub use config::*;
pub use enrich::*;
pub use metrics::*;
pub use participation::*;
pub use policy::*;
pub use session::*;
pub use signature::*;
pub use timeline::*;
