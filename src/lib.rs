pub mod config;
pub mod delivery;
pub mod error;
pub mod records;
pub mod upload;

pub use config::{Endpoint, ExplicitSettings, ProcessEnv, ResolvedConfig, Resolver};
pub use delivery::{Delivery, DeliveryClient, Method, TransportOptions};
pub use error::{Result, UploadError};
pub use records::load_records;
pub use upload::{UploadOutcome, upload_records};
