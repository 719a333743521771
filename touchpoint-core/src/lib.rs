pub mod attribution;
pub mod config;
pub mod cpa;
pub mod error;
pub mod generator;
pub mod models;
pub mod quality;
pub mod referrer;

pub use attribution::{resolve_attribution, resolve_user};
pub use config::{AttributionConfig, GeneratorConfig, TouchpointConfig, DEFAULT_WINDOW_DAYS};
pub use cpa::{compute_cpa, summarize, CpaSummary, Granularity, TouchModel};
pub use error::TouchpointError;
pub use generator::{generate, SyntheticData};
pub use models::{AttributionResult, CampaignSpend, CpaRow, Session, Touch};
pub use quality::{check_quality, QualityReport};
pub use referrer::{parse_referrer, TouchSource, ORGANIC_SOURCE};
