//! NextGCore NEF (Network Exposure Function)
//!
//! Traffic influence exposure (TS 29.522) backed by Npcf_PolicyAuthorization
//! (TS 29.514) app sessions on a PCF discovered through the NRF.

pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod nbi_handler;
pub mod nnrf_handler;
pub mod npcf_handler;
pub mod sbi_path;
pub mod traffic_influence;

mod property_tests;

pub use config::{ConfigError, NbiConf, NefConfig, SbiConf};
pub use context::{
    nef_context_final, nef_context_init, nef_self, traffic_influence_location, AfContext,
    NefContext, TrafficInfluSubCtx, TRAFFIC_INFLUENCE_API_ROOT,
};
pub use error::{NefError, NefResult};
pub use nbi_handler::nef_nbi_request_handler;
pub use nnrf_handler::PcfDiscovery;
pub use npcf_handler::PolicySessionClient;
pub use sbi_path::{NrfClient, PcfClient, SbiClientPool, SbiNrfClient, SbiPcfClient};
pub use traffic_influence::TrafficInfluenceService;
