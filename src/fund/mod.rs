pub mod audit;
pub mod config;
pub mod export;
pub mod ledger;
pub mod migrate;
pub mod model;
pub mod nudge;
pub mod paths;
pub mod settings;
pub mod store;
pub mod subscription;
pub mod sync;
#[cfg(test)]
pub mod testing;
pub mod util;
pub mod warn;
