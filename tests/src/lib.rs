mod exec_log;
pub use exec_log::ExecLog;

mod scripted_driver;
pub use scripted_driver::{DriverOp, ScriptedDriver};

pub mod schema;

pub use std_util::*;

use arbor::{Config, Db, Document};
use tracing_subscriber::EnvFilter;

/// A handle over the blog schema answering from `driver`.
pub fn setup(driver: &ScriptedDriver) -> Db {
    setup_with(driver, Config::default())
}

pub fn setup_with(driver: &ScriptedDriver, config: Config) -> Db {
    init_tracing();
    Db::builder().config(config).build(schema::blog(), driver.clone())
}

/// Serialized documents, keys in output order.
pub fn to_json(docs: &[Document]) -> String {
    serde_json::to_string(docs).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
