//! Demo application: the users controller on port 8083.
//!
//! ```text
//! curl http://localhost:8083/v1/users/get
//! curl -X PUT 'http://localhost:8083/v1/users/put?userId=alice&userId2=bob'
//! curl -X POST 'http://localhost:8083/v1/users/post?intParam=5&testParam=hi' -d '{"a":"x","b":"y"}'
//! ```
//!
//! The users controller carries an `audience` tag, logged when its routes are
//! built. `SPRIG_PORT`, `SPRIG_LOG_LEVEL` and `SPRIG_LOG_FORMAT` override the defaults.

mod controller;

use sprig::prelude::*;

fn descriptor() -> AppDescriptor {
    AppDescriptor::new("sprig-demo")
        .entry(launch)
        .base_namespace(module_path!())
        .port(8083)
}

fn launch(args: Vec<String>) {
    let guard = LogConfig::from_env().init();

    let result = tokio::runtime::Runtime::new()
        .map_err(Error::from)
        .and_then(|runtime| runtime.block_on(Application::run(descriptor(), args)));

    if let Err(err) = result {
        tracing::error!(error = %err, "Application failed");
        drop(guard);
        std::process::exit(1);
    }
}

fn main() {
    launch(std::env::args().collect());
}
