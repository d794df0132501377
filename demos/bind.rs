use relaxed_bind::{BindTolerance, Bindable, Binder, PropertySources, Schema};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
#[allow(dead_code)]
struct Pool {
    max_size: u32,
    idle_timeout_secs: u64,
}

#[derive(Debug, Default)]
#[allow(dead_code)]
struct Registry {
    address: String,
    timeout_ms: u64,
    protocols: Vec<String>,
    pool: Pool,
}

impl Bindable for Pool {
    fn schema() -> Schema<Self> {
        Schema::new()
            .field("max-size", |p: &mut Self, v: u32| p.max_size = v)
            .field("idle-timeout-secs", |p: &mut Self, v: u64| p.idle_timeout_secs = v)
    }
}

impl Bindable for Registry {
    fn schema() -> Schema<Self> {
        Schema::new()
            .required("address", |r: &mut Self, v: String| r.address = v)
            .field("timeout-ms", |r: &mut Self, v: u64| r.timeout_ms = v)
            .field("protocols", |r: &mut Self, v: Vec<String>| r.protocols = v)
            .group("pool", |r: &mut Self| &mut r.pool)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    binder: BindTolerance,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings: Settings = toml::from_str(
        r#"
        [binder]
        ignore-unknown-fields = false
        "#,
    )?;

    // defaults -> file -> environment overrides
    let sources = PropertySources::new()
        .with_map(
            "defaults",
            [
                ("registry.host", "127.0.0.1"),
                ("registry.port", "2181"),
                ("service.registry.address", "zookeeper://${registry.host}:${registry.port}"),
                ("service.registry.timeoutMs", "3000"),
                ("service.registry.protocols", "dubbo, rest"),
            ],
        )
        .with_file("demos/registry.toml", false)
        .with_env("DEMO", "__");

    let binder = Binder::new(sources).with_tolerance(settings.binder);
    let registry: Registry = binder.bind_new("service.registry")?;

    println!("{registry:#?}");
    Ok(())
}
