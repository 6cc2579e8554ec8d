use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load settings from an optional YAML base file overlaid with `APP_`
/// environment variables (`APP_API__BASE_URL` sets `api.base_url`).
///
/// Keys listed in `list_keys` are parsed from comma-separated environment
/// values. A `.env` file in the working directory is read first when present.
pub fn load_settings<T: DeserializeOwned>(
    base_file: &Path,
    list_keys: &[&str],
) -> Result<T, config::ConfigError> {
    dotenvy::dotenv().ok();

    let environment = list_keys.iter().fold(
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    );

    let settings = Config::builder()
        .add_source(File::from(base_file).required(false))
        .add_source(environment)
        .build()?;

    settings.try_deserialize::<T>()
}
