use crate::config::ApiConfig;
use std::path::PathBuf;

/// Settings shared by every command.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub api: ApiConfig,
    pub token_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(api: ApiConfig, token_file: PathBuf) -> Self {
        Self { api, token_file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::time::Duration;

    #[test]
    fn test_global_args() -> Result<(), crate::ApiError> {
        let api = ApiConfig::resolve(None, Environment::Development, Duration::from_secs(10))?;
        let args = GlobalArgs::new(api, PathBuf::from("/tmp/session.json"));
        assert_eq!(args.api.base_url.as_str(), "http://localhost:3000/api");
        assert_eq!(args.token_file, PathBuf::from("/tmp/session.json"));
        Ok(())
    }
}
