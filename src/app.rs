pub const APP_NAME: &str = env!("APP_NAME");
pub const APP_VERSION: &str = env!("APP_VERSION");
pub const APP_ID: &str = env!("APP_ID");

/// Label of the single primary window
pub const MAIN_WINDOW_LABEL: &str = "main";

pub const CONFIG_FILE_NAME: &str = "host.config.json";

// Environment overrides
pub const ROOT_ENV: &str = "WEBDESK_ROOT";
pub const DEPLOYMENT_ENV: &str = "WEBDESK_DEPLOYMENT";
pub const LOG_ENV: &str = "WEBDESK_LOG";
