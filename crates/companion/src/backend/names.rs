#![forbid(unsafe_code)]

pub const GET_STATE: &str = "get_state";
pub const SET_LOG_DIR: &str = "set_log_dir";
pub const CHECK_UPDATE: &str = "check_update";
pub const DOWNLOAD_AND_INSTALL_UPDATE: &str = "download_and_install_update";

pub const STATE_UPDATED: &str = "state_updated";
pub const OPEN_SETTINGS: &str = "open_settings";
pub const UPDATE_PROGRESS: &str = "update_progress";
