pub mod audio_host;
pub mod capture_sink;
pub mod host_callbacks;
pub mod process_scope;
pub mod render_source;
pub mod settings_store;
