use vitrine_core::DEFAULT_DESCRIPTOR_KEY;

pub fn default_port() -> u16 {
    3000
}

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_descriptor_key() -> String {
    DEFAULT_DESCRIPTOR_KEY.to_string()
}

pub fn default_vendor_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

pub fn default_node() -> String {
    "node".to_string()
}

pub fn default_render_timeout_ms() -> u64 {
    10_000
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_ignore_patterns() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        "*.log".to_string(),
        ".DS_Store".to_string(),
    ]
}
