use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self, effective_base_url: &str) {
        println!("Current configuration:");
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset)"),
        }
        match self.connect_timeout_secs {
            Some(secs) => println!("  connect-timeout: {secs}s"),
            None => println!("  connect-timeout: (unset)"),
        }
        println!("  effective endpoint: {effective_base_url}");
        if let Ok(path) = Config::config_path() {
            println!("  config file: {}", path_display(path));
        }
    }
}
