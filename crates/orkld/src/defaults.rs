use camino::{Utf8Path, Utf8PathBuf};
use dirs::home_dir;

pub const DEFAULT_CONNECTOR_HOME: &str = ".orkl";

pub fn default_connector_dir() -> Utf8PathBuf {
    if let Some(home) = home_dir() {
        let home = Utf8Path::from_path(&home).expect("invalid home directory");

        return home.join(DEFAULT_CONNECTOR_HOME);
    }

    Utf8PathBuf::default()
}
