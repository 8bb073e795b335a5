use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(history_home: Option<PathBuf>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    match history_home {
        Some(home) => Some(home.join(".env")),
        None => Some(config_dir?.join("ags-history/.env")),
    }
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("AGS_HISTORY_HOME").map(PathBuf::from),
        dirs::config_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn fallback_uses_history_home_directly() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/workspace/ags")),
            Some(PathBuf::from("/home/alice/.config")),
        );
        assert_eq!(got, Some(PathBuf::from("/workspace/ags/.env")));
    }

    #[test]
    fn fallback_uses_config_dir_when_home_unset() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice/.config")));
        assert_eq!(
            got,
            Some(PathBuf::from("/home/alice/.config/ags-history/.env"))
        );
    }

    #[test]
    fn no_fallback_without_any_base() {
        assert_eq!(fallback_dotenv_path(None, None), None);
    }
}
