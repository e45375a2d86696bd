use std::sync::Mutex;

use carousel_backend::AppConfig;

// 环境变量是进程级的，本文件内的用例串行执行
static ENV_LOCK: Mutex<()> = Mutex::new(());

const TOUCHED: [&str; 5] = [
    "PORT",
    "IMAGES_FOLDER",
    "HEADER_IMAGES_URL",
    "XANO_HEADER_IMAGES_URL",
    "APP_SERVER__HOST",
];

fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        for name in TOUCHED {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
    }
    f();
    unsafe {
        for name in TOUCHED {
            std::env::remove_var(name);
        }
    }
}

#[test]
fn legacy_env_overrides_file_and_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            [server]
            port = 4000

            [images]
            folder = "./from-file"
            url_prefix = "/pics"
        "#,
    )
    .expect("write config");

    with_env(
        &[
            ("PORT", "5000"),
            ("IMAGES_FOLDER", "/srv/carousel"),
            ("XANO_HEADER_IMAGES_URL", "https://xano.example.com/api/header_images"),
            ("APP_SERVER__HOST", "127.0.0.1"),
        ],
        || {
            let cfg = AppConfig::load_from(&path).expect("load config");
            assert_eq!(cfg.server.port, 5000);
            assert_eq!(cfg.server.host, "127.0.0.1");
            assert_eq!(cfg.images.folder, "/srv/carousel");
            assert_eq!(cfg.images.url_prefix, "/pics");
            assert_eq!(
                cfg.upstream.url.as_deref(),
                Some("https://xano.example.com/api/header_images")
            );
        },
    );
}

#[test]
fn header_images_url_wins_over_xano_alias() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("absent.toml");

    with_env(
        &[
            ("XANO_HEADER_IMAGES_URL", "https://old.example.com/header_images"),
            ("HEADER_IMAGES_URL", "https://new.example.com/header_images"),
        ],
        || {
            let cfg = AppConfig::load_from(&missing).expect("load config");
            assert_eq!(cfg.server.port, 3000);
            assert_eq!(
                cfg.upstream.url.as_deref(),
                Some("https://new.example.com/header_images")
            );
        },
    );
}

#[test]
fn blank_legacy_values_are_ignored() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("absent.toml");

    with_env(&[("PORT", " "), ("IMAGES_FOLDER", "")], || {
        let cfg = AppConfig::load_from(&missing).expect("load config");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.images.folder, "./public/images");
    });
}
