use fleet_config::{ConfigError, ConsoleConfig};
use std::time::Duration;

// 环境变量是进程级状态，相关断言放在同一个测试里顺序执行。
#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::remove_var("CONSOLE_API_BASE");
    }
    assert!(matches!(
        ConsoleConfig::from_env(),
        Err(ConfigError::Missing(key)) if key == "CONSOLE_API_BASE"
    ));

    unsafe {
        std::env::set_var("CONSOLE_API_BASE", "http://127.0.0.1:8080/api");
        std::env::set_var("CONSOLE_OPERATOR_ID", "1");
        std::env::set_var("CONSOLE_STATUS_POLL_INTERVAL_MS", "2500");
    }
    let config = ConsoleConfig::from_env().expect("config");
    assert_eq!(config.api_base, "http://127.0.0.1:8080/api");
    assert_eq!(config.operator_id, Some(1));
    assert_eq!(config.status_poll_interval, Duration::from_millis(2500));
    assert_eq!(config.event_log_capacity, 50);
    assert_eq!(config.copy_indicator, Duration::from_secs(2));
    assert!(!config.auto_confirm);

    unsafe {
        std::env::set_var("CONSOLE_AUTO_CONFIRM", "maybe");
    }
    assert!(matches!(
        ConsoleConfig::from_env(),
        Err(ConfigError::Invalid(key, _)) if key == "CONSOLE_AUTO_CONFIRM"
    ));
    unsafe {
        std::env::set_var("CONSOLE_AUTO_CONFIRM", "yes");
    }
    assert!(ConsoleConfig::from_env().expect("config").auto_confirm);

    unsafe {
        std::env::set_var("CONSOLE_EVENT_LOG_CAPACITY", "0");
    }
    assert!(matches!(
        ConsoleConfig::from_env(),
        Err(ConfigError::Invalid(key, _)) if key == "CONSOLE_EVENT_LOG_CAPACITY"
    ));
}
