use app_config::AppConfig;
use std::time::Duration;

#[test]
fn test_load_default_config() {
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.results_per_page, 4);
    assert_eq!(cfg.gateway_currency, "INR");
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
}
