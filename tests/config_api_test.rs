// ==========================================
// ConfigApi 集成测试
// ==========================================
// 覆盖: 默认设置、设置持久化、配置快照与恢复
// ==========================================

mod test_helpers;

use test_helpers::TestEnv;

#[test]
fn test_get_settings_默认值() {
    let env = TestEnv::new().expect("创建测试环境失败");
    let settings = env.state.config_api.get_settings().unwrap();

    assert_eq!(settings.history_cap, None);
    assert_eq!(settings.snapshot_retention, 50);
}

#[test]
fn test_set_history_cap_零表示不限() {
    let env = TestEnv::new().expect("创建测试环境失败");
    let config_api = &env.state.config_api;

    config_api.set_history_cap(Some(5)).unwrap();
    assert_eq!(config_api.get_settings().unwrap().history_cap, Some(5));

    config_api.set_history_cap(Some(0)).unwrap();
    assert_eq!(config_api.get_settings().unwrap().history_cap, None);

    config_api.set_history_cap(None).unwrap();
    assert_eq!(config_api.get_settings().unwrap().history_cap, None);
}

#[test]
fn test_设置重启后保留() {
    let env = TestEnv::new().expect("创建测试环境失败");
    env.state.config_api.set_history_cap(Some(3)).unwrap();
    env.state.config_api.set_snapshot_retention(7).unwrap();

    let reopened = env.reopen().expect("重新打开失败");
    let settings = reopened.config_api.get_settings().unwrap();
    assert_eq!(settings.history_cap, Some(3));
    assert_eq!(settings.snapshot_retention, 7);
}

#[test]
fn test_config_snapshot_恢复() {
    let env = TestEnv::new().expect("创建测试环境失败");
    let config_api = &env.state.config_api;

    config_api.set_snapshot_retention(10).unwrap();
    let saved = config_api.get_config_snapshot().unwrap();

    config_api.set_snapshot_retention(20).unwrap();
    config_api.set_history_cap(Some(4)).unwrap();

    let restored = config_api.restore_from_snapshot(&saved).unwrap();
    assert_eq!(restored, 1);

    let settings = config_api.get_settings().unwrap();
    assert_eq!(settings.snapshot_retention, 10);
    // 快照中不存在的键保持原值
    assert_eq!(settings.history_cap, Some(4));
}

#[test]
fn test_restore_非法快照() {
    let env = TestEnv::new().expect("创建测试环境失败");
    assert!(env.state.config_api.restore_from_snapshot("not json").is_err());
}
