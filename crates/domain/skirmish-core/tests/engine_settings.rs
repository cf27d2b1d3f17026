use skirmish_core::{EngineSettings, OptionTable, SettingsError, SettingsPatch};

fn patch(defaults: &[(&str, &str)], overrides: &[(&str, &str)]) -> SettingsPatch {
    SettingsPatch {
        defaults: defaults.iter().copied().collect::<OptionTable>(),
        overrides: overrides.iter().copied().collect::<OptionTable>(),
    }
}

#[test]
fn defaults_do_not_replace_existing_values() {
    let mut settings = EngineSettings::parse("XResolution = 1920\nYResolution=1080\n");

    let changed = settings
        .apply(&patch(&[("XResolution", "800"), ("Fullscreen", "1")], &[]))
        .expect("apply");

    assert_eq!(changed, 1);
    assert_eq!(settings.get("XResolution"), Some("1920"));
    assert_eq!(settings.get("Fullscreen"), Some("1"));
}

#[test]
fn overrides_replace_in_place_and_append_new_keys() {
    let mut settings = EngineSettings::parse("# engine settings\nXResolution = 1920\n\nVSync = 0\n");

    settings
        .apply(&patch(&[], &[("VSync", "1"), ("XResolution", "1280"), ("Sound", "0")]))
        .expect("apply");

    assert_eq!(
        settings.render(),
        "# engine settings\nXResolution = 1280\n\nVSync = 1\nSound = 0\n"
    );
}

#[test]
fn unchanged_override_is_not_counted() {
    let mut settings = EngineSettings::parse("VSync = 1\n");
    let changed = settings.apply(&patch(&[], &[("VSync", "1")])).expect("apply");
    assert_eq!(changed, 0);
}

#[test]
fn malformed_override_leaves_settings_untouched() {
    let original = EngineSettings::parse("VSync = 0\n");
    let mut settings = original.clone();

    let err = settings
        .apply(&patch(&[], &[("VSync", "1"), ("Bad Key", "1")]))
        .unwrap_err();

    assert!(matches!(err, SettingsError::Malformed { ref key, .. } if key == "Bad Key"));
    assert_eq!(settings, original);
}

#[test]
fn values_with_line_breaks_are_rejected() {
    let mut settings = EngineSettings::default();
    let err = settings
        .apply(&patch(&[("Name", "a\nb")], &[]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid engine setting \"Name\": value contains a line break"
    );
}
