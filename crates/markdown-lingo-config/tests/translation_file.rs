use markdown_lingo_config::{Config, load_translations};
use markdown_lingo_engine::render_markdown;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn engine_fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/../markdown-lingo-engine/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn translation_fixture() -> String {
    format!("{}/tests/fixtures/complex.zh.toml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn translation_file_drives_the_renderer() {
    // Given the translation file for the complex fixture
    let translations = load_translations(translation_fixture()).unwrap();

    // When
    let out = render_markdown(
        &engine_fixture("complex.md"),
        Default::default(),
        Some(Box::new(translations)),
    )
    .unwrap();

    // Then
    assert_eq!(out, engine_fixture("complex.zh.md"));
}

#[test]
fn config_policy_and_translations_together() {
    // Given a config that points at the translation file and asks for setext
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_file,
        format!(
            "translations-path = {:?}\n\n[policy]\nheading-style = \"setext\"\n\n[translations]\n\"Conclusion\" = \"总结\"\n",
            translation_fixture()
        ),
    )
    .unwrap();

    // When
    let config = Config::load_from_path(&config_file).unwrap().unwrap();
    let out = render_markdown(
        "# Introduction\n\n### Conclusion\n",
        config.policy.clone(),
        Some(Box::new(config.translations().unwrap())),
    )
    .unwrap();

    // Then the inline entry won over the file and level 3 stays ATX
    assert_eq!(out, "介绍\n===\n\n### 总结\n");
}
