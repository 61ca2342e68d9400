//! Catalog tests against the bundled track collection

use proptest::prelude::*;
use soundflows_core::{Catalog, Category, SoundflowsError};

// ===== Bundled Catalog =====

#[test]
fn builtin_catalog_has_every_category() {
    let catalog = Catalog::builtin().unwrap();
    let keys: Vec<&str> = catalog.category_keys().collect();

    for key in [
        "Animal sounds",
        "Chakra",
        "Fire",
        "hypnosis",
        "meditation",
        "Rain",
        "running water",
        "Singing bowl sound",
        "Subconscious Therapy",
    ] {
        assert!(keys.contains(&key), "missing category {key}");
    }
    assert_eq!(keys.len(), 9);
}

#[test]
fn builtin_categories_are_never_empty() {
    let catalog = Catalog::builtin().unwrap();
    for key in catalog.category_keys() {
        assert!(!catalog.files(key).unwrap().is_empty(), "{key} has no files");
    }
}

#[test]
fn builtin_rain_uses_its_configured_folder() {
    let catalog = Catalog::builtin().unwrap();
    let file = catalog.files("Rain").unwrap()[0].clone();
    let url = catalog.audio_url("Rain", &file).unwrap();

    assert!(url.starts_with("https://archive.org/download/sound-healing-collection/rain-sounds/"));
    assert!(!url.contains(' '));
}

#[test]
fn builtin_preset_categories_exist() {
    let catalog = Catalog::builtin().unwrap();
    for key in [
        "Rain",
        "meditation",
        "running water",
        "Animal sounds",
        "Singing bowl sound",
        "Chakra",
    ] {
        assert!(catalog.contains(key));
    }
}

// ===== URL Encoding =====

#[test]
fn non_ascii_file_names_are_percent_encoded() {
    let catalog = Catalog::new("https://host/")
        .with_category("Fire", Category::with_files(["篝火.mp3"]));

    let url = catalog.audio_url("Fire", "篝火.mp3").unwrap();
    assert_eq!(url, "https://host/fire/%E7%AF%9D%E7%81%AB.mp3");
}

#[test]
fn unreserved_marks_are_kept() {
    let catalog = Catalog::new("https://host/").with_category("x", Category::with_files(["a"]));

    let url = catalog.audio_url("x", "a-b_c.d!e~f*g'h(i).mp3").unwrap();
    assert_eq!(url, "https://host/x/a-b_c.d!e~f*g'h(i).mp3");
}

#[test]
fn reserved_characters_are_escaped() {
    let catalog = Catalog::new("https://host/").with_category("x", Category::with_files(["a"]));

    let url = catalog.audio_url("x", "a b&c/d?.mp3").unwrap();
    assert_eq!(url, "https://host/x/a%20b%26c%2Fd%3F.mp3");
}

#[test]
fn unknown_category_url_is_an_error() {
    let catalog = Catalog::new("https://host/");
    assert!(matches!(
        catalog.audio_url("Nope", "a.mp3"),
        Err(SoundflowsError::UnknownCategory(key)) if key == "Nope"
    ));
}

// ===== Property Tests =====

proptest! {
    /// Property: encoded file names never contain characters that break a URL path
    #[test]
    fn encoded_names_stay_in_one_path_segment(name in "\\PC{1,40}") {
        let catalog = Catalog::new("https://host/")
            .with_category("x", Category::with_files(["a"]));

        let url = catalog.audio_url("x", &name).unwrap();
        let encoded = url.trim_start_matches("https://host/x/");

        prop_assert!(!encoded.contains('/'));
        prop_assert!(!encoded.contains(' '));
        prop_assert!(!encoded.contains('?'));
        prop_assert!(!encoded.contains('#'));
        prop_assert!(encoded.is_ascii());
    }

    /// Property: derived folders are lower-case and whitespace free
    #[test]
    fn derived_folder_has_no_whitespace(key in "[A-Za-z]{1,8}( +[A-Za-z]{1,8}){0,3}") {
        let catalog = Catalog::new("https://host/")
            .with_category(key.clone(), Category::with_files(["a"]));

        let folder = catalog.folder(&key).unwrap();
        prop_assert!(!folder.chars().any(char::is_whitespace));
        prop_assert_eq!(folder.clone(), folder.to_lowercase());
        prop_assert!(!folder.contains("--"));
    }
}
