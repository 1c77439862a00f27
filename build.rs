// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LOCALE: &str = "locales/en.toml";

fn main() {
    // --- 1. Pick the locale: `lang_*` features first, then CICD_LANG, then English ---
    let mut active_langs: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    active_langs.sort();

    let lang = match active_langs.first() {
        Some(first) => {
            if active_langs.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    active_langs, first
                );
            }
            first.clone()
        }
        None => env::var("CICD_LANG").unwrap_or_else(|_| "en".to_string()),
    };

    println!("cargo:rustc-env=CICD_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=CICD_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // --- 2. English is always loaded and acts as the fallback for missing keys ---
    let fallback_content = fs::read_to_string(FALLBACK_LOCALE)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", FALLBACK_LOCALE, e));
    let mut translations: BTreeMap<String, String> = toml::from_str(&fallback_content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", FALLBACK_LOCALE, e));

    if lang != "en" {
        let lang_file_path = format!("locales/{}.toml", lang);
        match fs::read_to_string(&lang_file_path) {
            Ok(content) => {
                let specific: BTreeMap<String, String> = toml::from_str(&content)
                    .unwrap_or_else(|e| panic!("Failed to parse {}: {}", lang_file_path, e));
                translations.extend(specific);
            }
            Err(_) => println!(
                "cargo:warning=Language file '{}' not found. Falling back to 'en'.",
                lang_file_path
            ),
        }
    }

    // --- 3. Generate the `t!` macro; unknown keys become compile errors ---
    let mut macro_code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &translations {
        let escaped_value = value.replace('\\', "\\\\").replace('"', "\\\"");
        macro_code.push_str(&format!(
            "    (\"{}\") => {{ \"{}\" }};\n",
            key, escaped_value
        ));
    }
    macro_code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    macro_code.push('}');

    let out_dir = env::var("OUT_DIR").unwrap_or_else(|e| panic!("OUT_DIR is not set: {}", e));
    let dest_path = Path::new(&out_dir).join("translations.rs");
    fs::write(&dest_path, macro_code)
        .unwrap_or_else(|e| panic!("Failed to write {}: {}", dest_path.display(), e));
}
