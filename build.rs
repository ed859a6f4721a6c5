use std::collections::HashSet;
use std::path::Path;

fn main() {
    let config_path = Path::new("config/associations.json");
    validate_config_file(config_path);
    set_build_dependencies();
}

fn validate_config_file(config_path: &Path) {
    // Ensure the default association config exists at build time
    assert!(
        config_path.exists(),
        "\n\nCONFIG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the association config before building.\n",
        config_path.display()
    );

    let config_contents = std::fs::read_to_string(config_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCONFIG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            config_path.display()
        );
    });

    let config: serde_json::Value = serde_json::from_str(&config_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCONFIG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            config_path.display()
        );
    });

    validate_config_structure(&config);
}

fn validate_config_structure(config: &serde_json::Value) {
    assert!(
        config.is_object(),
        "\n\nCONFIG BUILD ERROR: Root must be a JSON object\n\
         Got: {config}\n"
    );

    let aliases = config.get("aliases").unwrap_or_else(|| {
        panic!(
            "\n\nCONFIG BUILD ERROR: Missing 'aliases' field\n\
             The config must have a top-level 'aliases' object.\n"
        );
    });

    let groups = aliases.as_object().unwrap_or_else(|| {
        panic!(
            "\n\nCONFIG BUILD ERROR: 'aliases' must be an object\n\
             Got: {aliases}\n"
        );
    });

    let ignore = config
        .get("ignore")
        .and_then(|v| v.as_array())
        .unwrap_or_else(|| {
            panic!(
                "\n\nCONFIG BUILD ERROR: Missing or invalid 'ignore' field\n\
                 The config must have a top-level 'ignore' array of strings.\n"
            );
        });

    let alias_count = validate_alias_groups(groups);
    validate_ignore_list(ignore);

    println!(
        "cargo:warning=Validated association config: {} alias groups, {alias_count} aliases, {} ignored markings",
        groups.len(),
        ignore.len()
    );
}

fn validate_alias_groups(groups: &serde_json::Map<String, serde_json::Value>) -> usize {
    let mut seen = HashSet::new();
    let mut total = 0;

    for (canonical, aliases) in groups {
        assert!(
            !canonical.trim().is_empty(),
            "\n\nCONFIG BUILD ERROR: Alias group with empty canonical name\n"
        );

        let list = aliases.as_array().unwrap_or_else(|| {
            panic!(
                "\n\nCONFIG BUILD ERROR: Aliases of '{canonical}' must be an array\n\
                 Got: {aliases}\n"
            );
        });

        for alias in list {
            let alias = alias.as_str().unwrap_or_else(|| {
                panic!("\n\nCONFIG BUILD ERROR: Alias of '{canonical}' is not a string: {alias}\n")
            });
            assert!(
                seen.insert(alias.to_uppercase()),
                "\n\nCONFIG BUILD ERROR: Alias '{alias}' appears in more than one group\n"
            );
            total += 1;
        }
    }

    total
}

fn validate_ignore_list(ignore: &[serde_json::Value]) {
    for (i, marking) in ignore.iter().enumerate() {
        let marking = marking.as_str().unwrap_or_else(|| {
            panic!("\n\nCONFIG BUILD ERROR: Ignore entry {i} is not a string: {marking}\n")
        });
        assert!(
            !marking.trim().is_empty(),
            "\n\nCONFIG BUILD ERROR: Ignore entry {i} is empty\n"
        );
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the default config changes
    println!("cargo:rerun-if-changed=config/associations.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
