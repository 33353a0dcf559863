mod common;

use common::*;
use std::path::Path;

#[test]
fn test_builtin_catalog_matches_sample_set() {
    let catalog = ExampleCatalog::builtin(Path::new("samples"));

    assert_eq!(catalog.len(), 10);
    assert_eq!(catalog.get(0).unwrap().name, "Example 1");
    assert_eq!(catalog.get(0).unwrap().path, Path::new("samples/image_1.jpg"));
    // Example 7 points at image_17.jpg in the sample set
    assert_eq!(catalog.get(6).unwrap().path, Path::new("samples/image_17.jpg"));
    assert_eq!(catalog.get(9).unwrap().name, "Example 10");
    assert!(catalog.get(10).is_none());
}

#[test]
fn test_toml_catalog_resolves_relative_paths() -> anyhow::Result<()> {
    let contents = r#"
[[example]]
name = "Runway"
path = "runway.jpg"

[[example]]
name = "Taxiway"
path = "/data/taxiway.png"
"#;

    let catalog = ExampleCatalog::from_toml_str(contents, Path::new("/srv/examples"))?;

    assert_eq!(
        catalog.entries(),
        [
            ExampleEntry {
                name: "Runway".to_string(),
                path: "/srv/examples/runway.jpg".into(),
            },
            ExampleEntry {
                name: "Taxiway".to_string(),
                path: "/data/taxiway.png".into(),
            },
        ]
    );

    Ok(())
}

#[test]
fn test_empty_toml_catalog() -> anyhow::Result<()> {
    let catalog = ExampleCatalog::from_toml_str("", Path::new("."))?;
    assert!(catalog.is_empty());
    Ok(())
}

#[test]
fn test_invalid_toml_catalog_is_rejected() {
    let result = ExampleCatalog::from_toml_str("[[example]]\nname = 3\n", Path::new("."));
    assert!(result.is_err());
}

#[test]
fn test_load_catalog_file_and_images() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    create_test_image(12, 8, [255, 0, 0]).save(dir.path().join("present.png"))?;
    std::fs::write(
        dir.path().join("catalog.toml"),
        "[[example]]\nname = \"Present\"\npath = \"present.png\"\n\n[[example]]\nname = \"Missing\"\npath = \"missing.png\"\n",
    )?;

    let catalog = ExampleCatalog::load(&dir.path().join("catalog.toml"))?;
    assert_eq!(catalog.len(), 2);

    let catalog = catalog.retain_existing();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get(0).unwrap().name, "Present");

    let img = catalog.load_image(0)?.expect("entry 0 exists");
    assert_eq!((img.width(), img.height()), (12, 8));
    assert!(catalog.load_image(1)?.is_none());

    Ok(())
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let err = ExampleCatalog::load(Path::new("/nonexistent/catalog.toml")).unwrap_err();
    assert!(format!("{:#}", err).contains("catalog.toml"));
}
