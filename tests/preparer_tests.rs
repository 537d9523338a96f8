//! End-to-end tests for schema preparation
//!
//! Stages the fixture schemas through every scheme and checks what callers
//! can rely on: sorted keyspaces, an intact staged copy and fresh staging
//! directories per run.

use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use tempfile::tempdir;
use walkdir::WalkDir;

use vitess_schema_prep::{
    ClasspathBackend, CleanupPolicy, PrepConfig, PrepareOptions, ResourceLoader, Scheme,
    SchemaError, SchemaPreparer,
};

static EMBEDDED_RESOURCES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/resources");

fn resources_path() -> &'static Path {
    Box::leak(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("resources")
            .into_boxed_path(),
    )
}

fn options(lint: bool, staging_parent: &Path) -> PrepareOptions {
    let loader = ResourceLoader::new().with_backend(
        Scheme::Classpath,
        ClasspathBackend::new().with_root(resources_path()),
    );
    PrepareOptions::new(lint)
        .with_loader(loader)
        .with_staging_parent(staging_parent)
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn assert_identical_trees(source: &Path, staged: &Path) {
    let mut compared = 0;
    for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).unwrap();
        let original = fs::read(entry.path()).unwrap();
        let copy = fs::read(staged.join(relative))
            .unwrap_or_else(|_| panic!("{} missing from staged copy", relative.display()));
        assert_eq!(original, copy, "{} differs", relative.display());
        compared += 1;
    }
    assert!(compared > 0);
}

// =============================================================================
// Reference validation
// =============================================================================

#[test]
fn test_unsupported_scheme_fails_before_staging() {
    let parent = tempdir().unwrap();
    for reference in ["schemas/movies", "file:schemas/movies", "jar:schemas", ""] {
        let err = SchemaPreparer::with_options(reference, options(false, parent.path())).unwrap_err();
        match err {
            SchemaError::UnsupportedScheme { reference: r, .. } => assert_eq!(r, reference),
            other => panic!("Expected UnsupportedScheme, got {:?}", other),
        }
    }
    assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
}

#[test]
fn test_unsupported_scheme_message() {
    let err = SchemaPreparer::new(false, "s3://bucket/schemas").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema directory `s3://bucket/schemas` must start with one of the supported prefixes: [classpath:, filesystem:]"
    );
}

#[test]
fn test_missing_source() {
    let parent = tempdir().unwrap();
    let missing_fs = format!("filesystem:{}", parent.path().join("nope").display());

    for reference in ["classpath:schemas/does_not_exist", missing_fs.as_str()] {
        let err = SchemaPreparer::with_options(reference, options(false, parent.path())).unwrap_err();
        match err {
            SchemaError::SourceNotFound(r) => assert_eq!(r, reference),
            other => panic!("Expected SourceNotFound, got {:?}", other),
        }
    }
    assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
}

// =============================================================================
// Staging and parsing
// =============================================================================

#[test]
fn test_classpath_movies() {
    let parent = tempdir().unwrap();
    let prepared =
        SchemaPreparer::with_options("classpath:schemas/movies", options(true, parent.path())).unwrap();

    let names: Vec<_> = prepared.keyspaces().iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["movies_sharded", "movies_unsharded"]);

    let sharded = &prepared.keyspaces()[0];
    assert!(sharded.is_sharded());
    assert_eq!(sharded.tables().into_iter().collect::<Vec<_>>(), vec!["movies".to_string()]);

    let unsharded = &prepared.keyspaces()[1];
    assert!(!unsharded.is_sharded());
    assert_eq!(unsharded.ddl_commands().count(), 2);

    let staged = prepared.current_schema_dir_path();
    assert!(staged.starts_with(parent.path()));
    assert!(staged.join("movies_sharded").is_dir());
    assert!(staged.join("movies_unsharded").is_dir());
    assert_identical_trees(&resources_path().join("schemas/movies"), staged);
}

#[test]
fn test_default_constructor_resolves_classpath() {
    // cargo runs integration tests from the package root, where `resources/` lives
    let prepared = SchemaPreparer::new(true, "classpath:schemas/movies").unwrap();
    let names: Vec<_> = prepared.keyspaces().iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["movies_sharded", "movies_unsharded"]);
    assert_identical_trees(
        &resources_path().join("schemas/movies"),
        prepared.current_schema_dir_path(),
    );
    prepared.cleanup().unwrap();
}

#[test]
fn test_embedded_classpath_movies() {
    let parent = tempdir().unwrap();
    let loader = ResourceLoader::new().with_backend(
        Scheme::Classpath,
        ClasspathBackend::new().embed(&EMBEDDED_RESOURCES),
    );
    let prepared = SchemaPreparer::with_options(
        "classpath:/schemas/movies",
        PrepareOptions::new(true)
            .with_loader(loader)
            .with_staging_parent(parent.path()),
    )
    .unwrap();

    assert_eq!(prepared.keyspaces().len(), 2);
    assert_identical_trees(
        &resources_path().join("schemas/movies"),
        prepared.current_schema_dir_path(),
    );
}

#[test]
fn test_filesystem_n_keyspaces_sorted() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    for name in ["orders", "customers", "inventory", "audit"] {
        write(source.path(), &format!("{}/vschema.json", name), "{}");
        write(
            source.path(),
            &format!("{}/v0001__create_{}.sql", name, name),
            &format!("CREATE TABLE {} (id BIGINT PRIMARY KEY);\n", name),
        );
    }

    let reference = format!("filesystem:{}", source.path().display());
    let prepared = SchemaPreparer::with_options(&reference, options(true, parent.path())).unwrap();

    let names: Vec<_> = prepared.keyspaces().iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["audit", "customers", "inventory", "orders"]);
    assert_identical_trees(source.path(), prepared.current_schema_dir_path());
}

#[test]
fn test_repeated_runs_use_distinct_directories() {
    let parent = tempdir().unwrap();
    let first =
        SchemaPreparer::with_options("classpath:schemas/movies", options(false, parent.path())).unwrap();
    let second =
        SchemaPreparer::with_options("classpath:schemas/movies", options(false, parent.path())).unwrap();

    assert_ne!(first.current_schema_dir_path(), second.current_schema_dir_path());
    assert_eq!(first.keyspaces(), second.keyspaces());
    assert_eq!(first.bundle_hash(), second.bundle_hash());
}

#[test]
fn test_bundle_hash_tracks_content() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    write(source.path(), "main/vschema.json", "{}");
    write(source.path(), "main/v0001__init.sql", "CREATE TABLE a (id BIGINT);");
    let reference = format!("filesystem:{}", source.path().display());

    let before = SchemaPreparer::with_options(&reference, options(false, parent.path())).unwrap();
    write(source.path(), "main/v0001__init.sql", "CREATE TABLE b (id BIGINT);");
    let after = SchemaPreparer::with_options(&reference, options(false, parent.path())).unwrap();

    assert_ne!(before.bundle_hash(), after.bundle_hash());
}

#[test]
fn test_staging_inside_source_is_a_copy_failure() {
    let source = tempdir().unwrap();
    write(source.path(), "main/vschema.json", "{}");
    let staging_parent = source.path().join("tmp");
    let reference = format!("filesystem:{}", source.path().display());

    let err = SchemaPreparer::with_options(&reference, options(false, &staging_parent)).unwrap_err();
    match err {
        SchemaError::CopyFailure { reference: r, target, .. } => {
            assert_eq!(r, reference);
            assert!(target.starts_with(&staging_parent));
        }
        other => panic!("Expected CopyFailure, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_source_entry_is_a_copy_failure() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    write(source.path(), "main/vschema.json", "{}");
    std::os::unix::fs::symlink(
        source.path().join("main/missing.sql"),
        source.path().join("main/v0001__dangling.sql"),
    )
    .unwrap();
    let reference = format!("filesystem:{}", source.path().display());

    let err = SchemaPreparer::with_options(&reference, options(false, parent.path())).unwrap_err();
    assert!(matches!(err, SchemaError::CopyFailure { .. }), "got {:?}", err);
    assert!(err.to_string().starts_with(&format!("Failed to copy schema directory `{}`", reference)));
}

// =============================================================================
// Lint mode
// =============================================================================

#[test]
fn test_naming_violation_depends_on_lint_mode() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    write(source.path(), "movies/vschema.json", "{}");
    write(source.path(), "movies/CreateMovies.sql", "CREATE TABLE movies (id BIGINT);");
    let reference = format!("filesystem:{}", source.path().display());

    let err = SchemaPreparer::with_options(&reference, options(true, parent.path())).unwrap_err();
    match err {
        SchemaError::ValidationFailure { path, violations } => {
            assert_eq!(path, reference);
            assert_eq!(violations.len(), 1);
            assert!(violations[0].contains("migration-file-naming"));
            assert!(violations[0].contains("movies/CreateMovies.sql"));
        }
        other => panic!("Expected ValidationFailure, got {:?}", other),
    }

    let prepared = SchemaPreparer::with_options(&reference, options(false, parent.path())).unwrap();
    assert_eq!(prepared.keyspaces().len(), 1);
    assert_eq!(prepared.keyspaces()[0].migrations()[0].file_name(), "CreateMovies.sql");
}

#[test]
fn test_disabled_rule_is_not_enforced() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    write(source.path(), "movies/vschema.json", "{}");
    write(source.path(), "movies/v0001__create.sql", "CREATE TABLE movies (id BIGINT);");
    write(source.path(), "movies/README.md", "notes");
    let reference = format!("filesystem:{}", source.path().display());

    assert!(SchemaPreparer::with_options(&reference, options(true, parent.path())).is_err());

    let mut opts = options(true, parent.path());
    opts.rules.set_enabled("unexpected-file", false).unwrap();
    assert!(SchemaPreparer::with_options(&reference, opts).is_ok());
}

#[test]
fn test_structural_errors_fail_without_lint() {
    let source = tempdir().unwrap();
    let parent = tempdir().unwrap();
    write(source.path(), "movies/v0001__create.sql", "CREATE TABLE movies (id BIGINT);");
    let reference = format!("filesystem:{}", source.path().display());

    let err = SchemaPreparer::with_options(&reference, options(false, parent.path())).unwrap_err();
    assert!(matches!(err, SchemaError::ValidationFailure { .. }));
    assert!(err.to_string().contains("vschema.json not found in keyspace `movies`"));
}

// =============================================================================
// Cleanup and configuration
// =============================================================================

#[test]
fn test_cleanup_policies() {
    let parent = tempdir().unwrap();

    let retained =
        SchemaPreparer::with_options("classpath:schemas/movies", options(false, parent.path())).unwrap();
    let retained_path = retained.current_schema_dir_path().to_path_buf();
    drop(retained);
    assert!(retained_path.is_dir());

    let scoped = SchemaPreparer::with_options(
        "classpath:schemas/movies",
        options(false, parent.path()).with_cleanup(CleanupPolicy::RemoveOnDrop),
    )
    .unwrap();
    let scoped_path = scoped.current_schema_dir_path().to_path_buf();
    drop(scoped);
    assert!(!scoped_path.exists());

    let explicit =
        SchemaPreparer::with_options("classpath:schemas/movies", options(false, parent.path())).unwrap();
    let explicit_path = explicit.current_schema_dir_path().to_path_buf();
    explicit.cleanup().unwrap();
    assert!(!explicit_path.exists());
}

#[test]
fn test_from_config() {
    let parent = tempdir().unwrap();
    let mut config = PrepConfig::default();
    config.schema.dir = Some("classpath:schemas/movies".to_string());
    config.schema.lint = true;
    config.classpath.roots = vec![resources_path().to_path_buf()];
    config.staging.parent = Some(parent.path().to_path_buf());

    let prepared = SchemaPreparer::from_config(&config).unwrap();
    assert_eq!(prepared.keyspaces().len(), 2);
    assert!(prepared.current_schema_dir_path().starts_with(parent.path()));

    config.schema.dir = None;
    assert!(matches!(
        SchemaPreparer::from_config(&config).unwrap_err(),
        SchemaError::Config(_)
    ));
}
