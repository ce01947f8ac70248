/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use sqlshift::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.sql", "SELECT 1;")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that find_files searches recursively and sorts the result
#[test]
fn test_find_files_withNestedDirs_shouldFindSortedSqlFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.sql", "SELECT 2;")?;
    common::create_test_file(temp_dir.path(), "nested/a.SQL", "SELECT 1;")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "not sql")?;

    let files = FileManager::find_files(temp_dir.path(), ".sql")?;

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("b.sql"));
    assert!(files[1].ends_with("nested/a.SQL"));

    Ok(())
}

/// Test that load_scripts names scripts after their base name
#[test]
fn test_load_scripts_withFileAndDir_shouldUseBaseNames() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let single = common::create_test_procedure(temp_dir.path(), "single/load_orders.sql")?;
    common::create_test_file(temp_dir.path(), "batch/one.sql", "SELECT 1;")?;

    let scripts = FileManager::load_scripts(&[single, temp_dir.path().join("batch")])?;

    let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["load_orders.sql", "one.sql"]);
    assert!(scripts[0].body.contains("CREATE PROCEDURE dbo.LoadOrders"));

    Ok(())
}

/// Test that two files with the same base name are rejected
#[test]
fn test_load_scripts_withDuplicateNames_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a/proc.sql", "SELECT 1;")?;
    common::create_test_file(temp_dir.path(), "b/proc.sql", "SELECT 2;")?;

    let result = FileManager::load_scripts(&[temp_dir.path().to_path_buf()]);

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Duplicate script name proc.sql"));

    Ok(())
}

/// Test that a file that is not UTF-8 is a load error naming the file
#[test]
fn test_load_script_withInvalidUtf8_shouldNameTheFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("latin1.sql");
    std::fs::write(&path, [0x53, 0x45, 0x4c, 0xe9, 0xff])?;

    let message = FileManager::load_script(&path).unwrap_err().to_string();
    assert!(message.contains("latin1.sql is not valid UTF-8"));

    Ok(())
}

/// Test that a missing input path is reported
#[test]
fn test_collect_sql_files_withMissingPath_shouldFail() {
    let result = FileManager::collect_sql_files(&["./non_existent_directory_12345".into()]);
    assert!(result.is_err());
}

/// Test that write_bytes creates the parent directory
#[test]
fn test_write_bytes_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("archive.zip");

    FileManager::write_bytes(&path, b"PK")?;

    assert_eq!(std::fs::read(&path)?, b"PK");
    Ok(())
}
