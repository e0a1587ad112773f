//! File encryption/decryption operations
//!
//! High-level operations for turning a file into a password-protected
//! container and back. Output files are written atomically (tempfile +
//! fsync + rename) with mode 0o600 on Unix, so a crash mid-write never
//! leaves a partial container behind.

use crate::container;
use crate::error::{EncboxError, ErrorCategory, ErrorKind, Result};
use crate::password::PasswordReader;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Extension appended to encrypted output files by default
pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it using a password from
/// `password_reader`, and writes the binary container to `output_path`.
/// An empty password is rejected before any cryptographic work.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    password_reader: &mut dyn PasswordReader,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let password = password_reader.read_password()?;
    if password.is_empty() {
        return Err(EncboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "password must not be empty",
        ));
    }
    let ciphertext = container::encrypt(&password, &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_atomic(output_path, &ciphertext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    Ok(())
}

/// Decrypt a file with a password
///
/// Reads a binary container from `input_path`, decrypts it using a password
/// from `password_reader`, and writes the plaintext to `output_path`. Any
/// authentication failure surfaces only the generic decryption error.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    password_reader: &mut dyn PasswordReader,
) -> Result<()> {
    let ciphertext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let password = password_reader.read_password()?;
    let plaintext = container::decrypt(&password, &ciphertext)?;
    write_file_atomic(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Default output path for encryption: the input name with ".enc" appended.
pub fn default_encrypt_output(input_path: &Path) -> PathBuf {
    let mut name = OsString::from(input_path.as_os_str());
    name.push(".");
    name.push(ENCRYPTED_EXTENSION);
    PathBuf::from(name)
}

/// Default output path for decryption: strip a trailing ".enc" if present,
/// otherwise prefix the file name with "decrypted_".
pub fn default_decrypt_output(input_path: &Path) -> PathBuf {
    if input_path
        .extension()
        .is_some_and(|ext| ext == ENCRYPTED_EXTENSION)
    {
        return input_path.with_extension("");
    }
    let name = input_path.file_name().unwrap_or_default();
    let mut decrypted_name = OsString::from("decrypted_");
    decrypted_name.push(name);
    input_path.with_file_name(decrypted_name)
}

/// Atomically write a file with restrictive permissions (0o600 on Unix)
///
/// Writes to a tempfile in the destination directory, flushes and fsyncs,
/// then renames over the target. The rename either lands a complete file
/// or leaves the previous state untouched.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        EncboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        EncboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        EncboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        EncboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                EncboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            EncboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        EncboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> EncboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    EncboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
