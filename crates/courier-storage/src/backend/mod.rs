// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document backends for record persistence.

pub mod local;
pub mod remote;

pub use local::LocalFileBackend;
pub use remote::RemoteDocumentBackend;

/// Document names are plain file names: no separators, no parent references.
pub(crate) fn check_document_name(document: &str) -> Result<(), String> {
    let bad = document.trim().is_empty()
        || document.contains(['/', '\\'])
        || document == "."
        || document == "..";
    if bad {
        Err(format!("`{document}` is not a valid document name"))
    } else {
        Ok(())
    }
}
