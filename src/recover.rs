// SPDX-License-Identifier: MPL-2.0 OR LGPL-3.0-or-later
/*
 * beneath: confined path resolution for POSIX filesystems
 * Copyright (C) 2026 The beneath Authors
 *
 * == MPL-2.0 ==
 *
 *  This Source Code Form is subject to the terms of the Mozilla Public
 *  License, v. 2.0. If a copy of the MPL was not distributed with this
 *  file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * Alternatively, this Source Code Form may also (at your option) be used
 * under the terms of the GNU Lesser General Public License Version 3, as
 * described below:
 *
 * == LGPL-3.0-or-later ==
 *
 *  This program is free software: you can redistribute it and/or modify it
 *  under the terms of the GNU Lesser General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or (at
 *  your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful, but
 *  WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 *  Public License for more details.
 *
 *  You should have received a copy of the GNU Lesser General Public License
 *  along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Descriptor-to-path recovery (spec §4.F): reconstruct the absolute path
//! of a directory descriptor.
//!
//! On Linux, reading `/proc/self/fd/<n>` is tried first. Everywhere else
//! (and as a fallback if procfs isn't mounted), a portable reverse walk
//! opens `..` repeatedly and scans each parent's entries for the child's
//! identity, exactly as `nixutil`'s `recover_fd_path`/`_recover_fname` do.
//! The kernel-table-consulting backends other platforms could use (BSD
//! `sysctl`, macOS `F_GETPATH`) are intentionally not implemented.

use std::ffi::OsString;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;

use rustix::fs::Mode;

use crate::error::{Error, ErrorImpl};
use crate::flags::OpenFlags;
use crate::syscalls;
use crate::utils::{FileIdentity, DIR_OPEN_FLAGS};

/// Reconstruct the absolute path of a directory descriptor.
///
/// `fd` must refer to a directory; recovery for any other file type fails
/// with [`crate::error::ErrorKind::NotSupported`] on platforms (all of the
/// ones this crate targets) without a non-directory-capable fast path.
///
/// Unlike the originating implementation, a negative descriptor cannot be
/// passed here at all: Rust's [`BorrowedFd`] already excludes it at the type
/// level, so [`crate::error::ErrorKind::BadDescriptor`] only arises from the
/// OS rejecting an otherwise-valid-looking descriptor (e.g. one that was
/// already closed).
pub fn recover_fd_path(fd: impl AsFd) -> Result<PathBuf, Error> {
    let fd = fd.as_fd();

    #[cfg(target_os = "linux")]
    if let Some(path) = try_proc_self_fd(fd) {
        return Ok(path);
    }

    generic_reverse_walk(fd)
}

#[cfg(target_os = "linux")]
fn try_proc_self_fd(fd: BorrowedFd<'_>) -> Option<PathBuf> {
    use std::os::fd::AsRawFd;

    let link = format!("/proc/self/fd/{}", fd.as_raw_fd());
    let target = std::fs::read_link(link).ok()?;

    if !target.is_absolute() {
        return None;
    }
    if target.as_os_str().as_bytes().ends_with(b" (deleted)") {
        return None;
    }
    Some(target)
}

fn generic_reverse_walk(fd: BorrowedFd<'_>) -> Result<PathBuf, Error> {
    if !syscalls::is_directory(fd).map_err(|e| ErrorImpl::errno_with_op(e, "fstat"))? {
        return Err(ErrorImpl::NotSupported {
            operation: "recover-fd-path: not a directory".into(),
        }
        .into());
    }

    let real_root = std::fs::File::open("/").map_err(|e| ErrorImpl::OsError {
        operation: "open /".into(),
        source: e,
    })?;
    let real_root_identity = FileIdentity::of(&real_root)?;

    let mut current: OwnedFd = syscalls::reopen_dot(fd, DIR_OPEN_FLAGS)
        .map_err(|e| ErrorImpl::errno_with_op(e, "reopen ."))?;
    let mut components: Vec<OsString> = Vec::new();

    loop {
        let current_identity = FileIdentity::of(&current)?;
        let parent = syscalls::open_parent(current.as_fd())
            .map_err(|e| ErrorImpl::errno_with_op(e, "open .."))?;
        let parent_identity = FileIdentity::of(&parent)?;

        if parent_identity == current_identity {
            if current_identity == real_root_identity {
                break;
            }
            return Err(ErrorImpl::NotFound {
                operation: "recover-fd-path: descriptor outside this namespace".into(),
            }
            .into());
        }

        let name = find_name_in_parent(&parent, current_identity)?;
        components.push(name);
        current = parent;
    }

    components.reverse();
    let mut path = PathBuf::from("/");
    path.extend(components);
    Ok(path)
}

/// Scan `parent`'s entries for one whose identity matches `target`,
/// matching by `same-file?` rather than raw inode number (inodes collide
/// across mount points). Stat errors on individual entries are ignored and
/// the scan continues, so a single broken entry doesn't abort recovery.
fn find_name_in_parent(parent: &OwnedFd, target: FileIdentity) -> Result<OsString, Error> {
    let dir =
        rustix::fs::Dir::read_from(parent).map_err(|e| ErrorImpl::errno_with_op(e, "opendir"))?;

    for entry in dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let name = entry.file_name();
        if name.to_bytes() == b"." || name.to_bytes() == b".." {
            continue;
        }
        let name_os = std::ffi::OsStr::from_bytes(name.to_bytes());
        let candidate = match syscalls::openat(
            parent.as_fd(),
            name_os,
            DIR_OPEN_FLAGS | OpenFlags::O_DIRECTORY,
            Mode::empty(),
        ) {
            Ok(fd) => fd,
            Err(_) => continue,
        };
        if let Ok(identity) = FileIdentity::of(&candidate) {
            if identity == target {
                return Ok(OsString::from_vec(name.to_bytes().to_vec()));
            }
        }
    }

    Err(ErrorImpl::NotFound {
        operation: "recover-fd-path: entry not found in parent directory".into(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn recovers_nested_directory() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join("a/b/c"))?;
        let fd = fs::File::open(tmp.path().join("a/b/c"))?;

        let recovered = recover_fd_path(&fd)?;
        let canonical_expected = tmp.path().join("a/b/c").canonicalize()?;
        let canonical_actual = recovered.canonicalize()?;
        assert_eq!(canonical_actual, canonical_expected);
        Ok(())
    }

    #[test]
    fn rejects_non_directory() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let file_path = tmp.path().join("f");
        fs::write(&file_path, b"hi")?;
        let fd = fs::File::open(&file_path)?;

        let err = recover_fd_path(&fd).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotSupported);
        Ok(())
    }
}
