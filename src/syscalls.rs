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

//! Thin wrappers around the raw syscalls the resolver needs, all routed
//! through `rustix`. Callers get the raw [`Errno`] back rather than a
//! mapped [`crate::error::Error`] -- the resolver needs to branch on the
//! exact errno (e.g. "maybe a symlink") before deciding how to report a
//! failure, so mapping happens at the call site via
//! [`crate::error::ErrorImpl::errno_with_op`].

use std::ffi::{OsStr, OsString};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::ffi::OsStringExt;

use rustix::fs::{openat as rustix_openat, readlinkat as rustix_readlinkat, Mode};
use rustix::io::Errno;

use crate::flags::OpenFlags;

/// `openat(dirfd, name, flags, mode)`, returning the raw errno on failure so
/// the resolver can distinguish "maybe a symlink" from other failures.
pub(crate) fn openat(
    dirfd: BorrowedFd<'_>,
    name: &OsStr,
    flags: OpenFlags,
    mode: Mode,
) -> Result<OwnedFd, Errno> {
    rustix_openat(dirfd, name, flags.to_rustix(), mode)
}

/// `readlinkat(dirfd, name)`.
pub(crate) fn readlinkat(dirfd: BorrowedFd<'_>, name: &OsStr) -> Result<OsString, Errno> {
    let buf = rustix_readlinkat(dirfd, name, Vec::new())?;
    Ok(OsString::from_vec(buf.into_bytes()))
}

/// Open `.` relative to `dirfd` with the given flags -- used both to
/// duplicate the cursor with a different flag set (spec §4.D's re-open of a
/// popped parent) and to produce the final returned descriptor when the
/// walk ends at the root (spec §4.D "final result").
pub(crate) fn reopen_dot(dirfd: BorrowedFd<'_>, flags: OpenFlags) -> Result<OwnedFd, Errno> {
    openat(dirfd, OsStr::new("."), flags, Mode::empty())
}

/// Open the parent directory (`..`) relative to `dirfd`.
pub(crate) fn open_parent(dirfd: BorrowedFd<'_>) -> Result<OwnedFd, Errno> {
    openat(
        dirfd,
        OsStr::new(".."),
        crate::utils::DIR_OPEN_FLAGS,
        Mode::empty(),
    )
}

/// `fstat`-equivalent identity check, exposed here so callers that already
/// hold a [`BorrowedFd`] don't need to import `rustix::fs` directly.
pub(crate) fn is_directory(fd: impl AsFd) -> Result<bool, Errno> {
    let stat = rustix::fs::fstat(fd)?;
    Ok(crate::utils::FileIdentity::is_directory(&stat))
}

pub(crate) fn is_symlink(fd: impl AsFd) -> Result<bool, Errno> {
    let stat = rustix::fs::fstat(fd)?;
    Ok(stat.st_mode & libc::S_IFMT as u32 == libc::S_IFLNK as u32)
}
