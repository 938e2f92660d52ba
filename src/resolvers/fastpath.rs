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

//! The Linux fast path (spec §4.E): a single `openat2(2)` call with
//! `RESOLVE_IN_ROOT`, used whenever no audit callback needs per-step
//! visibility. Declines (returns `None`) when the kernel doesn't support
//! `openat2` or rejects the resolve-flag set as too large; [`super::resolve`]
//! falls back to the emulated walk in that case.

use std::ffi::OsStr;
use std::os::fd::{BorrowedFd, OwnedFd};

use rustix::fs::{openat2, Mode, ResolveFlags};
use rustix::io::Errno;

use crate::error::{Error, ErrorImpl};
use crate::flags::{OpenFlags, ResolverFlags};

/// Try the kernel-assisted confined open. Returns `None` to signal "decline,
/// use the emulated walk"; `Some(Err(_))` is a real failure that should be
/// propagated rather than retried with the emulated walk (an escape
/// detected by the kernel is just as final as one detected by us).
pub(crate) fn try_open(
    root: BorrowedFd<'_>,
    path: &OsStr,
    final_flags: OpenFlags,
    mode: Mode,
    resolver_flags: ResolverFlags,
) -> Option<Result<OwnedFd, Error>> {
    let mut resolve = ResolveFlags::IN_ROOT | ResolveFlags::NO_MAGICLINKS;
    if resolver_flags.contains(ResolverFlags::NO_SYMLINKS) {
        resolve |= ResolveFlags::NO_SYMLINKS;
    }

    let oflags = final_flags.to_rustix();

    loop {
        match openat2(root, path, oflags, mode, resolve) {
            Ok(fd) => return Some(Ok(fd)),
            Err(Errno::INTR) => continue,
            Err(Errno::NOSYS) | Err(Errno::TOOBIG) => return None,
            Err(errno) => return Some(Err(ErrorImpl::errno_with_op(errno, "openat2").into())),
        }
    }
}
