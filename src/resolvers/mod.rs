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

//! The two resolver backends and the dispatch between them (spec §4.D, §4.E).

use std::ffi::OsStr;
use std::os::fd::{BorrowedFd, OwnedFd};

use rustix::fs::Mode;

use crate::error::Error;
use crate::flags::{OpenFlags, ResolverFlags};

pub(crate) mod walk;

#[cfg(target_os = "linux")]
pub(crate) mod fastpath;

pub use walk::Audit;

/// Maximum number of symlink expansions permitted in one call (spec §4.D).
pub(crate) const MAX_SYMLINK_TRAVERSALS: u32 = 40;

/// Resolve `path` beneath `root`, using the kernel fast path when available
/// and not disabled by an audit callback, falling back to the emulated
/// walk otherwise.
pub(crate) fn resolve(
    root: BorrowedFd<'_>,
    path: &OsStr,
    final_flags: OpenFlags,
    mode: Mode,
    resolver_flags: ResolverFlags,
    audit: Option<&mut dyn Audit>,
) -> Result<OwnedFd, Error> {
    // The returned descriptor is close-on-exec and has no controlling tty,
    // same as every intermediate descriptor the resolver opens, regardless
    // of what the caller passed (spec §4.D, §6).
    let final_flags = final_flags | OpenFlags::O_CLOEXEC | OpenFlags::O_NOCTTY;

    #[cfg(target_os = "linux")]
    {
        if audit.is_none() {
            match fastpath::try_open(root, path, final_flags, mode, resolver_flags) {
                Some(result) => return result,
                None => { /* fast path declined, fall through to the emulated walk */ }
            }
        }
    }
    walk::resolve(root, path, final_flags, mode, resolver_flags, audit)
}
