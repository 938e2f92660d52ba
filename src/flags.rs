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

//! Flag sets used when requesting a confined open.

use rustix::fs::OFlags;

bitflags::bitflags! {
    /// Flags controlling how the *final* path component is opened, mirroring
    /// the platform's `open(2)` flags. Intermediate components are always
    /// opened with the resolver's own internal directory-lookup flags,
    /// regardless of what is passed here (spec §3 "Work item").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const O_RDONLY = OFlags::RDONLY.bits();
        const O_WRONLY = OFlags::WRONLY.bits();
        const O_RDWR = OFlags::RDWR.bits();
        const O_CREAT = OFlags::CREATE.bits();
        const O_EXCL = OFlags::EXCL.bits();
        const O_TRUNC = OFlags::TRUNC.bits();
        const O_APPEND = OFlags::APPEND.bits();
        const O_DIRECTORY = OFlags::DIRECTORY.bits();
        const O_NOFOLLOW = OFlags::NOFOLLOW.bits();
        const O_PATH = OFlags::PATH.bits();
        const O_CLOEXEC = OFlags::CLOEXEC.bits();
        const O_NOCTTY = OFlags::NOCTTY.bits();
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::O_RDONLY
    }
}

impl OpenFlags {
    pub(crate) fn to_rustix(self) -> OFlags {
        OFlags::from_bits_truncate(self.bits())
    }
}

bitflags::bitflags! {
    /// Resolver-wide behavior switches (spec §6 `no_symlinks`/`remember_parents`
    /// plus a marker for the fast-path-disabling audit hook).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResolverFlags: u32 {
        /// No symlink anywhere in the path may be traversed.
        const NO_SYMLINKS = 1 << 0;
        /// Use the "remember-parents" escape-prevention policy instead of
        /// the default stateless one (spec §3/§4.D).
        const REMEMBER_PARENTS = 1 << 1;
    }
}
