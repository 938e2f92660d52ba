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

//! A `same-file?` predicate based on device/inode identity, used by the
//! escape verifier (spec §4.C) and by descriptor-to-path recovery (spec
//! §4.F), which must match directory entries by identity rather than by
//! inode number alone (inode numbers collide across mount points).

use std::os::fd::AsFd;

use rustix::fs::{fstat, Stat};

use crate::error::{Error, ErrorImpl};

/// An opaque device/inode identity snapshot (spec §3 "Root identity").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    pub(crate) fn of(fd: impl AsFd) -> Result<Self, Error> {
        let stat = fstat(fd).map_err(|errno| ErrorImpl::errno_with_op(errno, "fstat"))?;
        Ok(Self::from_stat(&stat))
    }

    pub(crate) fn from_stat(stat: &Stat) -> Self {
        Self {
            dev: stat.st_dev as u64,
            ino: stat.st_ino as u64,
        }
    }

    pub(crate) fn is_directory(stat: &Stat) -> bool {
        stat.st_mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn same_directory_is_same_identity() {
        let a = File::open(".").unwrap();
        let b = File::open(".").unwrap();
        assert_eq!(
            FileIdentity::of(&a).unwrap(),
            FileIdentity::of(&b).unwrap()
        );
    }

    #[test]
    fn different_directories_differ() {
        let a = File::open(".").unwrap();
        let b = File::open("/").unwrap();
        // This assumes the test runner's cwd isn't "/", which holds in
        // practice for cargo-invoked test binaries.
        assert_ne!(
            FileIdentity::of(&a).unwrap(),
            FileIdentity::of(&b).unwrap()
        );
    }
}
